/*!
 * Authentication / authorization gate
 *
 * Responsibility:
 * - AuthenticationStage: token validate → extend → Principal/Scheme を extensions へ
 * - AuthorizationStage: Principal → organization → user → role 判定
 * - Pipeline: Stage を順番に実行し、最初の失敗で打ち切る
 * - 外部呼び出し (validate / extend / store) は call_timeout で打ち切り、失敗として拒否する
 *
 * Public API:
 * - context::{principal, scheme, organization_id}
 * - Pipeline / Stage
 */

pub mod authenticate;
pub mod authorize;
pub mod context;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use authenticate::AuthenticationStage;
pub use authorize::AuthorizationStage;
pub use context::OrganizationId;
pub use pipeline::{DEFAULT_CALL_TIMEOUT, Pipeline, Stage};

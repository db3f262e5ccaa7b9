/*
 * Responsibility
 * - ゲートが読む外部 store の契約 (UsersStore / OrganizationsStore)
 * - Postgres 実装 (sqlx) と in-memory 実装
 *
 * Notes
 * - ゲートは読み取り専用。作成/更新/削除はこの crate の責務ではない
 * - `Ok(None)` は「存在しない」、`Err` は backend 障害。どちらも呼び出し側で拒否になる
 */
use async_trait::async_trait;

pub mod error;
pub mod memory;
pub mod organization_repo;
pub mod user_repo;

pub use error::RepoError;
pub use memory::InMemoryStore;
pub use organization_repo::{Organization, OrganizationQuery, PgOrganizationsStore};
pub use user_repo::{PgUsersStore, User, UserQuery};

#[async_trait]
pub trait UsersStore: Send + Sync + 'static {
    async fn get(&self, query: UserQuery) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait OrganizationsStore: Send + Sync + 'static {
    async fn get(&self, query: OrganizationQuery) -> Result<Option<Organization>, RepoError>;
}

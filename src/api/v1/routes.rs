/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 必要ロールごとにルートをまとめ、それぞれにゲート (Pipeline) を route_layer で掛ける
 *   - /health        : 公開
 *   - /me            : viewer 以上
 *   - /organization  : editor 以上
 *   - /config/auth   : admin のみ
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{
    health::health,
    session::{current_organization, me},
    settings::auth_config,
};
use crate::services::auth::Role;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let viewer = state
        .gate(Role::Viewer)
        .apply(Router::new().route("/me", get(me)));

    let editor = state
        .gate(Role::Editor)
        .apply(Router::new().route("/organization", get(current_organization)));

    let admin = state
        .gate(Role::Admin)
        .apply(Router::new().route("/config/auth", get(auth_config)));

    Router::new()
        .route("/health", get(health))
        .merge(viewer)
        .merge(editor)
        .merge(admin)
}

use axum::{Json, extract::State};

use crate::api::v1::dto::session::AuthConfigResponse;
use crate::state::AppState;

/// Admin-only view of how the gate is configured.
pub async fn auth_config(State(state): State<AppState>) -> Json<AuthConfigResponse> {
    Json(AuthConfigResponse {
        enabled: state.use_auth(),
        scheme: state.scheme().map(str::to_string),
    })
}

/*
 * Responsibility
 * - GET /health (疎通用、ゲートを通さない)
 */
use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "auth": state.use_auth() }))
}

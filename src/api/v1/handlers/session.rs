/*
 * Responsibility
 * - ゲート通過後の handler
 * - Principal / Scheme / OrganizationId は context の accessor 経由で読む
 */
use axum::{
    Json,
    extract::State,
    http::{Extensions, StatusCode},
};

use crate::api::v1::dto::session::MeResponse;
use crate::middleware::auth::context;
use crate::repos::{Organization, OrganizationQuery};
use crate::state::AppState;

pub async fn me(extensions: Extensions) -> Json<MeResponse> {
    Json(MeResponse {
        principal: context::principal(&extensions).ok().cloned(),
        scheme: context::scheme(&extensions).ok().cloned(),
        organization_id: context::organization_id(&extensions).ok(),
    })
}

pub async fn current_organization(
    State(state): State<AppState>,
    extensions: Extensions,
) -> Result<Json<Organization>, StatusCode> {
    // no organization on the context when auth is disabled
    let id = context::organization_id(&extensions).map_err(|_| StatusCode::NOT_FOUND)?;

    let organization = state
        .organizations
        .get(OrganizationQuery { id: id.0 })
        .await
        .map_err(|err| {
            tracing::error!(error = %err, organization = id.0, "organization lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(organization))
}

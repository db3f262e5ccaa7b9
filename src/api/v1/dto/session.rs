use serde::Serialize;

use crate::middleware::auth::OrganizationId;
use crate::services::auth::{Principal, Scheme};

/// `GET /me`: what the gate established for this request.
///
/// All fields are `None` when auth is disabled.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub principal: Option<Principal>,
    pub scheme: Option<Scheme>,
    pub organization_id: Option<OrganizationId>,
}

#[derive(Debug, Serialize)]
pub struct AuthConfigResponse {
    pub enabled: bool,
    pub scheme: Option<String>,
}

//! Authorization stage.
//!
//! Principal → Scheme → organization claim → organization lookup → user lookup → role.
//! Checks run strictly in that order; the first failure ends the request and
//! later checks (and their store calls) never run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{Extensions, HeaderMap},
};

use crate::error::AuthError;
use crate::middleware::auth::{
    context::{self, OrganizationId, RequestMeta},
    pipeline::{DEFAULT_CALL_TIMEOUT, Stage},
};
use crate::repos::{OrganizationQuery, OrganizationsStore, RepoError, UserQuery, UsersStore};
use crate::services::auth::has_authorized_role;

#[derive(Clone)]
pub struct AuthorizationStage {
    users: Arc<dyn UsersStore>,
    organizations: Arc<dyn OrganizationsStore>,
    use_auth: bool,
    required: String,
    call_timeout: Duration,
}

impl std::fmt::Debug for AuthorizationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationStage")
            .field("use_auth", &self.use_auth)
            .field("required", &self.required)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

/// Organization claims are plain base-10 digits; no sign, no whitespace.
fn parse_organization_claim(claim: &str) -> Result<u64, AuthError> {
    if claim.is_empty() || !claim.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AuthError::MalformedOrganizationClaim(claim.to_string()));
    }
    claim
        .parse::<u64>()
        .map_err(|_| AuthError::MalformedOrganizationClaim(claim.to_string()))
}

impl AuthorizationStage {
    /// `required` is a role name (`viewer`, `editor`, `admin`); any other
    /// value denies every request.
    pub fn new(
        users: Arc<dyn UsersStore>,
        organizations: Arc<dyn OrganizationsStore>,
        use_auth: bool,
        required: impl Into<String>,
    ) -> Self {
        Self {
            users,
            organizations,
            use_auth,
            required: required.into(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Deadline for each store lookup.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Decide for the request context; on success returns the organization
    /// the principal was authorized against.
    pub async fn authorize(&self, extensions: &Extensions) -> Result<OrganizationId, AuthError> {
        let principal = context::principal(extensions)?;
        let scheme = context::scheme(extensions)?;

        let id = parse_organization_claim(&principal.organization)?;
        let organization = tokio::time::timeout(
            self.call_timeout,
            self.organizations.get(OrganizationQuery { id }),
        )
        .await
        .unwrap_or(Err(RepoError::TimedOut));
        match organization {
            Ok(Some(_)) => {}
            Ok(None) => return Err(AuthError::OrganizationNotFound(id)),
            Err(err) => return Err(AuthError::OrganizationStore(err)),
        }

        let query = UserQuery {
            name: principal.subject.clone(),
            provider: principal.issuer.clone(),
            scheme: scheme.as_str().to_string(),
        };
        let user = tokio::time::timeout(self.call_timeout, self.users.get(query))
            .await
            .unwrap_or(Err(RepoError::TimedOut))
            .map_err(AuthError::UserStore)?;

        if has_authorized_role(user.as_ref(), &self.required) {
            return Ok(OrganizationId(id));
        }

        Err(match user {
            None => AuthError::UserNotFound,
            Some(_) => AuthError::InsufficientRole(self.required.clone()),
        })
    }
}

#[async_trait]
impl Stage for AuthorizationStage {
    fn name(&self) -> &'static str {
        "role_auth"
    }

    async fn handle(
        &self,
        mut req: Request,
        _response_headers: &mut HeaderMap,
    ) -> Result<Request, AuthError> {
        if !self.use_auth {
            return Ok(req);
        }

        let meta = RequestMeta::from_request(self.name(), &req);
        let decision = self.authorize(req.extensions()).await;
        match decision {
            Ok(organization) => {
                req.extensions_mut().insert(organization);
                Ok(req)
            }
            Err(err) => {
                meta.reject(&err);
                Err(err)
            }
        }
    }
}

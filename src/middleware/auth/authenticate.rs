//! Authentication stage: validate → extend → Principal / Scheme を extensions に入れる
//!
//! 認可 (role) はここでは見ない。後段の AuthorizationStage の責務。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{HeaderMap, request::Parts},
};

use crate::error::AuthError;
use crate::middleware::auth::{
    context::RequestMeta,
    pipeline::{DEFAULT_CALL_TIMEOUT, Stage},
};
use crate::services::auth::{Authenticator, Scheme, TokenError};

#[derive(Clone)]
pub struct AuthenticationStage {
    authenticator: Arc<dyn Authenticator>,
    call_timeout: Duration,
}

impl std::fmt::Debug for AuthenticationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationStage")
            .field("scheme", &self.authenticator.scheme())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl AuthenticationStage {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            authenticator,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Deadline for each of `validate` and `extend`.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    async fn authenticate(
        &self,
        parts: &mut Parts,
        response_headers: &mut HeaderMap,
    ) -> Result<(), AuthError> {
        let principal = tokio::time::timeout(self.call_timeout, self.authenticator.validate(parts))
            .await
            .unwrap_or(Err(TokenError::TimedOut))
            .map_err(AuthError::InvalidPrincipal)?;

        // A failed extend must not leave half-written credentials behind.
        let mut refreshed = HeaderMap::new();
        let principal = tokio::time::timeout(
            self.call_timeout,
            self.authenticator.extend(&mut refreshed, principal),
        )
        .await
        .unwrap_or(Err(TokenError::TimedOut))
        .map_err(AuthError::ExtensionFailure)?;

        for (name, value) in &refreshed {
            response_headers.append(name.clone(), value.clone());
        }

        parts.extensions.insert(principal);
        parts
            .extensions
            .insert(Scheme(self.authenticator.scheme().to_string()));
        Ok(())
    }
}

#[async_trait]
impl Stage for AuthenticationStage {
    fn name(&self) -> &'static str {
        "token_auth"
    }

    async fn handle(
        &self,
        req: Request,
        response_headers: &mut HeaderMap,
    ) -> Result<Request, AuthError> {
        let meta = RequestMeta::from_request(self.name(), &req);
        let (mut parts, body) = req.into_parts();

        match self.authenticate(&mut parts, response_headers).await {
            Ok(()) => Ok(Request::from_parts(parts, body)),
            Err(err) => {
                meta.reject(&err);
                Err(err)
            }
        }
    }
}

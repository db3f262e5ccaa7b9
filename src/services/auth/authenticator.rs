/*
 * Responsibility
 * - 認証 (Authenticator) の契約: validate / extend
 * - 検証済み主体 (Principal) と認証方式 (Scheme) の型
 *
 * Notes
 * - トークン形式 (JWT/cookie など) は実装側の責務。middleware はこの trait だけを見る
 */
use async_trait::async_trait;
use axum::http::{HeaderMap, header::InvalidHeaderValue, request::Parts};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// リクエストの資格情報から得られた認証済み主体
///
/// - `subject`: ユーザー識別子 (opaque)
/// - `issuer`: IdP 識別子
/// - `organization`: 所属組織 ID の文字列表現 (空のこともある)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject: String,
    pub issuer: String,
    pub organization: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Principal {
    pub fn new(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            issuer: issuer.into(),
            organization: organization.into(),
            issued_at: None,
            expires_at: None,
        }
    }
}

/// Authentication mechanism that produced the request's principal (e.g. `oauth2`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scheme(pub String);

impl Scheme {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no session token on request")]
    Missing,
    #[error("token verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
    #[error("session lifespan exhausted")]
    Exhausted,
    #[error("session cookie is not a valid header value: {0}")]
    Cookie(#[from] InvalidHeaderValue),
    #[error("authenticator did not answer in time")]
    TimedOut,
}

/// Pluggable token authenticator.
///
/// Implementations must be cheap to share (`Arc<dyn Authenticator>`), and must
/// return `Err` on any ambiguity; callers reject on every error.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    /// Name of the mechanism, stored next to the principal on success.
    fn scheme(&self) -> &str;

    /// Extract and verify the credentials carried by the request.
    async fn validate(&self, parts: &Parts) -> Result<Principal, TokenError>;

    /// Slide the principal's validity window forward.
    ///
    /// Refreshed credentials (cookies, headers) are written into
    /// `response_headers`; they reach the client only if the request is
    /// eventually delegated to the protected handler.
    async fn extend(
        &self,
        response_headers: &mut HeaderMap,
        principal: Principal,
    ) -> Result<Principal, TokenError>;
}

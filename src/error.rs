/*
 * Responsibility
 * - ゲートの失敗理由 (AuthError) の定義
 * - IntoResponse: クライアントに見せるのは 2 種類だけ
 *   - 認証失敗 → 403 (body なし)
 *   - 認可失敗 → 401 "User is not authorized"
 * - 具体的な理由はサーバー側ログにだけ出す (組織/ユーザーの存在を推測させない)
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::repos::RepoError;
use crate::services::auth::TokenError;

pub const UNAUTHORIZED_MESSAGE: &str = "User is not authorized";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid principal: {0}")]
    InvalidPrincipal(#[source] TokenError),
    #[error("unable to extend principal: {0}")]
    ExtensionFailure(#[source] TokenError),
    #[error("{0} missing from request context")]
    MissingContextValue(&'static str),
    #[error("organization claim {0:?} is not a numeric id")]
    MalformedOrganizationClaim(String),
    #[error("organization {0} not found")]
    OrganizationNotFound(u64),
    #[error("organization lookup failed: {0}")]
    OrganizationStore(#[source] RepoError),
    #[error("user not found")]
    UserNotFound,
    #[error("user lookup failed: {0}")]
    UserStore(#[source] RepoError),
    #[error("user lacks required role {0:?}")]
    InsufficientRole(String),
}

impl AuthError {
    /// Failures of the credential itself, as opposed to failures to authorize it.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidPrincipal(_) | AuthError::ExtensionFailure(_)
        )
    }

    pub fn status(&self) -> StatusCode {
        if self.is_authentication() {
            StatusCode::FORBIDDEN
        } else {
            StatusCode::UNAUTHORIZED
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.is_authentication() {
            self.status().into_response()
        } else {
            (self.status(), UNAUTHORIZED_MESSAGE).into_response()
        }
    }
}

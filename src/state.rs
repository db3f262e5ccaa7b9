/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - authenticator: 認証が無効なら None
 *   - users / organizations: ゲートが読む store
 *   - call_timeout: ゲート内の外部呼び出し 1 回あたりの上限
 * - Clone 前提で持つ (内部は Arc)
 * - ロールごとのゲート (Pipeline) を組み立てる
 */
use std::sync::Arc;
use std::time::Duration;

use crate::middleware::auth::{
    AuthenticationStage, AuthorizationStage, DEFAULT_CALL_TIMEOUT, Pipeline,
};
use crate::repos::{OrganizationsStore, UsersStore};
use crate::services::auth::{Authenticator, Role};

#[derive(Clone)]
pub struct AppState {
    pub authenticator: Option<Arc<dyn Authenticator>>,
    pub users: Arc<dyn UsersStore>,
    pub organizations: Arc<dyn OrganizationsStore>,
    pub call_timeout: Duration,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("scheme", &self.scheme())
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        authenticator: Option<Arc<dyn Authenticator>>,
        users: Arc<dyn UsersStore>,
        organizations: Arc<dyn OrganizationsStore>,
    ) -> Self {
        Self {
            authenticator,
            users,
            organizations,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Shrink `call_timeout` so that validate, extend and both lookups,
    /// run back to back, still finish inside `request_timeout`.
    pub fn bounded_by(mut self, request_timeout: Duration) -> Self {
        self.call_timeout = self.call_timeout.min(request_timeout / 5);
        self
    }

    pub fn use_auth(&self) -> bool {
        self.authenticator.is_some()
    }

    pub fn scheme(&self) -> Option<&str> {
        self.authenticator.as_deref().map(|a| a.scheme())
    }

    /// Gate for routes that need at least `required`.
    ///
    /// With auth disabled there is no authentication stage and the
    /// authorization stage runs in bypass mode.
    pub fn gate(&self, required: Role) -> Pipeline {
        let pipeline = match &self.authenticator {
            Some(authenticator) => {
                Pipeline::new().stage(
                    AuthenticationStage::new(authenticator.clone())
                        .with_call_timeout(self.call_timeout),
                )
            }
            None => Pipeline::new(),
        };

        pipeline.stage(
            AuthorizationStage::new(
                self.users.clone(),
                self.organizations.clone(),
                self.use_auth(),
                required.as_str(),
            )
            .with_call_timeout(self.call_timeout),
        )
    }
}

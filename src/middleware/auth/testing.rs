//! Fakes shared by the gate tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    extract::Request,
    http::{Extensions, HeaderMap, HeaderValue, StatusCode, header, request::Parts},
};
use chrono::Utc;
use tower::ServiceExt;

use crate::middleware::auth::context;
use crate::repos::{
    InMemoryStore, Organization, OrganizationQuery, OrganizationsStore, RepoError, User,
    UserQuery, UsersStore,
};
use crate::services::auth::{Authenticator, Principal, TokenError};

pub(crate) const REFRESHED_COOKIE: &str = "session=refreshed; Path=/; HttpOnly";

pub(crate) struct FakeAuthenticator {
    principal: Option<Principal>,
    extend_fails: bool,
    validate_delay: Option<Duration>,
    pub validate_calls: AtomicUsize,
    pub extend_calls: AtomicUsize,
}

impl FakeAuthenticator {
    fn build(principal: Option<Principal>, extend_fails: bool) -> Self {
        Self {
            principal,
            extend_fails,
            validate_delay: None,
            validate_calls: AtomicUsize::new(0),
            extend_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn accepting(principal: Principal) -> Self {
        Self::build(Some(principal), false)
    }

    pub(crate) fn rejecting() -> Self {
        Self::build(None, false)
    }

    pub(crate) fn failing_extend(principal: Principal) -> Self {
        Self::build(Some(principal), true)
    }

    /// Accepts, but only after `delay`.
    pub(crate) fn stalling(delay: Duration) -> Self {
        Self {
            validate_delay: Some(delay),
            ..Self::build(Some(Principal::new("billieta", "github", "42")), false)
        }
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    fn scheme(&self) -> &str {
        "oauth2"
    }

    async fn validate(&self, _parts: &Parts) -> Result<Principal, TokenError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.validate_delay {
            tokio::time::sleep(delay).await;
        }
        self.principal.clone().ok_or(TokenError::Missing)
    }

    async fn extend(
        &self,
        response_headers: &mut HeaderMap,
        principal: Principal,
    ) -> Result<Principal, TokenError> {
        self.extend_calls.fetch_add(1, Ordering::SeqCst);
        if self.extend_fails {
            return Err(TokenError::Exhausted);
        }
        response_headers.append(header::SET_COOKIE, HeaderValue::from_static(REFRESHED_COOKIE));
        Ok(Principal {
            expires_at: Some(Utc::now()),
            ..principal
        })
    }
}

/// Wraps the in-memory store, counting calls and optionally failing like a dead
/// or stalled backend.
#[derive(Default)]
pub(crate) struct CountingStore {
    pub inner: InMemoryStore,
    pub user_calls: AtomicUsize,
    pub organization_calls: AtomicUsize,
    pub users_down: bool,
    pub organizations_down: bool,
    pub organizations_delay: Option<Duration>,
}

impl CountingStore {
    /// Organization 42 and user billieta@github (oauth2) holding `roles`.
    pub(crate) fn with_fixture(roles: &[&str]) -> Self {
        let store = Self::default();
        store
            .inner
            .insert_organization(Organization {
                id: 42,
                name: "Howdy".to_string(),
                default_role: "viewer".to_string(),
            })
            .unwrap();
        store
            .inner
            .insert_user(User {
                id: 1,
                name: "billieta".to_string(),
                provider: "github".to_string(),
                scheme: "oauth2".to_string(),
                roles: roles.iter().map(|r| r.to_string()).collect(),
            })
            .unwrap();
        store
    }

    pub(crate) fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn organization_calls(&self) -> usize {
        self.organization_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsersStore for CountingStore {
    async fn get(&self, query: UserQuery) -> Result<Option<User>, RepoError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        if self.users_down {
            return Err(RepoError::Unavailable("users backend down".to_string()));
        }
        UsersStore::get(&self.inner, query).await
    }
}

#[async_trait]
impl OrganizationsStore for CountingStore {
    async fn get(&self, query: OrganizationQuery) -> Result<Option<Organization>, RepoError> {
        self.organization_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.organizations_delay {
            tokio::time::sleep(delay).await;
        }
        if self.organizations_down {
            return Err(RepoError::Unavailable("organizations backend down".to_string()));
        }
        OrganizationsStore::get(&self.inner, query).await
    }
}

/// Handler that reports what the gate left in the request context.
pub(crate) async fn echo_context(extensions: Extensions) -> String {
    let subject = context::principal(&extensions)
        .map(|p| p.subject.clone())
        .unwrap_or_else(|_| "-".to_string());
    let scheme = context::scheme(&extensions)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|_| "-".to_string());
    let organization = context::organization_id(&extensions)
        .map(|id| id.0.to_string())
        .unwrap_or_else(|_| "-".to_string());
    format!("{subject}|{scheme}|{organization}")
}

pub(crate) fn empty_request(path: &str) -> Request {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

pub(crate) async fn send(router: Router, req: Request) -> (StatusCode, HeaderMap, String) {
    let res = router.oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let body = to_bytes(res.into_body(), 64 * 1024).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

//! Request-scoped values shared between the gate stages and handlers.
//!
//! Each value lives in the request's `Extensions` keyed by its own type, so
//! there are no string keys to collide. Read them through the accessors here;
//! a missing value is always an authorization failure.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, OriginalUri, Request},
    http::{Extensions, Method, Uri},
};
use serde::Serialize;

use crate::error::AuthError;
use crate::services::auth::{Principal, Scheme};

/// Organization the request was authorized against (set by the authorization stage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OrganizationId(pub u64);

pub fn principal(extensions: &Extensions) -> Result<&Principal, AuthError> {
    extensions
        .get::<Principal>()
        .ok_or(AuthError::MissingContextValue("principal"))
}

pub fn scheme(extensions: &Extensions) -> Result<&Scheme, AuthError> {
    extensions
        .get::<Scheme>()
        .ok_or(AuthError::MissingContextValue("scheme"))
}

pub fn organization_id(extensions: &Extensions) -> Result<OrganizationId, AuthError> {
    extensions
        .get::<OrganizationId>()
        .copied()
        .ok_or(AuthError::MissingContextValue("organization id"))
}

/// Fields attached to every rejection log line.
#[derive(Debug, Clone)]
pub(crate) struct RequestMeta {
    component: &'static str,
    remote_addr: String,
    method: Method,
    url: Uri,
}

impl RequestMeta {
    pub(crate) fn from_request(component: &'static str, req: &Request) -> Self {
        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "-".to_string());

        // nest() strips the prefix from req.uri(); log what the client sent
        let url = req
            .extensions()
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.clone())
            .unwrap_or_else(|| req.uri().clone());

        Self {
            component,
            remote_addr,
            method: req.method().clone(),
            url,
        }
    }

    pub(crate) fn reject(&self, err: &AuthError) {
        match err {
            AuthError::InsufficientRole(_) => tracing::warn!(
                component = self.component,
                remote_addr = %self.remote_addr,
                method = %self.method,
                url = %self.url,
                error = %err,
                "request denied"
            ),
            _ => tracing::error!(
                component = self.component,
                remote_addr = %self.remote_addr,
                method = %self.method,
                url = %self.url,
                error = %err,
                "request rejected"
            ),
        }
    }
}

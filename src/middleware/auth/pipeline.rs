//! Ordered chain of gate stages, applied to a router as a single route layer.
//!
//! 例：
//! ```ignore
//! let gate = Pipeline::new()
//!     .stage(AuthenticationStage::new(authenticator))
//!     .stage(AuthorizationStage::new(users, organizations, true, "viewer"));
//! let router = gate.apply(Router::new().route("/me", get(me)));
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    extract::{Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::error::AuthError;

/// Upper bound for a single authenticator or store call made by a stage.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// One step of the gate: either hand the (possibly enriched) request on, or reject it.
#[async_trait]
pub trait Stage: Send + Sync + 'static {
    /// Component tag used in logs.
    fn name(&self) -> &'static str;

    /// Headers written to `response_headers` are added to the downstream
    /// response when every stage passes, and dropped otherwise.
    async fn handle(
        &self,
        req: Request,
        response_headers: &mut HeaderMap,
    ) -> Result<Request, AuthError>;
}

#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|s| s.name()))
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: impl Stage) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Guard every route currently registered on `router`.
    ///
    /// `router` must already have its routes; routes added afterwards are not guarded.
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(self, run_pipeline))
    }

    pub async fn run(&self, mut req: Request, next: Next) -> Response {
        let mut response_headers = HeaderMap::new();

        for stage in &self.stages {
            req = match stage.handle(req, &mut response_headers).await {
                Ok(req) => req,
                Err(err) => return err.into_response(),
            };
        }

        let mut response = next.run(req).await;
        for (name, value) in &response_headers {
            response.headers_mut().append(name.clone(), value.clone());
        }
        response
    }
}

async fn run_pipeline(State(pipeline): State<Pipeline>, req: Request, next: Next) -> Response {
    pipeline.run(req, next).await
}

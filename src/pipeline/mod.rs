//! Request-handling pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! incoming request
//!     → caller-supplied `before` stages
//!     → log.rs (hook, never finalizes)
//!     → rewrite.rs (optional URL rewrite)
//!     → cors.rs (optional preflight short-circuit)
//!     → robots.rs (optional /robots.txt short-circuit)
//!     → static_files.rs (ServeDir lookup; defers 404 when proxying)
//!     → proxy.rs (optional upstream forward)
//!     → top-level finalizer (nothing claimed the request)
//! ```
//!
//! # Design Decisions
//! - Stage order is fixed at assembly and never configurable
//! - Stages share the resolved config read-only; only the request and
//!   response values flow and mutate
//! - The first stage to return `Done` wins; later stages never run

pub mod assemble;
pub mod cors;
pub mod log;
pub mod proxy;
pub mod rewrite;
pub mod robots;
pub mod static_files;

pub use assemble::assemble;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::config::ServerConfig;
use crate::observability::logging::{RequestSummary, ResponseSummary};

/// Result of one stage examining a request.
pub enum StageOutcome {
    /// The stage did not finalize; the (possibly modified) request moves
    /// on to the next stage.
    Continue(Request<Body>),
    /// Terminal response. Later stages do not run.
    Done(Response),
}

/// One link in the request-handling chain.
#[async_trait]
pub trait Stage: Send + Sync {
    async fn handle(&self, req: Request<Body>) -> StageOutcome;
}

/// Pre-rewrite request target, recorded by the rewrite stage as a request
/// extension. The proxy stage restores it before forwarding: rewriting is
/// reserved for static lookups.
#[derive(Debug, Clone)]
pub struct OriginalPath(pub String);

/// Run the stages in order until one finalizes.
///
/// When every stage signals continue, the top-level finalizer takes over:
/// it reports through the log hook and answers with an empty body. With
/// the built-in assembly this only happens if a caller-supplied stage
/// consumed the exchange without responding.
pub async fn run_pipeline(
    stages: &[Arc<dyn Stage>],
    config: &ServerConfig,
    mut req: Request<Body>,
) -> Response {
    let summary = RequestSummary::of(&req);

    for stage in stages {
        match stage.handle(req).await {
            StageOutcome::Continue(next) => req = next,
            StageOutcome::Done(response) => return response,
        }
    }

    tracing::warn!(
        method = %summary.method,
        path = %summary.path,
        "no pipeline stage produced a response"
    );
    if let Some(hook) = &config.log_fn {
        let response = ResponseSummary {
            status: StatusCode::NOT_FOUND,
        };
        hook.log(
            &summary,
            Some(&response),
            Some("no pipeline stage produced a response"),
        );
    }
    (StatusCode::NOT_FOUND, Body::empty()).into_response()
}

//! Structured logging and the request log hook.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Define the caller-facing log hook interface
//!
//! # Design Decisions
//! - Internal diagnostics go through the tracing crate; the log hook is a
//!   separate, caller-owned channel with no implicit side effects
//! - The hook receives summaries, not the live request/response objects,
//!   so a hook can never finalize or mutate an exchange

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Honors `RUST_LOG` when set; defaults to info-level output for the
/// server and its tower-http layers.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staticd=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Read-only view of an incoming request, handed to log hooks.
#[derive(Debug, Clone)]
pub struct RequestSummary {
    pub method: Method,
    pub path: String,
}

impl RequestSummary {
    pub fn of(req: &Request<Body>) -> Self {
        Self {
            method: req.method().clone(),
            path: req.uri().path().to_string(),
        }
    }
}

/// Read-only view of an outgoing response, handed to log hooks.
#[derive(Debug, Clone)]
pub struct ResponseSummary {
    pub status: StatusCode,
}

/// Caller-supplied logging callback.
///
/// Invoked by the logging stage as each request enters the pipeline,
/// with `response` still `None` because no response exists yet, and by
/// the failing finalizers (proxy 502, top-level empty-body answer) with
/// the terminal status and `error` set. Hooks observe; they never
/// finalize a response.
pub trait LogHook: Send + Sync {
    fn log(
        &self,
        request: &RequestSummary,
        response: Option<&ResponseSummary>,
        error: Option<&str>,
    );
}

impl<F> LogHook for F
where
    F: Fn(&RequestSummary, Option<&ResponseSummary>, Option<&str>) + Send + Sync,
{
    fn log(
        &self,
        request: &RequestSummary,
        response: Option<&ResponseSummary>,
        error: Option<&str>,
    ) {
        self(request, response, error)
    }
}

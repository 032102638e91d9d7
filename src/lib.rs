//! Configurable static file server with proxy fallback.
//!
//! Serves files from a resolved root directory, optionally rewrites request
//! URLs, answers CORS preflights, synthesizes `/robots.txt`, and forwards
//! unresolved requests to a single upstream origin. Every request flows
//! through an ordered pipeline of stages; the first stage to produce a
//! response wins.

pub mod config;
pub mod http;
pub mod observability;
pub mod pipeline;

pub use config::{ConfigError, ServerConfig, ServerOptions};
pub use http::StaticServer;
pub use observability::logging::{LogHook, RequestSummary, ResponseSummary};
pub use pipeline::{Stage, StageOutcome};

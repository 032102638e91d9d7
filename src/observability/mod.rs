//! Cross-cutting observability concerns.

pub mod logging;

pub use logging::{LogHook, RequestSummary, ResponseSummary};

//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (axum router, fallback handler)
//!     → pipeline::run_pipeline (stages in order, first Done wins)
//!     → configured headers merged (insert-if-absent)
//!     → response written by the transport
//! ```

pub mod server;
pub mod tls;

pub use server::StaticServer;

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI flags / config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → schema.rs (ServerOptions: partial, everything optional)
//!     → resolve.rs (defaulting, root probe, CORS header seeding)
//!     → ServerConfig (fully resolved, immutable)
//!     → shared via Arc with every pipeline stage
//! ```
//!
//! # Design Decisions
//! - Options are loose on purpose: every field is optional, and fields the
//!   original CLI accepted as "boolean or string" keep that shape via
//!   untagged enums instead of being tightened away.
//! - Resolution runs exactly once, at construction. Malformed optional
//!   values default silently; only rewrite-pattern and proxy-URL
//!   compilation can fail.

pub mod loader;
pub mod resolve;
pub mod schema;

pub use loader::load_options;
pub use resolve::{CorsPolicy, RewriteRule, RobotsPolicy, ServerConfig};
pub use schema::{CacheSetting, ExtSetting, RobotsSetting, ServerOptions, TlsSettings};

use thiserror::Error;

/// Error type for configuration loading and resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid rewrite pattern: {0}")]
    Rewrite(#[from] regex::Error),

    #[error("Invalid proxy target: {0}")]
    Proxy(#[from] axum::http::uri::InvalidUri),
}

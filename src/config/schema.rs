//! Configuration schema definitions.
//!
//! `ServerOptions` is the partial, caller-facing options structure: every
//! field is optional and deserializable from TOML. Fields the original
//! CLI accepted in more than one shape (`cache`, `ext`, `robots`) are
//! modeled as untagged enums so loose inputs survive deserialization and
//! get normalized during resolution instead of being rejected.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::observability::logging::LogHook;
use crate::pipeline::Stage;

/// Caller-supplied server options. All fields optional; see
/// [`ServerConfig::resolve`](crate::config::ServerConfig::resolve) for the
/// defaulting rules.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerOptions {
    /// Static file root. When absent, `./public` is probed once at
    /// construction and used if it stats; otherwise `./`.
    pub root: Option<PathBuf>,

    /// Extra response headers merged into every response.
    pub headers: BTreeMap<String, String>,

    /// Cache-Control max-age in seconds. Non-numeric values default to
    /// 3600; a numeric 0 is preserved.
    pub cache: Option<CacheSetting>,

    /// Resolve index files for directory requests (directory listing
    /// rendering is owned by the static-serving capability).
    pub show_dir: bool,

    /// Serve `index.html` when a directory is requested.
    pub auto_index: bool,

    /// Serve paths containing dot-prefixed components.
    pub show_dotfiles: bool,

    /// Serve precompressed `.gz` siblings when the client accepts gzip.
    pub gzip: bool,

    /// Fallback MIME type when none can be inferred.
    pub content_type: Option<String>,

    /// Default extension appended to extensionless paths. `true` selects
    /// `html`; a string is used as-is; `false`/absent disables.
    pub ext: Option<ExtSetting>,

    /// Custom stages to run before the built-in pipeline.
    #[serde(skip)]
    pub before: Vec<Arc<dyn Stage>>,

    /// Request log hook.
    #[serde(skip)]
    pub log_fn: Option<Arc<dyn LogHook>>,

    /// URL rewrite rule as `[pattern, replacement]`. The pattern is a
    /// regex; replacement supports `$1`-style capture references.
    pub rewrite: Option<(String, String)>,

    /// Enable CORS response headers.
    pub cors: bool,

    /// Extra `Access-Control-Allow-Headers` values, comma-separated,
    /// appended after the fixed baseline.
    pub cors_headers: Option<String>,

    /// Respond to `/robots.txt`. `true` selects the disallow-all default;
    /// a string is served literally (with the first `\n` escape sequence
    /// unescaped).
    pub robots: Option<RobotsSetting>,

    /// Upstream origin requests fall back to when no static file matches.
    pub proxy: Option<String>,

    /// TLS certificate/key paths; presence enables the TLS transport.
    pub https: Option<TlsSettings>,
}

/// Cache-Control setting: a number of seconds, or anything else
/// (defaulted away at resolution, mirroring an `isNaN` check).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CacheSetting {
    Seconds(u64),
    Invalid(toml::Value),
}

/// Default-extension setting: `true`/`false` or an explicit extension.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ExtSetting {
    Enabled(bool),
    Extension(String),
}

/// Robots policy setting: `true`/`false` or literal robots.txt text.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RobotsSetting {
    Enabled(bool),
    Text(String),
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsSettings {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

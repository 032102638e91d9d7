//! Option resolution.
//!
//! # Responsibilities
//! - Probe the filesystem for the conventional `public` root
//! - Apply defaults for absent or malformed optional values
//! - Seed CORS headers into the response header set
//! - Compile the rewrite pattern and parse the proxy target
//!
//! # Design Decisions
//! - Resolution runs exactly once, synchronously, at construction
//! - Malformed optional values never error; they default silently. The
//!   only failure modes are rewrite-pattern compilation and proxy-URL
//!   parsing, which have no sensible default
//! - The resolved config is immutable and shared via Arc for the process
//!   lifetime; no per-request rebuilding

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::Uri;
use regex::Regex;

use crate::config::schema::{
    CacheSetting, ExtSetting, RobotsSetting, ServerOptions, TlsSettings,
};
use crate::config::ConfigError;
use crate::observability::logging::LogHook;
use crate::pipeline::Stage;

const PUBLIC_ROOT: &str = "public";
const DEFAULT_CACHE_SECS: u64 = 3600;
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const DEFAULT_EXT: &str = "html";

const CORS_ALLOW_HEADERS_BASELINE: &str =
    "Origin, X-Requested-With, Content-Type, Accept, Range";

/// CORS policy: the resolved allow-header set.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    /// Header names accepted in preflight requests, baseline first,
    /// caller extras after, duplicates preserved as given.
    pub allow_headers: Vec<String>,
}

/// Compiled URL rewrite rule.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub pattern: Regex,
    pub replacement: String,
}

/// Robots.txt response policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsPolicy {
    /// `User-agent: *` / `Disallow: /`.
    DisallowAll,
    /// Literal caller-supplied text.
    Custom(String),
}

/// Fully-resolved server configuration. Immutable after construction.
pub struct ServerConfig {
    pub root: PathBuf,
    /// Extra response headers, insertion-ordered. Mutated only during
    /// resolution (CORS seeding); read-only afterwards.
    pub headers: Vec<(String, String)>,
    pub cache_secs: u64,
    pub show_dir: bool,
    pub auto_index: bool,
    pub show_dotfiles: bool,
    pub gzip: bool,
    pub content_type: String,
    pub default_ext: Option<String>,
    pub cors: Option<CorsPolicy>,
    pub rewrite: Option<RewriteRule>,
    pub robots: Option<RobotsPolicy>,
    pub proxy: Option<Uri>,
    pub before: Vec<Arc<dyn Stage>>,
    pub log_fn: Option<Arc<dyn LogHook>>,
    pub tls: Option<TlsSettings>,
}

impl ServerConfig {
    /// Resolve caller options into a complete configuration.
    pub fn resolve(options: ServerOptions) -> Result<Self, ConfigError> {
        Self::resolve_in(options, Path::new("."))
    }

    /// Resolution against an explicit base directory for the root probe.
    /// Split out so tests can probe a temp directory instead of the
    /// process working directory.
    pub(crate) fn resolve_in(options: ServerOptions, base: &Path) -> Result<Self, ConfigError> {
        let root = match options.root {
            Some(root) => root,
            // Any stat success selects the conventional root, broken
            // symlinks included, hence symlink_metadata over metadata.
            None => {
                let public = base.join(PUBLIC_ROOT);
                if fs::symlink_metadata(&public).is_ok() {
                    public
                } else {
                    base.to_path_buf()
                }
            }
        };

        let cache_secs = match options.cache {
            Some(CacheSetting::Seconds(secs)) => secs,
            Some(CacheSetting::Invalid(value)) => {
                tracing::debug!(value = %value, "non-numeric cache setting, using default");
                DEFAULT_CACHE_SECS
            }
            None => DEFAULT_CACHE_SECS,
        };

        let content_type = options
            .content_type
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let default_ext = match options.ext {
            Some(ExtSetting::Enabled(true)) => Some(DEFAULT_EXT.to_string()),
            Some(ExtSetting::Extension(ext)) if !ext.is_empty() => Some(ext),
            _ => None,
        };

        let mut headers: Vec<(String, String)> = options.headers.into_iter().collect();

        let cors = if options.cors {
            let mut allow_headers = CORS_ALLOW_HEADERS_BASELINE.to_string();
            if let Some(extra) = &options.cors_headers {
                // Literal concatenation: extras appended as given, after
                // the baseline, without deduplication.
                for header in extra.split(',').map(str::trim).filter(|h| !h.is_empty()) {
                    allow_headers.push_str(", ");
                    allow_headers.push_str(header);
                }
            }
            upsert(&mut headers, "Access-Control-Allow-Origin", "*".to_string());
            upsert(
                &mut headers,
                "Access-Control-Allow-Headers",
                allow_headers.clone(),
            );
            Some(CorsPolicy {
                allow_headers: allow_headers
                    .split(',')
                    .map(|h| h.trim().to_string())
                    .collect(),
            })
        } else {
            None
        };

        let rewrite = match options.rewrite {
            Some((pattern, replacement)) => Some(RewriteRule {
                pattern: Regex::new(&pattern)?,
                replacement,
            }),
            None => None,
        };

        let robots = match options.robots {
            Some(RobotsSetting::Enabled(true)) => Some(RobotsPolicy::DisallowAll),
            // Single-occurrence unescape: only the first literal "\n"
            // becomes a newline.
            Some(RobotsSetting::Text(text)) => {
                Some(RobotsPolicy::Custom(text.replacen("\\n", "\n", 1)))
            }
            _ => None,
        };

        let proxy = options.proxy.map(|p| p.parse::<Uri>()).transpose()?;

        Ok(Self {
            root,
            headers,
            cache_secs,
            show_dir: options.show_dir,
            auto_index: options.auto_index,
            show_dotfiles: options.show_dotfiles,
            gzip: options.gzip,
            content_type,
            default_ext,
            cors,
            rewrite,
            robots,
            proxy,
            before: options.before,
            log_fn: options.log_fn,
            tls: options.https,
        })
    }
}

/// Replace the value of an existing header entry, or append a new one.
fn upsert(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    match headers.iter_mut().find(|(n, _)| n == name) {
        Some((_, existing)) => *existing = value,
        None => headers.push((name.to_string(), value)),
    }
}

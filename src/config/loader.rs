//! Option loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServerOptions;
use crate::config::ConfigError;

/// Load server options from a TOML file.
///
/// Loading is syntactic only; defaulting and normalization happen later,
/// in [`ServerConfig::resolve`](crate::config::ServerConfig::resolve).
pub fn load_options(path: &Path) -> Result<ServerOptions, ConfigError> {
    let content = fs::read_to_string(path)?;
    let options: ServerOptions = toml::from_str(&content)?;
    Ok(options)
}

//! staticd — static file server with proxy fallback.
//!
//! Serves a directory over HTTP (or HTTPS), with optional CORS headers,
//! URL rewriting, robots.txt synthesis and single-upstream proxying for
//! requests no static file satisfies.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use staticd::config::{
    load_options, CacheSetting, ExtSetting, RobotsSetting, ServerOptions, TlsSettings,
};
use staticd::observability::logging::init_tracing;
use staticd::StaticServer;

#[derive(Parser)]
#[command(name = "staticd")]
#[command(about = "Static file server with proxy fallback", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "0.0.0.0")]
    address: IpAddr,

    /// Load options from a TOML file (flags override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Static file root (defaults to ./public when present, else ./)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Cache-Control max-age in seconds
    #[arg(long)]
    cache: Option<u64>,

    /// Resolve index files for directory requests
    #[arg(short = 'd', long)]
    show_dir: bool,

    /// Serve index.html for directory requests
    #[arg(short = 'i', long)]
    auto_index: bool,

    /// Serve dot-prefixed files and directories
    #[arg(long)]
    dotfiles: bool,

    /// Serve precompressed .gz siblings when the client accepts gzip
    #[arg(short, long)]
    gzip: bool,

    /// Default extension for extensionless paths (e.g. "html")
    #[arg(short, long)]
    ext: Option<String>,

    /// Fallback MIME type when none can be inferred
    #[arg(long)]
    content_type: Option<String>,

    /// Enable CORS headers
    #[arg(long)]
    cors: bool,

    /// Extra Access-Control-Allow-Headers values, comma-separated
    #[arg(long)]
    cors_headers: Option<String>,

    /// Respond to /robots.txt with a disallow-all policy
    #[arg(long)]
    robots: bool,

    /// Respond to /robots.txt with the given text (overrides --robots)
    #[arg(long)]
    robots_txt: Option<String>,

    /// URL rewrite rule: regex pattern, then replacement
    #[arg(long, num_args = 2, value_names = ["PATTERN", "REPLACEMENT"])]
    rewrite: Option<Vec<String>>,

    /// Upstream origin to forward unresolved requests to
    #[arg(long)]
    proxy: Option<String>,

    /// TLS certificate file (PEM); requires --tls-key
    #[arg(long, requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// TLS private key file (PEM); requires --tls-cert
    #[arg(long, requires = "tls_cert")]
    tls_key: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();

    let mut options = match &cli.config {
        Some(path) => load_options(path)?,
        None => ServerOptions::default(),
    };
    apply_flags(&mut options, &cli);

    let server = StaticServer::new(options)?;

    tracing::info!(
        root = %server.config().root.display(),
        cache_secs = server.config().cache_secs,
        cors = server.config().cors.is_some(),
        proxy = ?server.config().proxy,
        "configuration resolved"
    );

    let addr = SocketAddr::from((cli.address, cli.port));
    server.listen(addr).await?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// CLI flags override file-loaded options; absent flags leave them alone.
fn apply_flags(options: &mut ServerOptions, cli: &Cli) {
    if cli.root.is_some() {
        options.root = cli.root.clone();
    }
    if let Some(cache) = cli.cache {
        options.cache = Some(CacheSetting::Seconds(cache));
    }
    if cli.show_dir {
        options.show_dir = true;
    }
    if cli.auto_index {
        options.auto_index = true;
    }
    if cli.dotfiles {
        options.show_dotfiles = true;
    }
    if cli.gzip {
        options.gzip = true;
    }
    if let Some(ext) = &cli.ext {
        options.ext = Some(ExtSetting::Extension(ext.clone()));
    }
    if cli.content_type.is_some() {
        options.content_type = cli.content_type.clone();
    }
    if cli.cors {
        options.cors = true;
    }
    if cli.cors_headers.is_some() {
        options.cors_headers = cli.cors_headers.clone();
    }
    if let Some(text) = &cli.robots_txt {
        options.robots = Some(RobotsSetting::Text(text.clone()));
    } else if cli.robots {
        options.robots = Some(RobotsSetting::Enabled(true));
    }
    if let Some(rule) = &cli.rewrite {
        if let [pattern, replacement] = rule.as_slice() {
            options.rewrite = Some((pattern.clone(), replacement.clone()));
        }
    }
    if cli.proxy.is_some() {
        options.proxy = cli.proxy.clone();
    }
    if let (Some(cert), Some(key)) = (&cli.tls_cert, &cli.tls_key) {
        options.https = Some(TlsSettings {
            cert_path: cert.clone(),
            key_path: key.clone(),
        });
    }
}

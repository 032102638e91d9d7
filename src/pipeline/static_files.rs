//! Static-file stage.
//!
//! # Responsibilities
//! - Delegate filesystem resolution to tower-http's `ServeDir`
//! - Filter dot-prefixed path components unless dotfiles are enabled
//! - Probe `<path>.<ext>` for extensionless requests when a default
//!   extension is configured
//! - Apply the resolved cache and fallback content-type headers
//!
//! # Design Decisions
//! - ServeDir owns index resolution, range requests, ETags and
//!   precompressed-gzip negotiation; this stage only configures it
//! - With a proxy configured the stage never finalizes a miss: 404 (and
//!   405 for non-GET methods) falls through to the proxy stage instead

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, request::Parts, HeaderValue, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::{fs::ServeFileSystemResponseBody, ServeDir};

use crate::config::ServerConfig;
use crate::pipeline::{Stage, StageOutcome};

pub struct StaticStage {
    serve: ServeDir,
    cache_secs: u64,
    content_type: String,
    default_ext: Option<String>,
    show_dotfiles: bool,
    defer_miss: bool,
}

impl StaticStage {
    pub fn new(config: &ServerConfig) -> Self {
        let mut serve = ServeDir::new(&config.root)
            .append_index_html_on_directories(config.show_dir || config.auto_index);
        if config.gzip {
            serve = serve.precompressed_gzip();
        }
        Self {
            serve,
            cache_secs: config.cache_secs,
            content_type: config.content_type.clone(),
            default_ext: config.default_ext.clone(),
            show_dotfiles: config.show_dotfiles,
            defer_miss: config.proxy.is_some(),
        }
    }

    async fn lookup(&self, parts: &Parts, uri: Uri) -> Response<ServeFileSystemResponseBody> {
        let mut sub = Request::new(Body::empty());
        *sub.method_mut() = parts.method.clone();
        *sub.uri_mut() = uri;
        *sub.version_mut() = parts.version;
        for (name, value) in &parts.headers {
            sub.headers_mut().append(name.clone(), value.clone());
        }

        match self.serve.clone().oneshot(sub).await {
            Ok(response) => response,
            Err(infallible) => match infallible {},
        }
    }

    fn decorate(&self, response: Response<ServeFileSystemResponseBody>) -> Response {
        let mut response = response.map(Body::new);
        if response.status().is_success() {
            if let Ok(value) = HeaderValue::from_str(&format!("max-age={}", self.cache_secs)) {
                response
                    .headers_mut()
                    .entry(header::CACHE_CONTROL)
                    .or_insert(value);
            }
            if let Ok(value) = HeaderValue::from_str(&self.content_type) {
                response
                    .headers_mut()
                    .entry(header::CONTENT_TYPE)
                    .or_insert(value);
            }
        }
        response
    }

    fn miss(&self, parts: Parts, body: Body) -> StageOutcome {
        if self.defer_miss {
            StageOutcome::Continue(Request::from_parts(parts, body))
        } else {
            StageOutcome::Done(StatusCode::NOT_FOUND.into_response())
        }
    }
}

#[async_trait]
impl Stage for StaticStage {
    async fn handle(&self, req: Request<Body>) -> StageOutcome {
        let (parts, body) = req.into_parts();

        if !self.show_dotfiles && has_hidden_component(parts.uri.path()) {
            return self.miss(parts, body);
        }

        let mut response = self.lookup(&parts, parts.uri.clone()).await;

        if response.status() == StatusCode::NOT_FOUND {
            if let Some(ext) = &self.default_ext {
                if let Some(alt) = with_default_ext(&parts.uri, ext) {
                    let retry = self.lookup(&parts, alt).await;
                    if retry.status() != StatusCode::NOT_FOUND {
                        response = retry;
                    }
                }
            }
        }

        if self.defer_miss
            && matches!(
                response.status(),
                StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED
            )
        {
            return StageOutcome::Continue(Request::from_parts(parts, body));
        }

        StageOutcome::Done(self.decorate(response))
    }
}

fn has_hidden_component(path: &str) -> bool {
    path.split('/')
        .any(|segment| segment.starts_with('.') && !matches!(segment, "." | ".."))
}

/// Request target with the default extension appended, or None when the
/// last segment already carries an extension (or is a directory).
fn with_default_ext(uri: &Uri, ext: &str) -> Option<Uri> {
    let path = uri.path();
    let last = path.rsplit('/').next().unwrap_or("");
    if last.is_empty() || last.contains('.') {
        return None;
    }
    let target = match uri.query() {
        Some(query) => format!("{}.{}?{}", path, ext, query),
        None => format!("{}.{}", path, ext),
    };
    target.parse().ok()
}

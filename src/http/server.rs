//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Resolve options and assemble the pipeline exactly once, at startup
//! - Build the axum Router whose fallback handler runs the pipeline
//! - Merge configured headers into every response
//! - Bind the listener (plaintext or TLS) and expose listen/close

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    response::Response,
    Router,
};
use axum_server::Handle;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::config::{ConfigError, ServerConfig, ServerOptions};
use crate::http::tls::load_tls_config;
use crate::pipeline::{assemble, run_pipeline, Stage};

/// Application state injected into the fallback handler.
#[derive(Clone)]
struct PipelineState {
    stages: Arc<Vec<Arc<dyn Stage>>>,
    config: Arc<ServerConfig>,
}

/// Static file server with an optional proxy fallback.
///
/// Configuration and the stage sequence are immutable once constructed;
/// they live for the process lifetime and are shared across requests.
pub struct StaticServer {
    config: Arc<ServerConfig>,
    router: Router,
    handle: Handle,
}

impl StaticServer {
    /// Resolve options, assemble the pipeline and build the router.
    pub fn new(options: ServerOptions) -> Result<Self, ConfigError> {
        let config = Arc::new(ServerConfig::resolve(options)?);
        let stages = Arc::new(assemble(&config));
        let router = Self::build_router(
            &config,
            PipelineState {
                stages,
                config: config.clone(),
            },
        );
        Ok(Self {
            config,
            router,
            handle: Handle::new(),
        })
    }

    fn build_router(config: &ServerConfig, state: PipelineState) -> Router {
        let mut router = Router::new()
            .fallback(pipeline_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        // Configured headers apply to every response; a header a stage
        // already set wins.
        for (name, value) in &config.headers {
            match (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
                (Ok(name), Ok(value)) => {
                    router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
                }
                _ => {
                    tracing::warn!(name = %name, "skipping invalid configured header");
                }
            }
        }
        router
    }

    /// Begin accepting connections on `addr`. Returns when the server
    /// stops, either via [`close`](Self::close) or a transport error.
    pub async fn listen(&self, addr: SocketAddr) -> std::io::Result<()> {
        let app = self.router.clone().into_make_service();

        match &self.config.tls {
            Some(tls) => {
                tracing::info!(address = %addr, "HTTPS server starting");
                let rustls = load_tls_config(&tls.cert_path, &tls.key_path).await?;
                axum_server::bind_rustls(addr, rustls)
                    .handle(self.handle.clone())
                    .serve(app)
                    .await
            }
            None => {
                tracing::info!(address = %addr, "HTTP server starting");
                axum_server::bind(addr)
                    .handle(self.handle.clone())
                    .serve(app)
                    .await
            }
        }
    }

    /// Address the server is bound to. Resolves once the listener is
    /// accepting connections; `None` if the server stopped first.
    pub async fn listening(&self) -> Option<SocketAddr> {
        self.handle.listening().await
    }

    /// Stop accepting connections and release the listening socket.
    pub fn close(&self) {
        tracing::info!("server shutting down");
        self.handle.shutdown();
    }

    /// The router, for exercising the pipeline without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The resolved configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

async fn pipeline_handler(State(state): State<PipelineState>, req: Request<Body>) -> Response {
    run_pipeline(&state.stages, &state.config, req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RobotsSetting;
    use axum::http::{header, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_router_serves_robots_with_configured_headers() {
        let options = ServerOptions {
            robots: Some(RobotsSetting::Enabled(true)),
            cors: true,
            ..Default::default()
        };
        let server = StaticServer::new(options).unwrap();

        let req = Request::builder()
            .uri("/robots.txt")
            .body(Body::empty())
            .unwrap();
        let response = server.router().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/plain")
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"User-agent: *\nDisallow: /");
    }

    #[tokio::test]
    async fn test_router_404_without_matching_file() {
        let dir = tempfile::tempdir().unwrap();
        let options = ServerOptions {
            root: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let server = StaticServer::new(options).unwrap();

        let req = Request::builder()
            .uri("/missing.html")
            .body(Body::empty())
            .unwrap();
        let response = server.router().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

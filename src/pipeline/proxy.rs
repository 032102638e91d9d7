//! Proxy fallback stage.
//!
//! # Responsibilities
//! - Restore the pre-rewrite target recorded by the rewrite stage
//! - Forward the request to the configured upstream with the Host header
//!   rewritten to the target (change-origin)
//! - Contain forwarding failures: log them and answer 502, never
//!   propagate them out of the pipeline
//!
//! # Design Decisions
//! - Single static upstream; no load balancing, health checks or retries
//! - Forwarding reuses the hyper-util legacy client and its connection
//!   pool across requests

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header,
        uri::{PathAndQuery, Scheme},
        HeaderValue, Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::ServerConfig;
use crate::observability::logging::{LogHook, RequestSummary, ResponseSummary};
use crate::pipeline::{OriginalPath, Stage, StageOutcome};

pub struct ProxyStage {
    client: Client<HttpConnector, Body>,
    target: Uri,
    log_fn: Option<Arc<dyn LogHook>>,
}

impl ProxyStage {
    pub fn new(config: &ServerConfig, target: Uri) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            target,
            log_fn: config.log_fn.clone(),
        }
    }

    /// Upstream URI for a given request target: scheme and authority from
    /// the configured target, path and query from the request.
    fn forward_uri(&self, target_path: &str) -> Option<Uri> {
        let mut parts = axum::http::uri::Parts::default();
        parts.scheme = self.target.scheme().cloned().or(Some(Scheme::HTTP));
        parts.authority = self.target.authority().cloned();
        parts.path_and_query = Some(
            target_path
                .parse::<PathAndQuery>()
                .unwrap_or_else(|_| PathAndQuery::from_static("/")),
        );
        Uri::from_parts(parts).ok()
    }

    fn failure(&self, summary: &RequestSummary, error: &str) -> StageOutcome {
        tracing::error!(
            target = %self.target,
            path = %summary.path,
            error = %error,
            "proxy forwarding failed"
        );
        if let Some(hook) = &self.log_fn {
            let response = ResponseSummary {
                status: StatusCode::BAD_GATEWAY,
            };
            hook.log(summary, Some(&response), Some(error));
        }
        StageOutcome::Done(
            (StatusCode::BAD_GATEWAY, "upstream request failed").into_response(),
        )
    }
}

#[async_trait]
impl Stage for ProxyStage {
    async fn handle(&self, mut req: Request<Body>) -> StageOutcome {
        let summary = RequestSummary::of(&req);

        // Proxy against the pre-rewrite target when one was recorded.
        let target_path = req
            .extensions()
            .get::<OriginalPath>()
            .map(|original| original.0.clone())
            .or_else(|| {
                req.uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
            })
            .unwrap_or_else(|| "/".to_string());

        let Some(uri) = self.forward_uri(&target_path) else {
            return self.failure(&summary, "proxy target has no usable authority");
        };

        // Change-origin: upstream sees its own host, not ours.
        if let Some(authority) = self.target.authority() {
            if let Ok(host) = HeaderValue::from_str(authority.as_str()) {
                req.headers_mut().insert(header::HOST, host);
            }
        }
        *req.uri_mut() = uri;

        match self.client.request(req).await {
            Ok(response) => StageOutcome::Done(into_pipeline_response(response)),
            Err(err) => self.failure(&summary, &err.to_string()),
        }
    }
}

/// Rewrap the upstream body stream so the response can flow back out
/// through the pipeline unbuffered.
fn into_pipeline_response(response: axum::http::Response<Incoming>) -> Response {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerOptions;

    fn stage(target: &str) -> ProxyStage {
        let config = ServerConfig::resolve(ServerOptions {
            proxy: Some(target.into()),
            ..Default::default()
        })
        .unwrap();
        let target = config.proxy.clone().unwrap();
        ProxyStage::new(&config, target)
    }

    #[test]
    fn test_forward_uri_combines_target_and_path() {
        let stage = stage("http://127.0.0.1:9000");
        let uri = stage.forward_uri("/api/items?page=2").unwrap();
        assert_eq!(uri.to_string(), "http://127.0.0.1:9000/api/items?page=2");
    }

    #[test]
    fn test_forward_uri_defaults_scheme() {
        let stage = stage("127.0.0.1:9000");
        let uri = stage.forward_uri("/x").unwrap();
        assert_eq!(uri.scheme_str(), Some("http"));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_finalizes_502() {
        // Port 1 is never listening.
        let stage = stage("http://127.0.0.1:1");
        let req = Request::builder().uri("/x").body(Body::empty()).unwrap();

        let StageOutcome::Done(response) = stage.handle(req).await else {
            panic!("proxy failure must finalize");
        };
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_upstream_failure_reports_status_through_hook() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let config = ServerConfig::resolve(ServerOptions {
            proxy: Some("http://127.0.0.1:1".into()),
            log_fn: Some(Arc::new(
                move |req: &RequestSummary,
                      res: Option<&ResponseSummary>,
                      err: Option<&str>| {
                    assert_eq!(req.path, "/x");
                    assert_eq!(res.map(|r| r.status), Some(StatusCode::BAD_GATEWAY));
                    assert!(err.is_some());
                    counter.fetch_add(1, Ordering::SeqCst);
                },
            )),
            ..Default::default()
        })
        .unwrap();
        let target = config.proxy.clone().unwrap();
        let stage = ProxyStage::new(&config, target);

        let req = Request::builder().uri("/x").body(Body::empty()).unwrap();
        let StageOutcome::Done(response) = stage.handle(req).await else {
            panic!("proxy failure must finalize");
        };
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

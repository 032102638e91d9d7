//! Logging stage. Always present, never finalizes.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, http::Request};

use crate::config::ServerConfig;
use crate::observability::logging::RequestSummary;
use crate::pipeline::{Stage, StageOutcome};

pub struct LogStage {
    config: Arc<ServerConfig>,
}

impl LogStage {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Stage for LogStage {
    async fn handle(&self, req: Request<Body>) -> StageOutcome {
        tracing::debug!(
            method = %req.method(),
            path = %req.uri().path(),
            "request received"
        );
        if let Some(hook) = &self.config.log_fn {
            // No response exists yet; hooks get the request side only.
            hook.log(&RequestSummary::of(&req), None, None);
        }
        StageOutcome::Continue(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerOptions;
    use crate::observability::logging::ResponseSummary;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_log_stage_invokes_hook_and_continues() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let options = ServerOptions {
            log_fn: Some(Arc::new(
                move |req: &RequestSummary,
                      res: Option<&ResponseSummary>,
                      err: Option<&str>| {
                    assert_eq!(req.path, "/a");
                    assert!(res.is_none());
                    assert!(err.is_none());
                    counter.fetch_add(1, Ordering::SeqCst);
                },
            )),
            ..Default::default()
        };
        let config = Arc::new(ServerConfig::resolve(options).unwrap());
        let stage = LogStage::new(config);

        let req = Request::builder().uri("/a").body(Body::empty()).unwrap();
        assert!(matches!(stage.handle(req).await, StageOutcome::Continue(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

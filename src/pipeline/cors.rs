//! CORS preflight stage.
//!
//! Present only when CORS is enabled. Answers preflight requests (OPTIONS
//! carrying `Access-Control-Request-Method`) with the resolved allow-header
//! set and short-circuits; all other requests continue. Plain CORS response
//! headers (`Access-Control-Allow-Origin`/`-Headers`) ride the configured
//! header set applied to every response, so this stage only has to own the
//! preflight exchange.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::IntoResponse,
};

use crate::config::CorsPolicy;
use crate::pipeline::{Stage, StageOutcome};

const ALLOW_METHODS: &str = "GET, HEAD, POST, PUT, DELETE, OPTIONS";

pub struct CorsStage {
    allow_headers: String,
}

impl CorsStage {
    pub fn new(policy: CorsPolicy) -> Self {
        Self {
            allow_headers: policy.allow_headers.join(", "),
        }
    }
}

#[async_trait]
impl Stage for CorsStage {
    async fn handle(&self, req: Request<Body>) -> StageOutcome {
        let preflight = req.method() == Method::OPTIONS
            && req
                .headers()
                .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);
        if !preflight {
            return StageOutcome::Continue(req);
        }

        StageOutcome::Done(
            (
                StatusCode::NO_CONTENT,
                [
                    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
                    (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS.to_string()),
                    (
                        header::ACCESS_CONTROL_ALLOW_HEADERS,
                        self.allow_headers.clone(),
                    ),
                ],
            )
                .into_response(),
        )
    }
}

//! robots.txt stage.
//!
//! Present only when a robots policy is configured. Requests for exactly
//! `/robots.txt` are finalized with the policy text as plain text; every
//! other request continues.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::IntoResponse,
};

use crate::config::RobotsPolicy;
use crate::pipeline::{Stage, StageOutcome};

const DISALLOW_ALL: &str = "User-agent: *\nDisallow: /";

pub struct RobotsStage {
    policy: RobotsPolicy,
}

impl RobotsStage {
    pub fn new(policy: RobotsPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Stage for RobotsStage {
    async fn handle(&self, req: Request<Body>) -> StageOutcome {
        if req.uri().path() != "/robots.txt" {
            return StageOutcome::Continue(req);
        }

        let body = match &self.policy {
            RobotsPolicy::DisallowAll => DISALLOW_ALL.to_string(),
            RobotsPolicy::Custom(text) => text.clone(),
        };
        StageOutcome::Done(
            ([(header::CONTENT_TYPE, "text/plain")], body).into_response(),
        )
    }
}

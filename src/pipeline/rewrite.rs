//! URL rewrite stage.
//!
//! Tests the request target (path plus query) against the configured
//! pattern. On a match the original target is recorded as a request
//! extension for the proxy stage and the target is replaced with the
//! substituted value. Continues regardless of match; rewriting never
//! finalizes.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Uri},
};

use crate::config::RewriteRule;
use crate::pipeline::{OriginalPath, Stage, StageOutcome};

pub struct RewriteStage {
    rule: RewriteRule,
}

impl RewriteStage {
    pub fn new(rule: RewriteRule) -> Self {
        Self { rule }
    }
}

#[async_trait]
impl Stage for RewriteStage {
    async fn handle(&self, mut req: Request<Body>) -> StageOutcome {
        let target = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());

        if self.rule.pattern.is_match(&target) {
            // First-occurrence replacement, like the non-global regex
            // replace this rule syntax descends from.
            let rewritten = self
                .rule
                .pattern
                .replace(&target, self.rule.replacement.as_str())
                .into_owned();

            match rewritten.parse::<Uri>() {
                Ok(uri) => {
                    tracing::debug!(from = %target, to = %rewritten, "rewrote request target");
                    req.extensions_mut().insert(OriginalPath(target));
                    *req.uri_mut() = uri;
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        rewritten = %rewritten,
                        "rewrite produced an invalid target, leaving request unchanged"
                    );
                }
            }
        }

        StageOutcome::Continue(req)
    }
}

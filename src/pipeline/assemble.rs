//! Pipeline assembly.
//!
//! Builds the ordered stage sequence from a resolved config. The order is
//! a fixed contract: caller-supplied stages first, then log, rewrite,
//! CORS, robots, static files, proxy. Optional stages are simply absent
//! when their feature is not configured.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::pipeline::{
    cors::CorsStage, log::LogStage, proxy::ProxyStage, rewrite::RewriteStage,
    robots::RobotsStage, static_files::StaticStage, Stage,
};

pub fn assemble(config: &Arc<ServerConfig>) -> Vec<Arc<dyn Stage>> {
    let mut stages: Vec<Arc<dyn Stage>> = config.before.clone();

    stages.push(Arc::new(LogStage::new(config.clone())));
    if let Some(rule) = &config.rewrite {
        stages.push(Arc::new(RewriteStage::new(rule.clone())));
    }
    if let Some(policy) = &config.cors {
        stages.push(Arc::new(CorsStage::new(policy.clone())));
    }
    if let Some(policy) = &config.robots {
        stages.push(Arc::new(RobotsStage::new(policy.clone())));
    }
    stages.push(Arc::new(StaticStage::new(config)));
    if let Some(target) = &config.proxy {
        stages.push(Arc::new(ProxyStage::new(config, target.clone())));
    }

    stages
}

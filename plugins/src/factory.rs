use std::sync::Arc;

use anyhow::{bail, Result};

use pdes_core::config::ConcurrencyConfig;
use pdes_core::montecarlo::{ConcurrencyStrategyPlugin, OutputRendererPlugin};

use crate::batch::{
    AdaptiveConcurrencyPlugin, FixedConcurrencyPlugin, JsonlRendererPlugin, TextRendererPlugin,
};

pub fn build_renderer(format: &str, ascii_only: bool) -> Result<Arc<dyn OutputRendererPlugin>> {
    match format {
        "text" => Ok(Arc::new(TextRendererPlugin::new(ascii_only))),
        "jsonl" => Ok(Arc::new(JsonlRendererPlugin::new(false))),
        other => bail!("unknown output format '{other}' (expected text or jsonl)"),
    }
}

/// An explicit `max_parallel` pins the pool size and bypasses the configured strategy.
pub fn build_concurrency_strategy(
    cfg: &ConcurrencyConfig,
    max_parallel: Option<usize>,
) -> Result<Arc<dyn ConcurrencyStrategyPlugin>> {
    if let Some(n) = max_parallel.filter(|n| *n > 0) {
        return Ok(Arc::new(FixedConcurrencyPlugin::new(n)));
    }
    match cfg.strategy.as_str() {
        "fixed" => Ok(Arc::new(FixedConcurrencyPlugin::new(cfg.base_concurrency))),
        "adaptive" => Ok(Arc::new(AdaptiveConcurrencyPlugin::new(cfg.clone()))),
        other => bail!("unknown concurrency strategy '{other}' (expected fixed or adaptive)"),
    }
}

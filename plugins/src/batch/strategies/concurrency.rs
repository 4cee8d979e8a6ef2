use pdes_core::config::ConcurrencyConfig;
use pdes_core::montecarlo::{ConcurrencyContext, ConcurrencyStrategyPlugin};

/// Halves the pool under CPU pressure, doubles it when the machine is idle.
pub struct AdaptiveConcurrencyPlugin {
    config: ConcurrencyConfig,
}

pub struct FixedConcurrencyPlugin {
    /// 0 keeps the driver's base size.
    fixed: usize,
}

impl AdaptiveConcurrencyPlugin {
    pub fn new(config: ConcurrencyConfig) -> Self {
        Self { config }
    }
}

impl FixedConcurrencyPlugin {
    pub fn new(fixed: usize) -> Self {
        Self { fixed }
    }
}

impl ConcurrencyStrategyPlugin for AdaptiveConcurrencyPlugin {
    fn name(&self) -> &str {
        "adaptive"
    }

    fn calculate_concurrency(&self, context: &ConcurrencyContext) -> usize {
        let mut desired = if self.config.base_concurrency > 0 {
            self.config.base_concurrency
        } else {
            context.base_concurrency
        };

        if context.cpu_usage >= self.config.cpu_threshold_high {
            desired = desired.saturating_div(2).max(self.config.min_concurrency);
        } else if context.cpu_usage <= self.config.cpu_threshold_low {
            desired = desired.saturating_mul(2).min(self.config.max_concurrency);
        }

        let min = self.config.min_concurrency.max(1);
        desired = desired.clamp(min, self.config.max_concurrency.max(min));
        desired.clamp(1, context.available_cpus.max(1))
    }
}

impl ConcurrencyStrategyPlugin for FixedConcurrencyPlugin {
    fn name(&self) -> &str {
        "fixed"
    }

    fn calculate_concurrency(&self, context: &ConcurrencyContext) -> usize {
        if self.fixed == 0 {
            context.base_concurrency.max(1)
        } else {
            self.fixed
        }
    }
}

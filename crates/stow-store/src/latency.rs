use std::f64::consts::PI;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::debug;

use crate::config::LatencyConfig;

/// Injects believable operation cost into the in-memory backend.
///
/// A per-request latency is drawn from a normal distribution centred
/// between the configured bounds (three standard deviations to either
/// side) and clamped to them. The time needed to move the payload at the
/// configured throughput is added on top. If the operation already took
/// longer than that budget, no extra delay is added.
///
/// Callers must release every lock on store state before awaiting
/// [`LatencyModel::settle`].
#[derive(Clone, Debug)]
pub struct LatencyModel {
    config: LatencyConfig,
}

impl LatencyModel {
    pub fn new(config: LatencyConfig) -> Self {
        Self { config }
    }

    pub fn disabled() -> Self {
        Self::new(LatencyConfig::disabled())
    }

    pub fn config(&self) -> &LatencyConfig {
        &self.config
    }

    /// Total simulated cost of one request moving `bytes`, or `None` when
    /// the model is disabled.
    pub fn budget(&self, bytes: u64) -> Option<Duration> {
        if !self.config.enabled {
            return None;
        }
        let transfer = bytes as f64 / self.config.bytes_per_second.max(1) as f64;
        Some(self.sample_request() + Duration::from_secs_f64(transfer))
    }

    /// Sleep for whatever part of the budget `started` has not used yet.
    pub async fn settle(&self, started: Instant, bytes: u64) {
        let Some(budget) = self.budget(bytes) else {
            return;
        };
        let elapsed = started.elapsed();
        match budget.checked_sub(elapsed) {
            Some(remaining) if !remaining.is_zero() => tokio::time::sleep(remaining).await,
            _ => debug!(?budget, ?elapsed, "operation exceeded simulated latency, no delay added"),
        }
    }

    fn sample_request(&self) -> Duration {
        let min = self.config.min_latency.as_secs_f64();
        let max = self.config.max_latency.as_secs_f64();
        let mean = (min + max) / 2.0;
        let std_dev = (max - min) / 6.0;

        // Box-Muller; `u1` is kept in (0, 1] so the logarithm stays finite.
        let mut rng = rand::thread_rng();
        let u1 = 1.0 - rng.gen::<f64>();
        let u2 = rng.gen::<f64>();
        let standard = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();

        let sample = (mean + standard * std_dev).max(min).min(max);
        Duration::from_secs_f64(sample)
    }
}

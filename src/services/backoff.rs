// src/services/backoff.rs
use rand::Rng;
use std::time::Duration;

/// Exponential backoff with jitter for the retry loop.
///
/// `delay(n) = clamp(base * 2^n + jitter, base, max)` where jitter is
/// uniform in `[0, 0.5 * base * 2^n)`. The jitter desynchronizes
/// concurrent plugin instances retrying against the same endpoint, so
/// the returned delay is a bounded range, never an exact value.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
}

impl BackoffPolicy {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base: Duration::from_millis(base_ms.max(1)),
            max: Duration::from_millis(max_ms.max(base_ms.max(1))),
        }
    }

    /// Delay to wait before attempt `n + 1`. Always at least `base`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self.base.as_millis() as f64 * 2f64.powi(attempt as i32);
        let jitter = rand::thread_rng().gen_range(0.0..0.5) * exp;
        let millis = (exp + jitter)
            .max(self.base.as_millis() as f64)
            .min(self.max.as_millis() as f64);
        Duration::from_millis(millis as u64)
    }
}

//! Delay schedule between retry attempts.

use std::time::Duration;

use rand::Rng;

/// Capped exponential backoff with up to 10% jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    pub fn from_millis(base_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(base_ms), Duration::from_millis(max_ms))
    }

    /// Delay to wait after `failed_attempt` (1-based) before the next one.
    ///
    /// Doubles from `base` per failed attempt and stops growing at `max`.
    pub fn delay(&self, failed_attempt: u32) -> Duration {
        if failed_attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 1u32.checked_shl(failed_attempt - 1).unwrap_or(u32::MAX);
        let capped = self.base.saturating_mul(factor).min(self.max);
        capped + jitter(capped)
    }
}

fn jitter(delay: Duration) -> Duration {
    let range = delay.as_millis() as u64 / 10;
    if range == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..range))
}

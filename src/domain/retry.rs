//! Bounded retry with exponential backoff for upstream calls.

use log::{debug, warn};
use std::thread;
use std::time::Duration;

use crate::domain::error::TraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Backoff before retry number `attempt` (0-based), without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent. Returns the last error on exhaustion.
    pub fn run<T, F>(&self, context: &str, mut operation: F) -> Result<T, TraderError>
    where
        F: FnMut() -> Result<T, TraderError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() || attempt >= attempts => return Err(err),
                Err(err) => {
                    let delay = with_jitter(self.backoff(attempt - 1));
                    warn!(
                        "Attempt {}/{} for {} failed: {}. Retrying in {}ms.",
                        attempt,
                        attempts,
                        context,
                        err,
                        delay.as_millis()
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Spread the delay by +/-25%.
fn with_jitter(delay: Duration) -> Duration {
    let delay_ms = delay.as_millis() as u64;
    if delay_ms == 0 {
        return delay;
    }
    let jitter_range = delay_ms / 4;
    let jitter = fastrand::u64(0..=jitter_range * 2);
    let final_ms = delay_ms.saturating_sub(jitter_range).saturating_add(jitter);
    debug!("backoff {}ms (base {}ms)", final_ms, delay_ms);
    Duration::from_millis(final_ms)
}

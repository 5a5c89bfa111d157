//! Retry policy for NX-API requests.
//!
//! Exponential backoff with a cap and full jitter. Which outcomes are
//! retryable is decided by [`ResultCode::is_retryable`]; this module only
//! answers "how many times" and "how long to wait".

use std::time::Duration;

use rand::Rng;

use crate::nxapi::ResultCode;

/// Jitter applied to a computed backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// Use the exact computed delay.
    None,
    /// Random value in `[0, delay]`.
    Full,
}

/// How many attempts a request gets and how long to wait between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
    pub jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2,
            max_delay: Duration::from_secs(2),
            jitter: Jitter::Full,
        }
    }
}

impl RetryPolicy {
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Un-jittered delay before retry number `retry` (0-indexed):
    /// `base * multiplier^retry`, capped at `max_delay`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(retry);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Delay to sleep before retry number `retry`, jitter applied.
    pub fn delay(&self, retry: u32) -> Duration {
        let ceiling = self.backoff(retry);
        match self.jitter {
            Jitter::None => ceiling,
            Jitter::Full => {
                let millis = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX);
                if millis == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(rand::rng().random_range(0..=millis))
                }
            }
        }
    }

    /// Whether attempt number `attempt` (1-indexed) that ended in `code`
    /// should be followed by another one.
    pub fn should_retry(&self, code: ResultCode, attempt: u32) -> bool {
        attempt < self.max_attempts && code.is_retryable()
    }
}

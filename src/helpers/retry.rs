use std::thread;
use std::time::Duration;
use log::debug;

/// Retries after a rate-limited or timed-out provider call
pub const RATE_LIMIT_RETRIES: usize = 2;
/// Base delay for the exponential backoff
pub const RATE_LIMIT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Retry mechanism with exponential backoff
///
/// Used at the provider-call site for transient failures (HTTP 429,
/// timeouts, network errors). The delay doubles on each attempt:
/// base, base*2, base*4, ... This backoff is a one-off per call and is
/// independent of the steady-state request throttle.
pub struct RetryHandler {
    /// Current attempt number (0-based)
    attempt: usize,
    /// Maximum number of retries before giving up
    max_attempts: usize,
    base_delay: Duration,
}

impl RetryHandler {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            base_delay,
        }
    }

    /// Create a retry handler with the standard settings for rate-limited
    /// provider calls.
    pub fn rate_limit_backoff() -> Self {
        Self::new(RATE_LIMIT_RETRIES, RATE_LIMIT_BASE_DELAY)
    }

    /// Get the current attempt number (0-based)
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    /// Check if we should continue retrying
    pub fn should_retry(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Get the delay for the current attempt
    pub fn delay(&self) -> Duration {
        self.base_delay * 2_u32.saturating_pow(self.attempt as u32)
    }

    /// Wait for the current retry interval
    pub fn wait(&mut self) {
        let delay = self.delay();
        debug!("Retry attempt {}: waiting {:?} before next attempt", self.attempt + 1, delay);
        thread::sleep(delay);
        self.attempt += 1;
    }

    /// Reset the retry counter
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::rate_limit_backoff()
    }
}

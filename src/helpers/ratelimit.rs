/// Request throttling for third-party provider calls
///
/// Enforces, per client key, a rolling per-window request quota and an
/// absolute minimum gap between consecutive requests. `acquire` blocks the
/// calling thread until the request is admissible; waits for one key never
/// delay requests for a different key.
use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use log::debug;

/// Maximum requests allowed per window
pub const DEFAULT_WINDOW_QUOTA: u32 = 10;
/// Rolling quota window
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
/// Minimum gap between consecutive granted requests
pub const DEFAULT_MIN_GAP: Duration = Duration::from_millis(100);

/// Per-key throttle bookkeeping
struct KeyState {
    window_start: Instant,
    count: u32,
    last_request: Option<Instant>,
}

/// Blocking per-key request throttle.
///
/// One instance is shared (via `Arc`) by every component that talks to the
/// same downstream provider.
pub struct RequestThrottle {
    quota: u32,
    window: Duration,
    min_gap: Duration,
    state: Mutex<HashMap<String, KeyState>>,
}

impl RequestThrottle {
    pub fn new(quota: u32, window: Duration, min_gap: Duration) -> Self {
        Self {
            quota,
            window,
            min_gap,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Block until a request for `key` may proceed.
    ///
    /// The window counter resets once the window has fully elapsed since its
    /// start, not on a fixed clock boundary. When the quota is exhausted the
    /// caller sleeps out the remainder of the window; independently, a caller
    /// arriving inside the minimum gap sleeps out the gap remainder. Each
    /// grant records the request time and increments the window counter.
    pub fn acquire(&self, key: &str) {
        loop {
            let wait = {
                let mut states = self.state.lock().unwrap();
                let now = Instant::now();
                let state = states.entry(key.to_string()).or_insert_with(|| KeyState {
                    window_start: now,
                    count: 0,
                    last_request: None,
                });

                if now.duration_since(state.window_start) >= self.window {
                    state.window_start = now;
                    state.count = 0;
                }

                if state.count >= self.quota {
                    self.window
                        .saturating_sub(now.duration_since(state.window_start))
                } else {
                    let gap_wait = state
                        .last_request
                        .map(|last| self.min_gap.saturating_sub(now.duration_since(last)))
                        .unwrap_or(Duration::ZERO);
                    if gap_wait.is_zero() {
                        state.count += 1;
                        state.last_request = Some(now);
                        return;
                    }
                    gap_wait
                }
            };

            // Sleep with the lock released so other keys are not held up
            debug!("Throttling '{}' for {:?}", key, wait);
            thread::sleep(wait);
        }
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_QUOTA, DEFAULT_WINDOW, DEFAULT_MIN_GAP)
    }
}

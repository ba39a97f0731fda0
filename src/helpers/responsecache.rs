/// Short-TTL cache for provider responses
///
/// Protects a specific failure mode: a client polling "current track" every
/// few seconds must not re-issue a live API call on every poll. Fresh hits
/// are served within the TTL; when a fresh fetch would arrive inside the
/// per-key minimum interval, the most recent payload is served even if
/// expired rather than hammering the provider.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use log::debug;
use serde_json::Value;

/// How long a cached payload is considered fresh
pub const DEFAULT_TTL: Duration = Duration::from_secs(45);
/// Minimum time between fresh fetches for the same key
pub const DEFAULT_MIN_FETCH_INTERVAL: Duration = Duration::from_secs(5);
/// How often the background cleanup pass runs
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

struct CacheEntry {
    payload: Value,
    created_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    last_fetch: HashMap<String, Instant>,
}

/// Keyed response cache with serve-stale-under-throttle semantics.
///
/// Writes are last-write-wins; entries older than twice the TTL are purged
/// by `cleanup`.
pub struct ResponseCache {
    ttl: Duration,
    min_fetch_interval: Duration,
    state: Mutex<CacheState>,
}

fn cache_key(client: &str, endpoint: &str) -> String {
    format!("{}::{}", client, endpoint)
}

impl ResponseCache {
    pub fn new(ttl: Duration, min_fetch_interval: Duration) -> Self {
        Self {
            ttl,
            min_fetch_interval,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Return the cached payload for `(client, endpoint)` if it is still
    /// within the TTL.
    pub fn get(&self, client: &str, endpoint: &str) -> Option<Value> {
        let key = cache_key(client, endpoint);
        let state = self.state.lock().unwrap();
        match state.entries.get(&key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => {
                debug!("Cache hit for {}", key);
                Some(entry.payload.clone())
            }
            _ => None,
        }
    }

    /// Store a freshly fetched payload, replacing any previous entry for the
    /// key and recording the fetch time for interval tracking.
    pub fn put(&self, client: &str, endpoint: &str, payload: Value) {
        let key = cache_key(client, endpoint);
        let mut state = self.state.lock().unwrap();
        let now = Instant::now();
        state.entries.insert(
            key.clone(),
            CacheEntry {
                payload,
                created_at: now,
            },
        );
        state.last_fetch.insert(key.clone(), now);
        debug!("Cached response for {}", key);
    }

    /// Decide whether a fresh provider call should be skipped.
    ///
    /// Returns `(true, payload)` on a fresh hit. With no fresh hit, if the
    /// minimum fetch interval for the key has not yet elapsed, returns the
    /// most recent payload even when expired; returning `(true, None)` in
    /// that situation means the call is declined and nothing is available.
    /// `(false, None)` signals that a fresh fetch should proceed.
    pub fn should_skip(&self, client: &str, endpoint: &str) -> (bool, Option<Value>) {
        if let Some(payload) = self.get(client, endpoint) {
            return (true, Some(payload));
        }

        let key = cache_key(client, endpoint);
        let state = self.state.lock().unwrap();
        let throttled = state
            .last_fetch
            .get(&key)
            .map(|last| last.elapsed() < self.min_fetch_interval)
            .unwrap_or(false);
        if throttled {
            debug!("Fetch interval not elapsed for {}, serving stale data", key);
            let stale = state.entries.get(&key).map(|entry| entry.payload.clone());
            return (true, stale);
        }

        (false, None)
    }

    /// Purge entries older than twice the TTL.
    pub fn cleanup(&self) {
        let horizon = self.ttl * 2;
        let mut state = self.state.lock().unwrap();
        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.created_at.elapsed() > horizon)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            state.entries.remove(key);
            state.last_fetch.remove(key);
        }
        if !expired.is_empty() {
            debug!("Cleaned up {} expired cache entries", expired.len());
        }
    }

    /// Run `cleanup` every `interval` on a background thread until
    /// `running` is cleared. `DEFAULT_CLEANUP_INTERVAL` is a reasonable
    /// interval for production use.
    pub fn spawn_cleanup(
        cache: Arc<ResponseCache>,
        running: Arc<AtomicBool>,
        interval: Duration,
    ) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            let check_interval = Duration::from_millis(20).min(interval);
            let mut since_cleanup = Duration::ZERO;
            while running.load(Ordering::SeqCst) {
                thread::sleep(check_interval);
                since_cleanup += check_interval;
                if since_cleanup >= interval {
                    cache.cleanup();
                    since_cleanup = Duration::ZERO;
                }
            }
        })
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MIN_FETCH_INTERVAL)
    }
}

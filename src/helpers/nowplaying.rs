/// Boundary to the authenticated track-polling client
///
/// The playback source (session handling, OAuth, token refresh) lives
/// outside this crate; it is consumed through the `TrackSource` trait.
/// `CachedTrackSource` applies the response-cache protocol so a UI polling
/// "current track" every few seconds never re-issues a live upstream call
/// within the cache TTL or the minimum fetch interval.
use std::sync::Arc;
use log::{debug, warn};

use crate::data::PlayingTrack;
use crate::helpers::responsecache::ResponseCache;

/// Cache endpoint key for current-track polls
const CURRENT_TRACK_ENDPOINT: &str = "currently-playing";

/// A source of currently-playing track information.
pub trait TrackSource: Send + Sync {
    /// Stable identifier for the authenticated user/session, used to scope
    /// cache entries
    fn source_id(&self) -> String;

    /// Fetch the currently playing track. `None` when nothing is playing.
    fn current_track(&self) -> Result<Option<PlayingTrack>, String>;
}

/// Wraps a `TrackSource` with response caching.
pub struct CachedTrackSource<S: TrackSource> {
    source: S,
    cache: Arc<ResponseCache>,
}

impl<S: TrackSource> CachedTrackSource<S> {
    pub fn new(source: S, cache: Arc<ResponseCache>) -> Self {
        Self { source, cache }
    }

    /// Current track, served from cache whenever the cache protocol says a
    /// fresh upstream call should be skipped.
    pub fn current_track(&self) -> Result<Option<PlayingTrack>, String> {
        let client = self.source.source_id();

        let (skip, cached) = self.cache.should_skip(&client, CURRENT_TRACK_ENDPOINT);
        if skip {
            debug!("Serving current track from cache for {}", client);
            let track = cached.and_then(|payload| match serde_json::from_value(payload) {
                Ok(track) => track,
                Err(e) => {
                    warn!("Discarding undecodable cached track: {}", e);
                    None
                }
            });
            return Ok(track);
        }

        let track = self.source.current_track()?;
        match serde_json::to_value(&track) {
            Ok(payload) => self.cache.put(&client, CURRENT_TRACK_ENDPOINT, payload),
            Err(e) => warn!("Failed to serialize track for caching: {}", e),
        }
        Ok(track)
    }
}

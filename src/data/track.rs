/// Source-track descriptions driving catalog matching
use std::fmt;
use serde::{Serialize, Deserialize};

/// The track a user wants lyrics for. Read-only matching input.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TrackQuery {
    pub title: String,

    pub artist: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

impl TrackQuery {
    pub fn new(artist: &str, title: &str) -> Self {
        Self {
            title: title.to_string(),
            artist: artist.to_string(),
            album: None,
        }
    }
}

impl fmt::Display for TrackQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' by '{}'", self.title, self.artist)
    }
}

/// Snapshot of the currently playing track as reported by a playback source.
///
/// The authenticated polling client that produces these lives outside this
/// crate; see `helpers::nowplaying::TrackSource`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayingTrack {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    pub artists: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_ms: Option<u64>,

    pub is_playing: bool,
}

impl From<&PlayingTrack> for TrackQuery {
    fn from(track: &PlayingTrack) -> Self {
        TrackQuery {
            title: track.name.clone(),
            artist: track.artists.first().cloned().unwrap_or_default(),
            album: track.album.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_query_from_playing_track() {
        let playing = PlayingTrack {
            id: Some("abc123".to_string()),
            name: "Yesterday".to_string(),
            artists: vec!["The Beatles".to_string(), "Someone Else".to_string()],
            album: Some("Help!".to_string()),
            duration_ms: Some(125_000),
            progress_ms: Some(10_000),
            is_playing: true,
        };

        let query = TrackQuery::from(&playing);
        assert_eq!(query.title, "Yesterday");
        assert_eq!(query.artist, "The Beatles");
        assert_eq!(query.album.as_deref(), Some("Help!"));
    }

    #[test]
    fn test_track_query_from_playing_track_without_artists() {
        let playing = PlayingTrack {
            name: "Unknown".to_string(),
            ..Default::default()
        };

        let query = TrackQuery::from(&playing);
        assert_eq!(query.artist, "");
    }
}

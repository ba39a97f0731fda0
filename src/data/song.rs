/// Song records returned by the catalog provider
use std::fmt;
use serde::{Serialize, Deserialize};

/// A song as returned by the provider's search endpoint.
///
/// Produced from raw search hits; immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SongRecord {
    /// Provider-assigned numeric song id
    pub id: u64,

    pub title: String,

    /// Name of the primary artist
    pub artist: String,

    /// Canonical song page URL
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics_state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,

    /// Raw provider stats block (pageviews, hot flag, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<serde_json::Value>,
}

impl PartialEq for SongRecord {
    fn eq(&self, other: &Self) -> bool {
        // Two records describe the same song when the provider id matches
        self.id == other.id
    }
}

impl fmt::Display for SongRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.title, self.artist)
    }
}

/// Detailed song information from the song-detail endpoint.
///
/// Carries everything a `SongRecord` does plus the fields only available
/// from a per-song lookup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SongDetails {
    pub id: u64,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_with_featured: Option<String>,

    pub artist: String,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics_state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    /// Crowd-sourced song description, plain text where the provider offers it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<serde_json::Value>,
}

impl fmt::Display for SongDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.title, self.artist)
    }
}

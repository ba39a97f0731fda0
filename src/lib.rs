/// Data model: songs, tracks, annotations
pub mod data;

/// Engine components: throttling, caching, matching, retrieval, alignment
pub mod helpers;

/// Configuration file handling
pub mod config;

// Re-export the core types and operations for easier access
pub use data::{Annotation, LineMatch, PlayingTrack, SongDetails, SongRecord, TrackQuery};
pub use helpers::annotations::align_annotations;
pub use helpers::genius::GeniusClient;
pub use helpers::lyrics::{GeniusLyricsProvider, LyricsRetriever};
pub use helpers::matching::{CatalogSearcher, MatchSelector};
pub use helpers::ratelimit::RequestThrottle;
pub use helpers::responsecache::ResponseCache;

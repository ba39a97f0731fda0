// Data structures for lyricbridge

pub mod annotation;
pub mod song;
pub mod track;

// Re-export types from child modules
pub use annotation::*;
pub use song::*;
pub use track::*;

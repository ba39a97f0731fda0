/// Candidate scoring and best-match selection
///
/// Scores provider candidates against the source track with weighted string
/// similarity and drives the planned search queries with early-exit and
/// best-effort acceptance thresholds.
use std::collections::HashSet;
use log::{debug, info};

use crate::data::{SongRecord, TrackQuery};
use crate::helpers::queryplan::plan_queries;

/// Accept a candidate immediately above this score
pub const EARLY_EXIT_SCORE: f64 = 0.6;
/// Accept the best observed candidate above this score once all queries
/// are exhausted
pub const BEST_EFFORT_FLOOR: f64 = 0.4;
/// Title similarity weight in the combined score
pub const TITLE_WEIGHT: f64 = 0.7;
/// Artist similarity weight in the combined score
pub const ARTIST_WEIGHT: f64 = 0.3;

/// Results requested per search query
const SEARCH_LIMIT: usize = 10;

/// Punctuation stripped before token-overlap scoring
const PUNCTUATION: [char; 10] = [',', '.', '!', '?', '(', ')', '[', ']', '-', '_'];

/// A candidate song with its similarity score against the source track
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub song: SongRecord,
    pub score: f64,
}

/// Catalog search at the provider boundary.
///
/// Search failure is recoverable, not fatal: implementations return an empty
/// list on provider or network errors since the selector tries many queries.
pub trait CatalogSearcher: Send + Sync {
    fn search(&self, query: &str, limit: usize) -> Vec<SongRecord>;
}

fn shares_prefix(w1: &str, w2: &str) -> bool {
    let p1: String = w1.chars().take(3).collect();
    let p2: String = w2.chars().take(3).collect();
    w1.starts_with(&p2) || w2.starts_with(&p1)
}

/// Similarity between two strings in [0, 1].
///
/// Rule precedence is deliberate: exact and substring matches short-circuit
/// before the more expensive token-overlap computation.
/// 1. Equal after case/whitespace normalization: 1.0
/// 2. One a substring of the other: 0.9
/// 3. Jaccard word overlap (punctuation stripped) plus a partial-match bonus
///    for shared 3-character prefixes between longer words, capped at 1.0.
pub fn string_similarity(s1: &str, s2: &str) -> f64 {
    let s1 = s1.to_lowercase();
    let s2 = s2.to_lowercase();
    let s1 = s1.trim();
    let s2 = s2.trim();

    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }

    if s1 == s2 {
        return 1.0;
    }

    if s1.contains(s2) || s2.contains(s1) {
        return 0.9;
    }

    let strip = |s: &str| -> String {
        s.chars()
            .map(|c| if PUNCTUATION.contains(&c) { ' ' } else { c })
            .collect()
    };
    let stripped1 = strip(s1);
    let stripped2 = strip(s2);

    let words1: HashSet<&str> = stripped1.split_whitespace().collect();
    let words2: HashSet<&str> = stripped2.split_whitespace().collect();

    if words1.is_empty() || words2.is_empty() {
        return 0.0;
    }

    let intersection = words1.intersection(&words2).count();
    let union = words1.union(&words2).count();
    let jaccard = intersection as f64 / union as f64;

    // Bonus for partial word matches (e.g. "romantic" matches "romantics")
    let mut partial_matches = 0;
    for w1 in &words1 {
        for w2 in &words2 {
            if w1.chars().count() > 3 && w2.chars().count() > 3 && shares_prefix(w1, w2) {
                partial_matches += 1;
                break;
            }
        }
    }
    let partial_bonus = (partial_matches as f64 * 0.1).min(0.2);

    (jaccard + partial_bonus).min(1.0)
}

/// Weighted similarity score of a catalog candidate against the source
/// track. The title carries more weight than the artist.
pub fn score_candidate(track: &TrackQuery, candidate: &SongRecord) -> f64 {
    let title_score = string_similarity(&track.title, &candidate.title);
    let artist_score = string_similarity(&track.artist, &candidate.artist);
    TITLE_WEIGHT * title_score + ARTIST_WEIGHT * artist_score
}

/// Drives query planning, catalog search, and candidate scoring to find the
/// best catalog match for a track.
pub struct MatchSelector<'a> {
    searcher: &'a dyn CatalogSearcher,
    early_exit_score: f64,
    best_effort_floor: f64,
}

impl<'a> MatchSelector<'a> {
    pub fn new(searcher: &'a dyn CatalogSearcher) -> Self {
        Self {
            searcher,
            early_exit_score: EARLY_EXIT_SCORE,
            best_effort_floor: BEST_EFFORT_FLOOR,
        }
    }

    /// Override the acceptance thresholds. The defaults are empirically
    /// tuned against observed provider data.
    pub fn with_thresholds(
        searcher: &'a dyn CatalogSearcher,
        early_exit_score: f64,
        best_effort_floor: f64,
    ) -> Self {
        Self {
            searcher,
            early_exit_score,
            best_effort_floor,
        }
    }

    /// Find the best catalog match for a track.
    ///
    /// Tries every planned query in order, scoring each returned candidate.
    /// Any candidate above the early-exit score is returned immediately
    /// without evaluating remaining queries. Otherwise the best observed
    /// candidate is returned if it clears the best-effort floor; failure of
    /// an individual query never aborts the loop.
    pub fn find_best_match(&self, track: &TrackQuery) -> Option<SongRecord> {
        if track.title.trim().is_empty() || track.artist.trim().is_empty() {
            return None;
        }

        info!("Searching for match: {}", track);

        let mut best: Option<MatchCandidate> = None;

        for (i, query) in plan_queries(track).iter().enumerate() {
            debug!("Search attempt {}: '{}'", i + 1, query);
            let songs = self.searcher.search(query, SEARCH_LIMIT);
            if songs.is_empty() {
                debug!("No results for query: '{}'", query);
                continue;
            }

            for song in songs {
                let score = score_candidate(track, &song);
                debug!("  Candidate: {} (score: {:.3})", song, score);

                if score > self.early_exit_score {
                    info!(
                        "Found good match: {} (score: {:.3}) using query: '{}'",
                        song, score, query
                    );
                    return Some(song);
                }

                if best.as_ref().map_or(true, |b| score > b.score) {
                    best = Some(MatchCandidate { song, score });
                }
            }
        }

        match best {
            Some(candidate) if candidate.score > self.best_effort_floor => {
                info!(
                    "Using best available match: {} (score: {:.3})",
                    candidate.song, candidate.score
                );
                Some(candidate.song)
            }
            Some(candidate) => {
                info!(
                    "No good match found for {} (best score: {:.3})",
                    track, candidate.score
                );
                None
            }
            None => {
                info!("No candidates found for {}", track);
                None
            }
        }
    }
}

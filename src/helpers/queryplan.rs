/// Search query planning for catalog matching
///
/// Generates an ordered list of candidate search queries from a raw
/// (artist, title) pair. The earliest variants are the most specific so the
/// match selector converges fast on obviously correct matches; later
/// variants progressively loosen the query for stylized or decorated names.
use crate::data::TrackQuery;

/// Title decorations that hurt catalog matching
const TITLE_MARKERS: [&str; 8] = [
    " - Remastered",
    " (Remastered)",
    " - Original Mix",
    " (Original Mix)",
    " (Explicit)",
    " (Clean)",
    " [Explicit]",
    " [Clean]",
];

/// Featured-artist clause markers, checked in this order
const FEAT_MARKERS: [&str; 3] = [" feat.", " ft.", " featuring"];

/// Digit-to-letter substitutions for stylized artist names
/// (d4vd, Tr3vor, P1nk, ...)
const LEET_SUBSTITUTIONS: [(char, char); 6] = [
    ('4', 'a'),
    ('3', 'e'),
    ('1', 'l'),
    ('0', 'o'),
    ('5', 's'),
    ('7', 't'),
];

/// Strip the fixed set of suffix/parenthetical markers from a song title.
pub fn clean_song_title(title: &str) -> String {
    let mut cleaned = title.to_string();
    for marker in TITLE_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned.trim().to_string()
}

/// Strip a trailing "feat./ft./featuring ..." clause from an artist name.
pub fn clean_artist_name(artist: &str) -> String {
    for marker in FEAT_MARKERS {
        if let Some(pos) = artist.find(marker) {
            return artist[..pos].trim().to_string();
        }
    }
    artist.trim().to_string()
}

/// Normalize an artist name for matching against stylized catalog entries.
///
/// Applies the digit substitutions only when the name actually contains a
/// digit (lower-casing it in the process), and expands `&`/`+` to "and".
pub fn normalize_artist_name(artist: &str) -> String {
    let mut normalized = clean_artist_name(artist);

    for (digit, letter) in LEET_SUBSTITUTIONS {
        if normalized.contains(digit) {
            normalized = normalized
                .to_lowercase()
                .replace(digit, &letter.to_string());
        }
    }

    normalized = normalized.replace('&', "and").replace('+', "and");
    normalized.trim().to_string()
}

/// Generate the ordered list of search queries for a track.
pub fn plan_queries(track: &TrackQuery) -> Vec<String> {
    let artist = track.artist.trim();
    let title = track.title.trim();
    let normalized_artist = normalize_artist_name(artist);
    let normalized_title = clean_song_title(title);

    vec![
        format!("{} {}", artist, title),
        format!("{} {}", title, artist),
        format!("{} {}", normalized_artist, normalized_title),
        format!("{} {}", normalized_title, normalized_artist),
        // Sometimes the artist name in the query hurts matching
        title.to_string(),
        normalized_title.clone(),
        format!("\"{}\" {}", title, artist),
        format!("{} - {}", artist, title),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_song_title_strips_markers() {
        assert_eq!(clean_song_title("Yesterday - Remastered"), "Yesterday");
        assert_eq!(clean_song_title("Yesterday (Remastered)"), "Yesterday");
        assert_eq!(clean_song_title("Levels (Original Mix)"), "Levels");
        assert_eq!(clean_song_title("DNA. [Explicit]"), "DNA.");
        assert_eq!(clean_song_title("Plain Title"), "Plain Title");
    }

    #[test]
    fn test_clean_artist_name_strips_featured_clause() {
        assert_eq!(clean_artist_name("Artist feat. Other"), "Artist");
        assert_eq!(clean_artist_name("Artist ft. Other"), "Artist");
        assert_eq!(clean_artist_name("Artist featuring Other"), "Artist");
        assert_eq!(clean_artist_name("Solo Artist"), "Solo Artist");
    }

    #[test]
    fn test_normalize_artist_name_leet_substitutions() {
        assert_eq!(normalize_artist_name("d4vd"), "davd");
        assert_eq!(normalize_artist_name("P1nk"), "plnk");
        assert_eq!(normalize_artist_name("7ime"), "time");
    }

    #[test]
    fn test_normalize_artist_name_without_digits_keeps_case() {
        assert_eq!(normalize_artist_name("The Beatles"), "The Beatles");
    }

    #[test]
    fn test_normalize_artist_name_expands_ampersand() {
        assert_eq!(normalize_artist_name("Simon & Garfunkel"), "Simon and Garfunkel");
        assert_eq!(normalize_artist_name("Her + Him"), "Her and Him");
    }

    #[test]
    fn test_plan_queries_order() {
        let track = TrackQuery::new("The Beatles", "Yesterday - Remastered");
        let queries = plan_queries(&track);

        assert_eq!(queries.len(), 8);
        assert_eq!(queries[0], "The Beatles Yesterday - Remastered");
        assert_eq!(queries[1], "Yesterday - Remastered The Beatles");
        assert_eq!(queries[2], "The Beatles Yesterday");
        assert_eq!(queries[3], "Yesterday The Beatles");
        assert_eq!(queries[4], "Yesterday - Remastered");
        assert_eq!(queries[5], "Yesterday");
        assert_eq!(queries[6], "\"Yesterday - Remastered\" The Beatles");
        assert_eq!(queries[7], "The Beatles - Yesterday - Remastered");
    }
}

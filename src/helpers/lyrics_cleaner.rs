/// Line classification for scraped lyrics pages
///
/// Provider pages interleave metadata, crowd-sourced descriptions, and the
/// actual lyric block with no machine-readable boundary. This conservative
/// state machine treats the first unambiguous content line or bracketed
/// section header as the start of true lyrics and never reconsiders.
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Contributor counts ("184 Contributors")
    static ref CONTRIBUTOR_LINE: Regex = Regex::new(r"(?i)^\d+\s*contributors?\b").unwrap();
    /// Trailing embed furniture ("Embed", "12Embed")
    static ref EMBED_LINE: Regex = Regex::new(r"(?i)^\d*embed$").unwrap();
}

/// Language labels the provider renders in its translations widget
const LANGUAGE_NAMES: [&str; 12] = [
    "english",
    "türkçe",
    "español",
    "português",
    "italiano",
    "deutsch",
    "français",
    "polski",
    "русский",
    "日本語",
    "한국어",
    "nederlands",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CleanerState {
    /// Still in the page preamble, before any lyric content
    BeforeLyrics,
    /// Inside a crowd-sourced song description block
    InDescription,
    /// Inside the lyric block; everything is kept from here on
    InLyrics,
}

fn is_boilerplate(line: &str) -> bool {
    let lowered = line.to_lowercase();
    CONTRIBUTOR_LINE.is_match(line)
        || lowered == "translations"
        || LANGUAGE_NAMES.contains(&lowered.as_str())
        || lowered.ends_with(" lyrics")
        || lowered.contains("read more")
        || EMBED_LINE.is_match(line)
        || lowered == "you might also like"
}

/// Description blocks open with a quoted phrase and the word "describes"
fn is_description_start(line: &str) -> bool {
    let has_quote = line.contains('"') || line.contains('\u{201c}') || line.contains('\u{201d}');
    has_quote && line.to_lowercase().contains("describes")
}

/// Bracketed section header like "[Verse 1]" or "[Chorus]"
fn is_section_header(line: &str) -> bool {
    line.starts_with('[') && line.ends_with(']') && line.len() > 2
}

fn starts_with_digit(line: &str) -> bool {
    line.chars().next().map_or(false, |c| c.is_ascii_digit())
}

/// Strip provider boilerplate from scraped lyrics text.
///
/// Runs the line classifier over the input and returns the lines recognized
/// as lyric content, joined with newlines and trimmed.
pub fn clean_lyrics(raw: &str) -> String {
    let mut state = CleanerState::BeforeLyrics;
    let mut kept: Vec<&str> = Vec::new();

    for raw_line in raw.lines() {
        let line = raw_line.trim();

        match state {
            CleanerState::BeforeLyrics => {
                if line.is_empty() || is_boilerplate(line) {
                    continue;
                }
                if is_description_start(line) {
                    state = CleanerState::InDescription;
                    continue;
                }
                if is_section_header(line) {
                    kept.push(line);
                    state = CleanerState::InLyrics;
                    continue;
                }
                if !starts_with_digit(line) {
                    kept.push(line);
                    state = CleanerState::InLyrics;
                }
            }
            CleanerState::InDescription => {
                if line.to_lowercase().contains("read more") {
                    state = CleanerState::BeforeLyrics;
                } else if is_section_header(line) {
                    kept.push(line);
                    state = CleanerState::InLyrics;
                }
            }
            CleanerState::InLyrics => {
                kept.push(line);
            }
        }
    }

    kept.join("\n").trim().to_string()
}

/// Lyrics retrieval: provider trait, validation, and the page-scrape chain
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;

use crate::helpers::genius::{GeniusClient, GeniusError};
use crate::helpers::lyrics_cleaner::clean_lyrics;
use crate::helpers::queryplan::{clean_artist_name, clean_song_title};

/// Result type for lyrics operations
pub type LyricsResult<T> = Result<T, LyricsError>;

/// Minimum length for text to count as actual lyrics
pub const MIN_LYRICS_LEN: usize = 50;

/// Phrases that mark placeholder content rather than lyrics
const PLACEHOLDER_PHRASES: [&str; 5] = [
    "visit genius.com",
    "go to genius.com",
    "view lyrics on genius",
    "lyrics not available",
    "instrumental",
];

/// Structural marker for lyric blocks on provider song pages
const CONTAINER_MARKER: &str = "data-lyrics-container=\"true\"";

/// Results scanned per search-mediated retrieval query
const SEARCH_LIMIT: usize = 10;

/// Error type for lyrics operations
#[derive(Debug)]
pub enum LyricsError {
    /// No lyrics found; a normal outcome, not a failure
    NotFound,
    /// Network error
    NetworkError(String),
    /// Parsing error
    ParseError(String),
    /// Generic error
    Other(String),
}

impl fmt::Display for LyricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LyricsError::NotFound => write!(f, "Lyrics not found"),
            LyricsError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            LyricsError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            LyricsError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl Error for LyricsError {}

impl From<GeniusError> for LyricsError {
    fn from(error: GeniusError) -> Self {
        match error {
            GeniusError::RateLimited => LyricsError::NetworkError("rate limited".to_string()),
            GeniusError::Network(msg) => LyricsError::NetworkError(msg),
            GeniusError::Parse(msg) => LyricsError::ParseError(msg),
        }
    }
}

/// Trait for retrieving lyrics text from a source
pub trait LyricsProvider: Send + Sync {
    /// Get lyrics by scraping the song page at a known URL
    fn lyrics_by_url(&self, url: &str) -> LyricsResult<String>;

    /// Get lyrics by searching for the song first. An empty artist searches
    /// by title alone.
    fn lyrics_by_search(&self, artist: &str, title: &str) -> LyricsResult<String>;

    /// Get the name/identifier of this lyrics provider
    fn provider_name(&self) -> &'static str;
}

/// Reject placeholder or truncated content, returning the trimmed lyrics
/// when they pass.
pub fn validate_lyrics(text: &str) -> Option<String> {
    let content = text.trim();
    let lowered = content.to_lowercase();

    for phrase in PLACEHOLDER_PHRASES {
        if lowered.contains(phrase) {
            debug!("Detected placeholder lyrics ('{}')", phrase);
            return None;
        }
    }

    if content.chars().count() < MIN_LYRICS_LEN {
        debug!("Lyrics too short ({} chars), likely placeholder", content.chars().count());
        return None;
    }

    Some(content.to_string())
}

/// Retrieves lyrics through an ordered provider chain.
///
/// URL-based retrieval is strictly preferred when a song URL is known: it
/// targets the exact matched song rather than a re-search that could diverge
/// from the already-resolved match. Any provider failure is soft; the chain
/// continues with the next strategy.
pub struct LyricsRetriever {
    providers: Vec<Box<dyn LyricsProvider>>,
}

impl LyricsRetriever {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a provider to the chain
    pub fn add_provider(mut self, provider: Box<dyn LyricsProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Retrieve lyrics for a track, trying the song URL first when given.
    pub fn retrieve(&self, artist: &str, title: &str, song_url: Option<&str>) -> Option<String> {
        if let Some(url) = song_url {
            for provider in &self.providers {
                match provider.lyrics_by_url(url) {
                    Ok(text) => {
                        if let Some(lyrics) = validate_lyrics(&text) {
                            info!(
                                "Retrieved lyrics from {} via URL ({} chars)",
                                provider.provider_name(),
                                lyrics.chars().count()
                            );
                            return Some(lyrics);
                        }
                    }
                    Err(LyricsError::NotFound) => {
                        debug!("{}: no lyrics at {}", provider.provider_name(), url);
                    }
                    Err(e) => {
                        warn!("{}: URL retrieval failed: {}", provider.provider_name(), e);
                    }
                }
            }
        }

        let clean_artist = clean_artist_name(artist);
        let clean_title = clean_song_title(title);
        info!("Searching lyrics for: {} - {}", clean_artist, clean_title);

        for provider in &self.providers {
            match provider.lyrics_by_search(&clean_artist, &clean_title) {
                Ok(text) => {
                    if let Some(lyrics) = validate_lyrics(&text) {
                        info!(
                            "Retrieved lyrics from {} via search ({} chars)",
                            provider.provider_name(),
                            lyrics.chars().count()
                        );
                        return Some(lyrics);
                    }
                }
                Err(LyricsError::NotFound) => {
                    debug!("{}: search found no lyrics", provider.provider_name());
                }
                Err(e) => {
                    warn!("{}: search retrieval failed: {}", provider.provider_name(), e);
                }
            }
        }

        info!("No lyrics found for: {} - {}", clean_artist, clean_title);
        None
    }
}

impl Default for LyricsRetriever {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    static ref BR_TAG: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
}

fn decode_entities(text: &str) -> String {
    text.replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn html_to_text(fragment: &str) -> String {
    let with_breaks = BR_TAG.replace_all(fragment, "\n");
    let stripped = HTML_TAG.replace_all(&with_breaks, "");
    decode_entities(&stripped)
}

/// Extract the text of every lyrics-container block from a song page.
///
/// Containers are block elements carrying the `data-lyrics-container`
/// attribute. Returns None when no container is present: that is a
/// retrieval failure (page layout changed or no lyrics), not an error.
pub fn extract_lyrics_containers(html: &str) -> Option<String> {
    let mut sections = Vec::new();
    let mut cursor = 0;

    while let Some(marker_pos) = html[cursor..].find(CONTAINER_MARKER) {
        let marker_abs = cursor + marker_pos;
        let open_end = match html[marker_abs..].find('>') {
            Some(pos) => marker_abs + pos + 1,
            None => break,
        };

        // Scan for the matching close tag, tracking nested divs
        let mut depth = 1;
        let mut scan = open_end;
        let mut close_start = None;
        while depth > 0 {
            let next_open = html[scan..].find("<div");
            let next_close = html[scan..].find("</div");
            match (next_open, next_close) {
                (Some(open), Some(close)) if open < close => {
                    depth += 1;
                    scan += open + 4;
                }
                (_, Some(close)) => {
                    depth -= 1;
                    if depth == 0 {
                        close_start = Some(scan + close);
                    }
                    scan += close + 5;
                }
                _ => break,
            }
        }

        let end = close_start.unwrap_or(html.len());
        sections.push(html_to_text(&html[open_end..end]));
        if close_start.is_none() {
            break;
        }
        cursor = end;
    }

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n"))
    }
}

/// Lyrics provider that scrapes provider song pages, falling back to a
/// catalog search when no URL is known.
pub struct GeniusLyricsProvider {
    client: Arc<GeniusClient>,
}

impl GeniusLyricsProvider {
    pub fn new(client: Arc<GeniusClient>) -> Self {
        Self { client }
    }
}

impl LyricsProvider for GeniusLyricsProvider {
    fn lyrics_by_url(&self, url: &str) -> LyricsResult<String> {
        let html = self.client.fetch_page(url)?;
        let raw = extract_lyrics_containers(&html).ok_or(LyricsError::NotFound)?;
        let cleaned = clean_lyrics(&raw);
        if cleaned.is_empty() {
            return Err(LyricsError::NotFound);
        }
        Ok(cleaned)
    }

    fn lyrics_by_search(&self, artist: &str, title: &str) -> LyricsResult<String> {
        // Try title+artist first; the artist name in the query sometimes
        // hurts matching, so fall back to the title alone
        let queries = if artist.is_empty() {
            vec![title.to_string()]
        } else {
            vec![format!("{} {}", title, artist), title.to_string()]
        };

        for query in queries {
            let songs = match self.client.search(&query, SEARCH_LIMIT) {
                Ok(songs) => songs,
                Err(e) => {
                    warn!("Lyrics search '{}' failed: {}", query, e);
                    continue;
                }
            };

            let song = match songs.iter().find(|song| !song.url.is_empty()) {
                Some(song) => song,
                None => {
                    debug!("No results with a song page for query '{}'", query);
                    continue;
                }
            };

            match self.lyrics_by_url(&song.url) {
                Ok(text) => return Ok(text),
                Err(LyricsError::NotFound) => continue,
                Err(e) => {
                    warn!("Scraping {} failed: {}", song.url, e);
                    continue;
                }
            }
        }

        Err(LyricsError::NotFound)
    }

    fn provider_name(&self) -> &'static str {
        "genius"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct MockLyricsProvider {
        name: &'static str,
        lyrics: Option<String>,
        url_calls: Arc<Mutex<usize>>,
        search_calls: Arc<Mutex<usize>>,
    }

    impl MockLyricsProvider {
        fn new(name: &'static str, lyrics: Option<&str>) -> Self {
            Self {
                name,
                lyrics: lyrics.map(|s| s.to_string()),
                url_calls: Arc::new(Mutex::new(0)),
                search_calls: Arc::new(Mutex::new(0)),
            }
        }

        fn counters(&self) -> (Arc<Mutex<usize>>, Arc<Mutex<usize>>) {
            (self.url_calls.clone(), self.search_calls.clone())
        }
    }

    impl LyricsProvider for MockLyricsProvider {
        fn lyrics_by_url(&self, _url: &str) -> LyricsResult<String> {
            *self.url_calls.lock().unwrap() += 1;
            self.lyrics.clone().ok_or(LyricsError::NotFound)
        }

        fn lyrics_by_search(&self, _artist: &str, _title: &str) -> LyricsResult<String> {
            *self.search_calls.lock().unwrap() += 1;
            self.lyrics.clone().ok_or(LyricsError::NotFound)
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }

    const REAL_LYRICS: &str = "Yesterday, all my troubles seemed so far away\n\
                               Now it looks as though they're here to stay\n\
                               Oh, I believe in yesterday";

    #[test]
    fn test_validate_lyrics_accepts_real_content() {
        assert_eq!(validate_lyrics(REAL_LYRICS).unwrap(), REAL_LYRICS);
    }

    #[test]
    fn test_validate_lyrics_rejects_placeholders() {
        assert!(validate_lyrics("To read the full lyrics, visit Genius.com today!").is_none());
        assert!(validate_lyrics("This track is an Instrumental").is_none());
        assert!(validate_lyrics("Lyrics not available").is_none());
    }

    #[test]
    fn test_validate_lyrics_rejects_short_content() {
        assert!(validate_lyrics("La la la").is_none());
        assert!(validate_lyrics("").is_none());
    }

    #[test]
    fn test_retriever_prefers_url_over_search() {
        let provider = MockLyricsProvider::new("mock", Some(REAL_LYRICS));
        let (url_calls, search_calls) = provider.counters();

        let retriever = LyricsRetriever::new().add_provider(Box::new(provider));
        let result = retriever.retrieve("The Beatles", "Yesterday", Some("https://genius.com/x"));
        assert_eq!(result.unwrap(), REAL_LYRICS);

        assert_eq!(*url_calls.lock().unwrap(), 1);
        assert_eq!(*search_calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_retriever_falls_back_to_search_without_url() {
        let provider = MockLyricsProvider::new("mock", Some(REAL_LYRICS));
        let retriever = LyricsRetriever::new().add_provider(Box::new(provider));

        let result = retriever.retrieve("The Beatles", "Yesterday", None);
        assert_eq!(result.unwrap(), REAL_LYRICS);
    }

    #[test]
    fn test_retriever_chain_continues_past_failing_provider() {
        let failing = MockLyricsProvider::new("failing", None);
        let working = MockLyricsProvider::new("working", Some(REAL_LYRICS));
        let retriever = LyricsRetriever::new()
            .add_provider(Box::new(failing))
            .add_provider(Box::new(working));

        let result = retriever.retrieve("The Beatles", "Yesterday", None);
        assert_eq!(result.unwrap(), REAL_LYRICS);
    }

    #[test]
    fn test_retriever_rejects_placeholder_from_provider() {
        let provider = MockLyricsProvider::new("mock", Some("Visit genius.com for lyrics"));
        let retriever = LyricsRetriever::new().add_provider(Box::new(provider));

        assert!(retriever.retrieve("The Beatles", "Yesterday", None).is_none());
    }

    #[test]
    fn test_retriever_all_providers_fail() {
        let retriever =
            LyricsRetriever::new().add_provider(Box::new(MockLyricsProvider::new("mock", None)));
        assert!(retriever.retrieve("The Beatles", "Yesterday", None).is_none());
    }

    #[test]
    fn test_extract_lyrics_containers() {
        let html = "<html><body>\
            <div class=\"header\">Some navigation</div>\
            <div data-lyrics-container=\"true\" class=\"Lyrics__Container\">\
            [Verse 1]<br/>Yesterday, all my troubles seemed so far away<br>\
            <a href=\"/x\"><span>Now it looks as though they&#x27;re here to stay</span></a>\
            </div>\
            <div data-lyrics-container=\"true\">[Chorus]<br/>Why she had to go</div>\
            </body></html>";

        let text = extract_lyrics_containers(html).unwrap();
        assert!(text.contains("[Verse 1]"));
        assert!(text.contains("Yesterday, all my troubles seemed so far away"));
        assert!(text.contains("they're here to stay"));
        assert!(text.contains("[Chorus]\nWhy she had to go"));
    }

    #[test]
    fn test_extract_lyrics_containers_with_nested_divs() {
        let html = "<div data-lyrics-container=\"true\">\
            Line one<br/><div class=\"inline-ad\">ignored markup</div>Line two\
            </div><div>after</div>";

        let text = extract_lyrics_containers(html).unwrap();
        assert!(text.contains("Line one"));
        assert!(text.contains("Line two"));
        assert!(!text.contains("after"));
    }

    #[test]
    fn test_extract_lyrics_containers_absent() {
        assert!(extract_lyrics_containers("<html><body>No lyrics here</body></html>").is_none());
    }

    #[test]
    fn test_entity_decoding() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("don&#x27;t"), "don't");
        assert_eq!(decode_entities("&quot;quoted&quot;"), "\"quoted\"");
    }
}

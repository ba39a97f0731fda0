/// Rate-limited client for the Genius lyrics/annotation catalog
///
/// Every API operation goes through the shared request throttle and the
/// response cache, retries transient failures with bounded backoff, and
/// returns plain data. Malformed provider payloads are logged and skipped,
/// never fatal: a single bad record must not abort a multi-query match
/// attempt.
use std::sync::Arc;
use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

use crate::data::{Annotation, SongDetails, SongRecord};
use crate::helpers::http_client::{self, HttpClient, HttpClientError};
use crate::helpers::matching::CatalogSearcher;
use crate::helpers::ratelimit::RequestThrottle;
use crate::helpers::responsecache::ResponseCache;
use crate::helpers::retry::RetryHandler;

const API_ROOT: &str = "https://api.genius.com";
const USER_AGENT: &str = "lyricbridge/0.1";
/// Throttle and cache key for all catalog traffic
const CLIENT_KEY: &str = "genius";
/// Provider-side maximum for search results per page
pub const MAX_SEARCH_RESULTS: usize = 50;
/// Annotations requested per song
pub const ANNOTATIONS_PER_PAGE: usize = 50;
const HTTP_TIMEOUT_SECS: u64 = 10;

/// Error types for catalog operations
#[derive(Debug, Error)]
pub enum GeniusError {
    /// Provider rate limit hit and retries exhausted, or the local fetch
    /// interval declined the call with nothing cached
    #[error("rate limited by catalog provider")]
    RateLimited,

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to parse provider response: {0}")]
    Parse(String),
}

impl From<HttpClientError> for GeniusError {
    fn from(error: HttpClientError) -> Self {
        match error {
            HttpClientError::RateLimited => GeniusError::RateLimited,
            other => GeniusError::Network(other.to_string()),
        }
    }
}

/// Client for the catalog provider's API and song pages.
pub struct GeniusClient {
    access_token: String,
    http: Box<dyn HttpClient>,
    throttle: Arc<RequestThrottle>,
    cache: Arc<ResponseCache>,
}

impl GeniusClient {
    pub fn new(access_token: &str, throttle: Arc<RequestThrottle>, cache: Arc<ResponseCache>) -> Self {
        Self::with_http_client(
            access_token,
            http_client::new_http_client(HTTP_TIMEOUT_SECS),
            throttle,
            cache,
        )
    }

    /// Create a client with a caller-supplied HTTP implementation. Used by
    /// tests to stub out the network.
    pub fn with_http_client(
        access_token: &str,
        http: Box<dyn HttpClient>,
        throttle: Arc<RequestThrottle>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            access_token: access_token.to_string(),
            http,
            throttle,
            cache,
        }
    }

    /// Throttled GET with bounded backoff for transient failures.
    fn get_with_backoff(&self, url: &str, authorized: bool) -> Result<String, GeniusError> {
        let auth = format!("Bearer {}", self.access_token);
        let mut retry = RetryHandler::rate_limit_backoff();

        loop {
            self.throttle.acquire(CLIENT_KEY);

            let headers: Vec<(&str, &str)> = if authorized {
                vec![("Authorization", auth.as_str()), ("User-Agent", USER_AGENT)]
            } else {
                vec![("User-Agent", USER_AGENT)]
            };

            match self.http.get(url, &headers) {
                Ok(body) => return Ok(body),
                Err(error) if error.is_transient() && retry.should_retry() => {
                    warn!(
                        "Request to {} failed ({}), retrying with backoff",
                        url, error
                    );
                    retry.wait();
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Cached, throttled API call returning the parsed JSON payload.
    fn get_json(&self, endpoint: &str) -> Result<Value, GeniusError> {
        let (skip, cached) = self.cache.should_skip(CLIENT_KEY, endpoint);
        if skip {
            return match cached {
                Some(payload) => Ok(payload),
                // The fetch interval declined the call and nothing stale
                // was available
                None => Err(GeniusError::RateLimited),
            };
        }

        let url = format!("{}/{}", API_ROOT, endpoint);
        let body = self.get_with_backoff(&url, true)?;
        let payload: Value =
            serde_json::from_str(&body).map_err(|e| GeniusError::Parse(e.to_string()))?;
        self.cache.put(CLIENT_KEY, endpoint, payload.clone());
        Ok(payload)
    }

    /// Search the catalog for songs matching a query string.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SongRecord>, GeniusError> {
        let per_page = limit.min(MAX_SEARCH_RESULTS);
        let endpoint = format!(
            "search?q={}&per_page={}",
            urlencoding::encode(query),
            per_page
        );

        let payload = self.get_json(&endpoint)?;
        let songs = parse_search_hits(&payload);
        debug!("Found {} songs for query '{}'", songs.len(), query);
        Ok(songs)
    }

    /// Fetch detailed information about a single song.
    pub fn song_details(&self, song_id: u64) -> Result<Option<SongDetails>, GeniusError> {
        let endpoint = format!("songs/{}", song_id);
        let payload = self.get_json(&endpoint)?;

        let song = match payload.get("response").and_then(|r| r.get("song")) {
            Some(song) if !song.is_null() => song,
            _ => return Ok(None),
        };

        Ok(parse_song_details(song))
    }

    /// Fetch the annotations attached to a song, unaligned.
    pub fn annotations(&self, song_id: u64) -> Result<Vec<Annotation>, GeniusError> {
        let endpoint = format!(
            "referents?song_id={}&per_page={}&text_format=html",
            song_id, ANNOTATIONS_PER_PAGE
        );
        let payload = self.get_json(&endpoint)?;

        let referents = payload
            .get("response")
            .and_then(|r| r.get("referents"))
            .and_then(|r| r.as_array());

        let mut annotations = Vec::new();
        if let Some(referents) = referents {
            for referent in referents {
                annotations.extend(parse_referent(referent));
            }
        }
        debug!("Found {} annotations for song {}", annotations.len(), song_id);
        Ok(annotations)
    }

    /// Fetch the raw HTML of a song page for scraping. Throttled but not
    /// cached: pages are large and fetched once per matched song.
    pub fn fetch_page(&self, url: &str) -> Result<String, GeniusError> {
        self.get_with_backoff(url, false)
    }
}

impl CatalogSearcher for GeniusClient {
    fn search(&self, query: &str, limit: usize) -> Vec<SongRecord> {
        match GeniusClient::search(self, query, limit) {
            Ok(songs) => songs,
            Err(error) => {
                warn!("Catalog search for '{}' failed: {}", query, error);
                Vec::new()
            }
        }
    }
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Build a song record from one search result. Returns None when required
/// fields are missing so callers can skip malformed hits.
fn song_from_result(result: &Value) -> Option<SongRecord> {
    Some(SongRecord {
        id: result.get("id")?.as_u64()?,
        title: string_field(result, "title")?,
        artist: result
            .get("primary_artist")
            .and_then(|a| a.get("name"))
            .and_then(|n| n.as_str())?
            .to_string(),
        url: string_field(result, "url").unwrap_or_default(),
        lyrics_state: string_field(result, "lyrics_state"),
        image_url: string_field(result, "song_art_image_url"),
        release_date: string_field(result, "release_date_for_display"),
        stats: result.get("stats").cloned(),
    })
}

fn parse_search_hits(payload: &Value) -> Vec<SongRecord> {
    let hits = payload
        .get("response")
        .and_then(|r| r.get("hits"))
        .and_then(|h| h.as_array());

    let mut songs = Vec::new();
    if let Some(hits) = hits {
        for hit in hits {
            let result = match hit.get("result") {
                Some(result) => result,
                None => continue,
            };

            // Both the old (_type on the result) and new (type on the hit)
            // response formats mark song hits
            let is_song = result.get("_type").and_then(|v| v.as_str()) == Some("song")
                || hit.get("type").and_then(|v| v.as_str()) == Some("song");
            if !is_song {
                continue;
            }

            match song_from_result(result) {
                Some(song) => songs.push(song),
                None => warn!("Skipping malformed search hit"),
            }
        }
    }
    songs
}

fn parse_song_details(song: &Value) -> Option<SongDetails> {
    Some(SongDetails {
        id: song.get("id")?.as_u64()?,
        title: string_field(song, "title")?,
        title_with_featured: string_field(song, "title_with_featured"),
        artist: song
            .get("primary_artist")
            .and_then(|a| a.get("name"))
            .and_then(|n| n.as_str())?
            .to_string(),
        url: string_field(song, "url").unwrap_or_default(),
        lyrics_state: string_field(song, "lyrics_state"),
        image_url: string_field(song, "song_art_image_url"),
        release_date: string_field(song, "release_date_for_display"),
        album: song
            .get("album")
            .and_then(|a| a.get("name"))
            .and_then(|n| n.as_str())
            .map(|s| s.to_string()),
        description: extract_description(song.get("description")),
        stats: song.get("stats").cloned(),
    })
}

/// One referent can carry several annotations; all share its fragment and
/// range content.
fn parse_referent(referent: &Value) -> Vec<Annotation> {
    let fragment = string_field(referent, "fragment");
    let range_content = referent
        .get("range")
        .and_then(|r| r.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string());

    let mut annotations = Vec::new();
    if let Some(entries) = referent.get("annotations").and_then(|a| a.as_array()) {
        for entry in entries {
            let id = match entry.get("id").and_then(|v| v.as_u64()) {
                Some(id) => id,
                None => {
                    warn!("Skipping annotation without id");
                    continue;
                }
            };
            annotations.push(Annotation {
                id,
                body_html: entry
                    .get("body")
                    .and_then(|b| b.get("html"))
                    .and_then(|h| h.as_str())
                    .map(|s| s.to_string()),
                fragment: fragment.clone(),
                range_content: range_content.clone(),
                url: string_field(entry, "url"),
                verified: entry
                    .get("verified")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
                votes_total: entry
                    .get("votes_total")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0),
                ..Default::default()
            });
        }
    }
    annotations
}

/// Extract a song description with format priority plain > html > DOM.
fn extract_description(description: Option<&Value>) -> Option<String> {
    let description = description?;

    if let Some(plain) = description.get("plain").and_then(|v| v.as_str()) {
        let plain = plain.trim();
        if !plain.is_empty() {
            return Some(plain.to_string());
        }
    }

    if let Some(html) = description.get("html").and_then(|v| v.as_str()) {
        let html = html.trim();
        if !html.is_empty() {
            return Some(html.to_string());
        }
    }

    description.get("dom").and_then(dom_text)
}

/// Collect the plain text of a provider DOM tree (nested tag/children
/// objects with string leaves).
fn dom_text(node: &Value) -> Option<String> {
    match node {
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(dom_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        Value::Object(_) => node.get("children").and_then(dom_text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::responsecache;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// HTTP stub returning canned bodies and counting requests.
    #[derive(Debug)]
    struct StubHttpClient {
        responses: Mutex<Vec<Result<String, HttpClientError>>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl StubHttpClient {
        fn new(responses: Vec<Result<String, HttpClientError>>) -> (Box<dyn HttpClient>, Arc<Mutex<Vec<String>>>) {
            let requests = Arc::new(Mutex::new(Vec::new()));
            let client = Box::new(StubHttpClient {
                responses: Mutex::new(responses),
                requests: requests.clone(),
            });
            (client, requests)
        }
    }

    impl HttpClient for StubHttpClient {
        fn get(&self, url: &str, _headers: &[(&str, &str)]) -> Result<String, HttpClientError> {
            self.requests.lock().unwrap().push(url.to_string());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Err(HttpClientError::EmptyResponse)
            } else {
                responses.remove(0)
            }
        }

        fn clone_box(&self) -> Box<dyn HttpClient> {
            unimplemented!("stub client is not cloned in tests")
        }
    }

    fn fast_throttle() -> Arc<RequestThrottle> {
        Arc::new(RequestThrottle::new(
            1000,
            Duration::from_secs(60),
            Duration::from_millis(1),
        ))
    }

    fn fresh_cache() -> Arc<ResponseCache> {
        Arc::new(ResponseCache::new(
            responsecache::DEFAULT_TTL,
            Duration::from_millis(1),
        ))
    }

    fn search_payload() -> String {
        json!({
            "response": {
                "hits": [
                    {
                        "type": "song",
                        "result": {
                            "id": 1,
                            "title": "Yesterday",
                            "url": "https://genius.com/yesterday",
                            "lyrics_state": "complete",
                            "primary_artist": {"name": "The Beatles"},
                            "stats": {"pageviews": 100}
                        }
                    },
                    {
                        "type": "article",
                        "result": {"id": 2, "title": "Not a song"}
                    },
                    {
                        "type": "song",
                        "result": {"id": 3, "title": "Missing artist"}
                    }
                ]
            }
        })
        .to_string()
    }

    #[test]
    fn test_search_parses_song_hits_and_skips_malformed() {
        let (http, _) = StubHttpClient::new(vec![Ok(search_payload())]);
        let client = GeniusClient::with_http_client("token", http, fast_throttle(), fresh_cache());

        let songs = client.search("Yesterday The Beatles", 10).unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].id, 1);
        assert_eq!(songs[0].title, "Yesterday");
        assert_eq!(songs[0].artist, "The Beatles");
        assert_eq!(songs[0].lyrics_state.as_deref(), Some("complete"));
    }

    #[test]
    fn test_search_uses_cache_for_repeated_queries() {
        let (http, requests) = StubHttpClient::new(vec![Ok(search_payload())]);
        let client = GeniusClient::with_http_client("token", http, fast_throttle(), fresh_cache());

        let first = client.search("Yesterday", 10).unwrap();
        let second = client.search("Yesterday", 10).unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_search_limit_is_clamped() {
        let (http, requests) = StubHttpClient::new(vec![Ok(search_payload())]);
        let client = GeniusClient::with_http_client("token", http, fast_throttle(), fresh_cache());

        client.search("Yesterday", 200).unwrap();
        let url = requests.lock().unwrap()[0].clone();
        assert!(url.contains("per_page=50"));
    }

    #[test]
    fn test_rate_limited_is_retried_then_surfaced() {
        let (http, requests) = StubHttpClient::new(vec![
            Err(HttpClientError::RateLimited),
            Err(HttpClientError::RateLimited),
            Err(HttpClientError::RateLimited),
        ]);
        let throttle = fast_throttle();
        let cache = fresh_cache();
        let client = GeniusClient::with_http_client("token", http, throttle, cache);

        let result = GeniusClient::search(&client, "Yesterday", 10);
        assert!(matches!(result, Err(GeniusError::RateLimited)));
        // Initial attempt plus RATE_LIMIT_RETRIES backoff retries
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_catalog_searcher_swallows_errors() {
        let (http, _) = StubHttpClient::new(vec![Err(HttpClientError::HttpStatus(500))]);
        let client = GeniusClient::with_http_client("token", http, fast_throttle(), fresh_cache());

        let songs = CatalogSearcher::search(&client, "Yesterday", 10);
        assert!(songs.is_empty());
    }

    #[test]
    fn test_song_details_extracts_description() {
        let payload = json!({
            "response": {
                "song": {
                    "id": 7,
                    "title": "Yesterday",
                    "title_with_featured": "Yesterday",
                    "url": "https://genius.com/yesterday",
                    "primary_artist": {"name": "The Beatles"},
                    "album": {"name": "Help!"},
                    "description": {"plain": "A melancholy ballad.", "html": "<p>ignored</p>"}
                }
            }
        })
        .to_string();
        let (http, _) = StubHttpClient::new(vec![Ok(payload)]);
        let client = GeniusClient::with_http_client("token", http, fast_throttle(), fresh_cache());

        let details = client.song_details(7).unwrap().unwrap();
        assert_eq!(details.album.as_deref(), Some("Help!"));
        assert_eq!(details.description.as_deref(), Some("A melancholy ballad."));
    }

    #[test]
    fn test_song_details_missing_song() {
        let payload = json!({"response": {"song": null}}).to_string();
        let (http, _) = StubHttpClient::new(vec![Ok(payload)]);
        let client = GeniusClient::with_http_client("token", http, fast_throttle(), fresh_cache());

        assert!(client.song_details(7).unwrap().is_none());
    }

    #[test]
    fn test_annotations_flattens_referents() {
        let payload = json!({
            "response": {
                "referents": [
                    {
                        "fragment": "Why she had to go",
                        "range": {"content": "Why she had to go, I don't know"},
                        "annotations": [
                            {
                                "id": 11,
                                "body": {"html": "<p>about loss</p>"},
                                "url": "https://genius.com/11",
                                "verified": true,
                                "votes_total": 42
                            },
                            {"id": 12, "votes_total": 3}
                        ]
                    }
                ]
            }
        })
        .to_string();
        let (http, _) = StubHttpClient::new(vec![Ok(payload)]);
        let client = GeniusClient::with_http_client("token", http, fast_throttle(), fresh_cache());

        let annotations = client.annotations(7).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].id, 11);
        assert_eq!(annotations[0].fragment.as_deref(), Some("Why she had to go"));
        assert_eq!(
            annotations[0].range_content.as_deref(),
            Some("Why she had to go, I don't know")
        );
        assert!(annotations[0].verified);
        assert_eq!(annotations[0].votes_total, 42);
        assert_eq!(annotations[0].line_number, -1);
        assert!(annotations[0].line_match.is_none());
        assert_eq!(annotations[1].id, 12);
    }

    #[test]
    fn test_extract_description_priority() {
        let plain = json!({"plain": "text", "html": "<p>html</p>"});
        assert_eq!(extract_description(Some(&plain)).as_deref(), Some("text"));

        let html_only = json!({"plain": "", "html": "<p>html</p>"});
        assert_eq!(extract_description(Some(&html_only)).as_deref(), Some("<p>html</p>"));

        let dom = json!({
            "dom": {
                "tag": "root",
                "children": [
                    {"tag": "p", "children": ["first part", {"tag": "em", "children": ["second"]}]}
                ]
            }
        });
        assert_eq!(extract_description(Some(&dom)).as_deref(), Some("first part second"));

        assert!(extract_description(None).is_none());
    }

    #[test]
    fn test_malformed_payload_is_a_parse_error() {
        let (http, _) = StubHttpClient::new(vec![Ok("not json".to_string())]);
        let client = GeniusClient::with_http_client("token", http, fast_throttle(), fresh_cache());

        let result = GeniusClient::search(&client, "Yesterday", 10);
        assert!(matches!(result, Err(GeniusError::Parse(_))));
    }
}

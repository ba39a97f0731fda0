use std::sync::Arc;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use serde_json::json;

use lyricbridge::config::{get_service_config, load_config};
use lyricbridge::data::TrackQuery;
use lyricbridge::helpers::annotations::align_annotations;
use lyricbridge::helpers::genius::GeniusClient;
use lyricbridge::helpers::lyrics::{GeniusLyricsProvider, LyricsRetriever};
use lyricbridge::helpers::matching::MatchSelector;
use lyricbridge::helpers::ratelimit::RequestThrottle;
use lyricbridge::helpers::responsecache::ResponseCache;

/// Match a track against the lyrics catalog and fetch its lyrics with
/// aligned annotations
#[derive(Parser)]
#[command(name = "lyricbridge", version, about)]
struct Args {
    /// Artist of the track to look up
    #[arg(long)]
    artist: String,

    /// Title of the track to look up
    #[arg(long)]
    title: String,

    /// Known song page URL, skips the catalog search for lyrics retrieval
    #[arg(long)]
    url: Option<String>,

    /// Path to a JSON configuration file with the provider access token
    #[arg(long)]
    config: Option<String>,

    /// Also fetch and align annotations for the matched song
    #[arg(long, default_value_t = false)]
    annotations: bool,
}

/// Provider token from the environment or the configuration file.
fn resolve_token(config_path: Option<&str>) -> Option<String> {
    if let Ok(token) = std::env::var("GENIUS_ACCESS_TOKEN") {
        if !token.is_empty() {
            return Some(token);
        }
    }

    let path = config_path?;
    let config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}", e);
            return None;
        }
    };

    get_service_config(&config, "genius")
        .and_then(|section| section.get("access_token"))
        .and_then(|token| token.as_str())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}

fn main() {
    // Initialize the logger with default configuration
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let args = Args::parse();

    let token = match resolve_token(args.config.as_deref()) {
        Some(token) => token,
        None => {
            error!("No provider access token found; set GENIUS_ACCESS_TOKEN or pass --config");
            std::process::exit(1);
        }
    };

    let throttle = Arc::new(RequestThrottle::default());
    let cache = Arc::new(ResponseCache::default());
    let client = Arc::new(GeniusClient::new(&token, throttle, cache));

    let track = TrackQuery::new(&args.artist, &args.title);
    info!("Looking up {}", track);

    let selector = MatchSelector::new(client.as_ref());
    let matched = selector.find_best_match(&track);

    let song_url = args
        .url
        .as_deref()
        .or_else(|| {
            matched
                .as_ref()
                .map(|song| song.url.as_str())
                .filter(|url| !url.is_empty())
        });

    let retriever =
        LyricsRetriever::new().add_provider(Box::new(GeniusLyricsProvider::new(client.clone())));
    let lyrics = retriever.retrieve(&args.artist, &args.title, song_url);

    let annotations = match &matched {
        Some(song) if args.annotations => match client.annotations(song.id) {
            Ok(list) => Some(match &lyrics {
                Some(text) => align_annotations(text, list),
                None => list,
            }),
            Err(e) => {
                warn!("Failed to fetch annotations: {}", e);
                None
            }
        },
        _ => None,
    };

    // "no match" and "no lyrics" are normal outcomes, reported in the output
    let output = json!({
        "track": track,
        "match": matched,
        "lyrics": lyrics,
        "annotations": annotations,
    });

    match serde_json::to_string_pretty(&output) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => {
            error!("Failed to render output: {}", e);
            std::process::exit(1);
        }
    }
}

// Configuration utilities for lyricbridge
//
// The configuration file is a JSON document with per-service sections under
// a "services" subtree; a top-level section with the service name is also
// accepted for flat configuration files.

use std::fs;
use log::debug;

/// Load a JSON configuration file.
pub fn load_config(path: &str) -> Result<serde_json::Value, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read configuration file {}: {}", path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse configuration file {}: {}", path, e))
}

/// Get the configuration section for a service.
///
/// Looks in the "services" subtree first, then falls back to a top-level
/// entry with the service name.
///
/// # Example
/// ```
/// use serde_json::json;
/// use lyricbridge::config::get_service_config;
///
/// let config = json!({
///   "services": {
///     "genius": { "access_token": "abc" }
///   }
/// });
///
/// if let Some(genius_config) = get_service_config(&config, "genius") {
///     assert_eq!(genius_config["access_token"], "abc");
/// }
/// ```
pub fn get_service_config<'a>(
    config: &'a serde_json::Value,
    service_name: &str,
) -> Option<&'a serde_json::Value> {
    if let Some(services) = config.get("services") {
        if let Some(service_config) = services.get(service_name) {
            debug!("Found {} configuration in services section", service_name);
            return Some(service_config);
        }
    }

    if let Some(service_config) = config.get(service_name) {
        debug!("Found {} configuration at top level", service_name);
        return Some(service_config);
    }

    debug!("No {} configuration found", service_name);
    None
}

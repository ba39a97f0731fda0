use std::time::Duration;
use log::{debug, error};
use thiserror::Error;

/// Error types that can occur when interacting with HTTP clients
#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("HTTP request error: {0}")]
    RequestError(String),

    #[error("rate limited by server (HTTP 429)")]
    RateLimited,

    #[error("server returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Failed to read response: {0}")]
    ParseError(String),

    #[error("Empty response from server")]
    EmptyResponse,
}

impl HttpClientError {
    /// Whether the failure is worth retrying with backoff: HTTP 429 and
    /// transport-level failures (timeouts, connection errors) are transient,
    /// other statuses are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HttpClientError::RateLimited | HttpClientError::RequestError(_)
        )
    }
}

/// A trait for HTTP client implementations
/// This version avoids generic methods to enable dynamic dispatch
pub trait HttpClient: Send + Sync + std::fmt::Debug {
    /// Send a GET request with the given headers
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, HttpClientError>;

    /// Clone the client as a boxed trait object
    fn clone_box(&self) -> Box<dyn HttpClient>;
}

impl Clone for Box<dyn HttpClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// An HTTP client implementation using ureq
#[derive(Clone, Debug)]
pub struct UreqHttpClient {
    timeout: Duration,
}

impl UreqHttpClient {
    /// Create a new HTTP client with the specified timeout
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl HttpClient for UreqHttpClient {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, HttpClientError> {
        debug!("GET request to {}", url);

        let mut request = ureq::get(url).timeout(self.timeout);
        for (name, value) in headers {
            request = request.set(name, value);
        }

        let response = match request.call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(429, _)) => {
                return Err(HttpClientError::RateLimited);
            }
            Err(ureq::Error::Status(code, _)) => {
                error!("GET request to {} failed with HTTP {}", url, code);
                return Err(HttpClientError::HttpStatus(code));
            }
            Err(e) => {
                error!("GET request failed: {}", e);
                return Err(HttpClientError::RequestError(e.to_string()));
            }
        };

        let text = response
            .into_string()
            .map_err(|e| HttpClientError::ParseError(format!("Failed to read response body: {}", e)))?;

        if text.is_empty() {
            return Err(HttpClientError::EmptyResponse);
        }

        Ok(text)
    }

    fn clone_box(&self) -> Box<dyn HttpClient> {
        Box::new(self.clone())
    }
}

/// Create a new HTTP client using the default implementation
pub fn new_http_client(timeout_secs: u64) -> Box<dyn HttpClient> {
    Box::new(UreqHttpClient::new(timeout_secs))
}

//! Blocking JSON-over-HTTP client

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const USER_AGENT: &str = concat!("sailcheck/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Why an upstream request produced no usable data
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned a body that is not JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream reported an error: {0}")]
    Upstream(String),

    #[error("unexpected response shape: {0}")]
    Shape(String),
}

impl FetchError {
    pub fn shape(detail: impl std::fmt::Display) -> Self {
        FetchError::Shape(detail.to_string())
    }
}

/// Anything that can GET a URL and hand back a JSON document
pub trait JsonSource {
    fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError>;
}

/// Build a URL from a base and query parameters
pub fn build_url(base: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
    reqwest::Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| FetchError::InvalidUrl {
            url: base.to_string(),
            reason: e.to_string(),
        })
}

/// reqwest-backed JsonSource
#[derive(Debug, Clone)]
pub struct HttpJson {
    client: Client,
}

impl HttpJson {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl JsonSource for HttpJson {
    fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/geo+json, application/json")
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .map_err(|source| FetchError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_params() {
        let url = build_url(
            "https://example.test/search",
            &[("q", "Port Orchard, WA"), ("format", "json")],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://example.test/search?q=Port+Orchard%2C+WA&format=json"
        );
    }

    #[test]
    fn test_build_url_rejects_garbage_base() {
        let err = build_url("not a url", &[]).unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn test_http_client_builds() {
        assert!(HttpJson::new(DEFAULT_TIMEOUT).is_ok());
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let http = HttpJson::new(Duration::from_secs(2)).unwrap();
        let err = http.get_json("http://127.0.0.1:9/").unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}

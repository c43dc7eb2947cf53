//! Backends module - Upstream HTTP data sources
//!
//! Provides:
//! - http: blocking JSON client and the JsonSource seam
//! - tides: NOAA CO-OPS tide predictions (cached)
//! - weather: NWS point forecast
//! - geocode: Nominatim place search (cached)
//! - stations: NOAA station list and nearest-station lookup (cached)
//!
//! Every fetcher catches its own failures, logs them and returns `None`.

pub mod geocode;
pub mod http;
pub mod stations;
pub mod tides;
pub mod weather;

use std::time::Duration;

use crate::cache::store::CacheStore;
use crate::core::model::SourceMode;
use http::JsonSource;

pub const DEFAULT_TIDES_URL: &str = "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter";
pub const DEFAULT_WEATHER_URL: &str = "https://api.weather.gov";
pub const DEFAULT_STATIONS_URL: &str =
    "https://api.tidesandcurrents.noaa.gov/mdapi/prod/webapi/stations.json";
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org";

/// Base URLs of the upstream services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub tides: String,
    pub stations: String,
    pub weather: String,
    pub geocode: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            tides: DEFAULT_TIDES_URL.to_string(),
            stations: DEFAULT_STATIONS_URL.to_string(),
            weather: DEFAULT_WEATHER_URL.to_string(),
            geocode: DEFAULT_GEOCODE_URL.to_string(),
        }
    }
}

/// Everything a fetcher needs: transport, cache handle and endpoints
pub struct Sources<'a> {
    pub http: &'a dyn JsonSource,
    pub cache: &'a dyn CacheStore,
    pub endpoints: &'a Endpoints,
    pub tide_ttl: Duration,
}

/// A record plus where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub source_mode: SourceMode,
    pub fetched_at_ms: i64,
    pub expires_at_ms: Option<i64>,
}

impl<T> Fetched<T> {
    pub fn meta(&self) -> crate::core::model::Meta {
        crate::core::model::Meta {
            fetched_at_ms: Some(self.fetched_at_ms),
            expires_at_ms: self.expires_at_ms,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process stand-in for the HTTP transport

    use super::http::{FetchError, JsonSource};
    use std::cell::RefCell;

    /// Serves canned bodies by URL prefix and records every request
    #[derive(Default)]
    pub struct StubSource {
        routes: Vec<(String, Result<serde_json::Value, u16>)>,
        pub calls: RefCell<Vec<String>>,
    }

    impl StubSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(mut self, prefix: &str, body: serde_json::Value) -> Self {
            self.routes.push((prefix.to_string(), Ok(body)));
            self
        }

        pub fn fail(mut self, prefix: &str, status: u16) -> Self {
            self.routes.push((prefix.to_string(), Err(status)));
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl JsonSource for StubSource {
        fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
            self.calls.borrow_mut().push(url.to_string());
            // Longest matching prefix wins
            let route = self
                .routes
                .iter()
                .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
                .max_by_key(|(prefix, _)| prefix.len());
            match route {
                Some((_, Ok(body))) => Ok(body.clone()),
                Some((_, Err(status))) => Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }
}

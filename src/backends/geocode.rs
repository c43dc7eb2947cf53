//! Place name to coordinates via Nominatim

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::backends::http::{build_url, FetchError};
use crate::backends::{Fetched, Sources};
use crate::cache::store::{get_typed, set_typed};
use crate::core::model::{ResultItem, ResultSet, SailError, SourceMode};
use crate::core::render::{RenderConfig, Renderer};
use crate::core::util::{duration_ms, now_ms};

/// Geocodes change rarely; keep them for a day
pub const GEOCODE_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// A resolved coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

pub fn cache_key(location: &str) -> String {
    format!("geocode_{}", location)
}

/// First hit of a Nominatim search document
pub fn parse_search(body: serde_json::Value) -> Result<Coordinates, FetchError> {
    let places: Vec<Place> = serde_json::from_value(body).map_err(FetchError::shape)?;
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::shape("no matching place"))?;

    let lat = place.lat.trim().parse::<f64>().map_err(FetchError::shape)?;
    let lon = place.lon.trim().parse::<f64>().map_err(FetchError::shape)?;
    Ok(Coordinates { lat, lon })
}

/// Resolve a free-text location, serving from cache when possible.
///
/// Returns `None` when the place cannot be resolved; the reason is logged.
pub fn geocode(sources: &Sources<'_>, location: &str) -> Option<Fetched<Coordinates>> {
    let key = cache_key(location);

    if let Some(cached) = get_typed::<Coordinates>(sources.cache, &key) {
        debug!(location, "returning cached geocode");
        return Some(Fetched {
            value: cached.value,
            source_mode: SourceMode::Cache,
            fetched_at_ms: cached.written_at_ms,
            expires_at_ms: Some(cached.expires_at_ms),
        });
    }

    let coordinates = match request_geocode(sources, location) {
        Ok(coordinates) => coordinates,
        Err(e) => {
            warn!(location, error = %e, "could not geocode location");
            return None;
        }
    };

    if let Err(e) = set_typed(sources.cache, &key, &coordinates, GEOCODE_CACHE_TTL) {
        warn!(key = %key, error = %e, "failed to cache geocode");
    }

    let fetched_at_ms = now_ms();
    Some(Fetched {
        value: coordinates,
        source_mode: SourceMode::Live,
        fetched_at_ms,
        expires_at_ms: Some(fetched_at_ms.saturating_add(duration_ms(GEOCODE_CACHE_TTL))),
    })
}

fn request_geocode(sources: &Sources<'_>, location: &str) -> Result<Coordinates, FetchError> {
    let base = format!("{}/search", sources.endpoints.geocode.trim_end_matches('/'));
    let url = build_url(&base, &[("q", location), ("format", "json"), ("limit", "1")])?;
    parse_search(sources.http.get_json(&url)?)
}

/// Result item for a geocode outcome
pub fn location_item(location: &str, fetched: Option<&Fetched<Coordinates>>) -> ResultItem {
    match fetched {
        Some(fetched) => ResultItem::location(
            location,
            fetched.value.lat,
            fetched.value.lon,
            fetched.source_mode,
        )
        .with_meta(fetched.meta()),
        None => ResultItem::error(SailError::new(
            "GEOCODE_FAILED",
            format!("Could not geocode '{}'", location),
        )),
    }
}

/// Run the geocode command
pub fn run_geocode(sources: &Sources<'_>, location: &str, config: RenderConfig) -> Result<()> {
    let fetched = geocode(sources, location);

    let mut result_set = ResultSet::new();
    result_set.push(location_item(location, fetched.as_ref()));

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::testing::StubSource;
    use crate::backends::tides::TIDE_CACHE_TTL;
    use crate::backends::Endpoints;
    use crate::cache::store::DiskCache;
    use serde_json::json;
    use tempfile::tempdir;

    const BASE: &str = "https://geo.test";

    #[test]
    fn test_parse_search() {
        let body = json!([{ "lat": "47.5404", "lon": "-122.6361", "display_name": "Port Orchard" }]);
        let coordinates = parse_search(body).unwrap();
        assert_eq!(coordinates.lat, 47.5404);
        assert_eq!(coordinates.lon, -122.6361);
    }

    #[test]
    fn test_parse_search_empty() {
        assert!(parse_search(json!([])).is_err());
        assert!(parse_search(json!([{ "lat": "north", "lon": "0" }])).is_err());
    }

    #[test]
    fn test_geocode_is_cached() {
        let temp = tempdir().unwrap();
        let cache = DiskCache::new(temp.path());
        let http = StubSource::new().route(BASE, json!([{ "lat": "1.5", "lon": "2.5" }]));
        let endpoints = Endpoints {
            geocode: BASE.to_string(),
            ..Endpoints::default()
        };
        let sources = Sources {
            http: &http,
            cache: &cache,
            endpoints: &endpoints,
            tide_ttl: TIDE_CACHE_TTL,
        };

        let first = geocode(&sources, "Port Orchard").unwrap();
        let second = geocode(&sources, "Port Orchard").unwrap();
        assert_eq!(first.value, second.value);
        assert_eq!(second.source_mode, SourceMode::Cache);
        assert_eq!(http.call_count(), 1);
        assert!(http.calls.borrow()[0].contains("q=Port+Orchard"));
    }
}

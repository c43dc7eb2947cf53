//! Check flow - the go/no-go pipeline
//!
//! Steps:
//! 1. Resolve the place name, when one was given instead of coordinates
//! 2. Fetch tides for the station (cached); a place without an explicit
//!    station uses the nearest one
//! 3. Fetch the forecast for the coordinates
//! 4. Evaluate the decision

use anyhow::{Context, Result};
use tracing::info;

use crate::backends::Sources;
use crate::core::model::{ResultItem, ResultSet};
use crate::core::render::{RenderConfig, Renderer};
use crate::flows::decision::evaluate;
use crate::flows::lookup::{gather_tides, gather_weather, locate, Request};

/// Run the check flow
pub fn run_check(sources: &Sources<'_>, request: &Request, config: RenderConfig) -> Result<()> {
    let result_set = gather_check(sources, request)?;

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}

/// Fetch everything and evaluate; the decision is the last item
pub fn gather_check(sources: &Sources<'_>, request: &Request) -> Result<ResultSet> {
    let mut result_set = ResultSet::new();

    let located = locate(sources, &request.target, &mut result_set);
    let tides = gather_tides(sources, request, located, &mut result_set);
    let weather = gather_weather(sources, located, &mut result_set);

    let decision = evaluate(
        tides.as_ref().map(|f| &f.value),
        weather.as_ref().map(|f| &f.value),
    )
    .context("Cannot evaluate sailing conditions")?;

    info!(verdict = %decision.verdict, reason = %decision.reason, "sailing decision");
    result_set.push(ResultItem::decision(&decision));

    Ok(result_set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::testing::StubSource;
    use crate::backends::tides::TIDE_CACHE_TTL;
    use crate::backends::weather::tests::{forecast_body, points_body, FORECAST};
    use crate::backends::Endpoints;
    use crate::cache::store::DiskCache;
    use crate::core::model::{Kind, SourceMode};
    use crate::flows::lookup::Target;
    use serde_json::json;
    use tempfile::tempdir;

    const TIDES: &str = "https://tides.test/datagetter";
    const STATIONS: &str = "https://stations.test/stations.json";
    const WEATHER: &str = "https://weather.test";
    const GEO: &str = "https://geo.test";

    fn endpoints() -> Endpoints {
        Endpoints {
            tides: TIDES.to_string(),
            stations: STATIONS.to_string(),
            weather: WEATHER.to_string(),
            geocode: GEO.to_string(),
        }
    }

    fn tides_body(last: &str) -> serde_json::Value {
        let next = if last == "H" { "L" } else { "H" };
        json!({ "predictions": [
            { "t": "2025-03-16 04:12", "v": "11.2", "type": last },
            { "t": "2025-03-16 10:40", "v": "2.2", "type": next }
        ]})
    }

    fn request() -> Request {
        Request {
            station: Some("9445958".to_string()),
            date: None,
            target: Target::Coordinates {
                lat: 47.5404,
                lon: -122.6361,
            },
        }
    }

    fn decision_of(set: &ResultSet) -> (String, String) {
        let last = set.items.last().unwrap();
        assert_eq!(last.kind, Kind::Decision);
        let data = last.data.as_ref().unwrap();
        (
            data["verdict"].as_str().unwrap().to_string(),
            data["reason"].as_str().unwrap().to_string(),
        )
    }

    fn full_stub(last_tide: &str, wind: &str) -> StubSource {
        StubSource::new()
            .route(TIDES, tides_body(last_tide))
            .route(&format!("{}/points/", WEATHER), points_body())
            .route(FORECAST, forecast_body(wind))
    }

    #[test]
    fn test_check_safe() {
        let temp = tempdir().unwrap();
        let cache = DiskCache::new(temp.path());
        let http = full_stub("H", "10 mph");
        let endpoints = endpoints();
        let sources = Sources {
            http: &http,
            cache: &cache,
            endpoints: &endpoints,
            tide_ttl: TIDE_CACHE_TTL,
        };

        let set = gather_check(&sources, &request()).unwrap();
        assert_eq!(set.items.len(), 3);
        assert_eq!(set.items[0].kind, Kind::Tide);
        assert_eq!(set.items[1].kind, Kind::Weather);
        assert_eq!(
            decision_of(&set),
            (
                "Safe".to_string(),
                "Tide and wind conditions are favorable.".to_string()
            )
        );
    }

    #[test]
    fn test_check_high_wind() {
        let http = full_stub("H", "30 mph");
        let temp = tempdir().unwrap();
        let cache = DiskCache::new(temp.path());
        let endpoints = endpoints();
        let sources = Sources {
            http: &http,
            cache: &cache,
            endpoints: &endpoints,
            tide_ttl: TIDE_CACHE_TTL,
        };

        let set = gather_check(&sources, &request()).unwrap();
        assert_eq!(decision_of(&set).1, "High wind speed.");
    }

    #[test]
    fn test_check_missing_weather() {
        let http = StubSource::new()
            .route(TIDES, tides_body("H"))
            .fail(WEATHER, 503);
        let temp = tempdir().unwrap();
        let cache = DiskCache::new(temp.path());
        let endpoints = endpoints();
        let sources = Sources {
            http: &http,
            cache: &cache,
            endpoints: &endpoints,
            tide_ttl: TIDE_CACHE_TTL,
        };

        let set = gather_check(&sources, &request()).unwrap();
        assert_eq!(set.items[1].kind, Kind::Error);
        assert_eq!(
            decision_of(&set),
            ("Unsafe".to_string(), "Missing data.".to_string())
        );
    }

    #[test]
    fn test_check_second_run_uses_cached_tides() {
        let temp = tempdir().unwrap();
        let cache = DiskCache::new(temp.path());
        let http = full_stub("L", "10 mph");
        let endpoints = endpoints();
        let sources = Sources {
            http: &http,
            cache: &cache,
            endpoints: &endpoints,
            tide_ttl: TIDE_CACHE_TTL,
        };

        gather_check(&sources, &request()).unwrap();
        let set = gather_check(&sources, &request()).unwrap();

        assert_eq!(set.items[0].source_mode, SourceMode::Cache);
        let tide_calls = http
            .calls
            .borrow()
            .iter()
            .filter(|url| url.starts_with(TIDES))
            .count();
        assert_eq!(tide_calls, 1);
        assert_eq!(decision_of(&set).0, "Unsafe");
    }

    #[test]
    fn test_check_with_place() {
        let temp = tempdir().unwrap();
        let cache = DiskCache::new(temp.path());
        let http = full_stub("H", "5 mph").route(
            GEO,
            json!([{ "lat": "47.5404", "lon": "-122.6361" }]),
        );
        let endpoints = endpoints();
        let sources = Sources {
            http: &http,
            cache: &cache,
            endpoints: &endpoints,
            tide_ttl: TIDE_CACHE_TTL,
        };
        let request = Request {
            target: Target::Place("Port Orchard, WA".to_string()),
            ..request()
        };

        let set = gather_check(&sources, &request).unwrap();
        assert_eq!(set.items[0].kind, Kind::Location);
        assert_eq!(set.items[1].kind, Kind::Tide);
        assert_eq!(set.items[2].kind, Kind::Weather);
        assert_eq!(decision_of(&set).0, "Safe");
        // Explicit station, so the station list is never requested
        assert!(!http.calls.borrow().iter().any(|url| url.starts_with(STATIONS)));
    }

    #[test]
    fn test_check_unresolved_place_is_missing_data() {
        let temp = tempdir().unwrap();
        let cache = DiskCache::new(temp.path());
        let http = full_stub("H", "5 mph").route(GEO, json!([]));
        let endpoints = endpoints();
        let sources = Sources {
            http: &http,
            cache: &cache,
            endpoints: &endpoints,
            tide_ttl: TIDE_CACHE_TTL,
        };
        let request = Request {
            target: Target::Place("Atlantis".to_string()),
            ..request()
        };

        let set = gather_check(&sources, &request).unwrap();
        assert_eq!(set.items[0].kind, Kind::Error);
        assert_eq!(decision_of(&set).1, "Missing data.");
    }

    #[test]
    fn test_check_invalid_wind_is_error() {
        let temp = tempdir().unwrap();
        let cache = DiskCache::new(temp.path());
        let http = full_stub("H", "Calm");
        let endpoints = endpoints();
        let sources = Sources {
            http: &http,
            cache: &cache,
            endpoints: &endpoints,
            tide_ttl: TIDE_CACHE_TTL,
        };

        let err = gather_check(&sources, &request()).unwrap_err();
        assert!(format!("{:#}", err).contains("'Calm'"));
    }

    #[test]
    fn test_check_place_without_station_uses_nearest() {
        let temp = tempdir().unwrap();
        let cache = DiskCache::new(temp.path());
        let http = full_stub("H", "8 mph")
            .route(GEO, json!([{ "lat": "47.6062", "lon": "-122.3321" }]))
            .route(
                STATIONS,
                json!({ "stations": [
                    { "id": "9445958", "name": "Bremerton", "lat": 47.5617, "lng": -122.6233 },
                    { "id": "9447130", "name": "Seattle", "lat": 47.6026, "lng": -122.3393 }
                ]}),
            );
        let endpoints = endpoints();
        let sources = Sources {
            http: &http,
            cache: &cache,
            endpoints: &endpoints,
            tide_ttl: TIDE_CACHE_TTL,
        };
        let request = Request {
            station: None,
            target: Target::Place("Seattle, WA".to_string()),
            ..request()
        };

        let set = gather_check(&sources, &request).unwrap();
        let kinds: Vec<Kind> = set.items.iter().map(|item| item.kind).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::Location,
                Kind::Station,
                Kind::Tide,
                Kind::Weather,
                Kind::Decision
            ]
        );
        assert_eq!(set.items[2].subject.as_deref(), Some("9447130"));
        assert_eq!(decision_of(&set).0, "Safe");
    }
}

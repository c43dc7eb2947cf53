//! NWS point forecast
//!
//! Two chained requests: `/points/{lat},{lon}` names the forecast resource,
//! which is then fetched and reduced to its first period.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::backends::http::FetchError;
use crate::backends::{Fetched, Sources};
use crate::core::conditions::{WeatherSnapshot, WindSpeed};
use crate::core::model::{ResultItem, SailError, SourceMode};
use crate::core::util::now_ms;

/// Port Orchard, WA
pub const DEFAULT_LAT: f64 = 47.5404;
pub const DEFAULT_LON: f64 = -122.6361;

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
struct PointsProperties {
    forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastPeriod {
    wind_speed: String,
    wind_direction: String,
    short_forecast: String,
    temperature: f64,
    #[serde(default)]
    temperature_unit: Option<String>,
}

/// URL of the points lookup for a coordinate
pub fn points_url(base: &str, lat: f64, lon: f64) -> String {
    format!("{}/points/{:.4},{:.4}", base.trim_end_matches('/'), lat, lon)
}

/// Forecast resource URL out of a points document
pub fn parse_points(body: serde_json::Value) -> Result<String, FetchError> {
    let points: PointsResponse = serde_json::from_value(body).map_err(FetchError::shape)?;
    points
        .properties
        .forecast
        .filter(|url| !url.is_empty())
        .ok_or_else(|| FetchError::shape("points response has no forecast URL"))
}

/// First period of a forecast document
pub fn parse_forecast(body: serde_json::Value) -> Result<WeatherSnapshot, FetchError> {
    let forecast: ForecastResponse = serde_json::from_value(body).map_err(FetchError::shape)?;
    let period = forecast
        .properties
        .periods
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::shape("forecast has no periods"))?;

    Ok(WeatherSnapshot {
        wind_speed: WindSpeed::new(period.wind_speed),
        wind_direction: period.wind_direction,
        short_forecast: period.short_forecast,
        temperature: period.temperature,
        temperature_unit: period.temperature_unit.unwrap_or_else(|| "F".to_string()),
    })
}

/// Fetch the current forecast period for a coordinate.
///
/// Returns `None` when no data is available; the reason is logged.
pub fn fetch_weather(sources: &Sources<'_>, lat: f64, lon: f64) -> Option<Fetched<WeatherSnapshot>> {
    match request_weather(sources, lat, lon) {
        Ok(weather) => Some(Fetched {
            value: weather,
            source_mode: SourceMode::Live,
            fetched_at_ms: now_ms(),
            expires_at_ms: None,
        }),
        Err(e) => {
            warn!(lat, lon, error = %e, "error fetching NOAA weather data");
            None
        }
    }
}

fn request_weather(sources: &Sources<'_>, lat: f64, lon: f64) -> Result<WeatherSnapshot, FetchError> {
    let points = sources
        .http
        .get_json(&points_url(&sources.endpoints.weather, lat, lon))?;
    let forecast_url = parse_points(points)?;
    debug!(url = %forecast_url, "resolved forecast resource");

    let forecast = sources.http.get_json(&forecast_url)?;
    parse_forecast(forecast)
}

/// Result item for a weather fetch outcome
pub fn weather_item(lat: f64, lon: f64, fetched: Option<&Fetched<WeatherSnapshot>>) -> ResultItem {
    match fetched {
        Some(fetched) => ResultItem::weather(lat, lon, &fetched.value).with_meta(fetched.meta()),
        None => ResultItem::error(SailError::new(
            "WEATHER_UNAVAILABLE",
            format!("No weather data available for {},{}", lat, lon),
        )),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backends::testing::StubSource;
    use crate::backends::Endpoints;
    use crate::cache::store::NoCache;
    use crate::backends::tides::TIDE_CACHE_TTL;
    use serde_json::json;

    pub const BASE: &str = "https://weather.test";
    pub const FORECAST: &str = "https://weather.test/gridpoints/SEW/119,67/forecast";

    pub fn points_body() -> serde_json::Value {
        json!({ "properties": { "forecast": FORECAST } })
    }

    pub fn forecast_body(wind: &str) -> serde_json::Value {
        json!({
            "properties": {
                "periods": [
                    {
                        "name": "Tonight",
                        "temperature": 44,
                        "temperatureUnit": "F",
                        "windSpeed": wind,
                        "windDirection": "SSW",
                        "shortForecast": "Mostly Cloudy"
                    },
                    {
                        "name": "Monday",
                        "temperature": 52,
                        "temperatureUnit": "F",
                        "windSpeed": "15 mph",
                        "windDirection": "S",
                        "shortForecast": "Rain"
                    }
                ]
            }
        })
    }

    fn endpoints() -> Endpoints {
        Endpoints {
            weather: BASE.to_string(),
            ..Endpoints::default()
        }
    }

    #[test]
    fn test_points_url() {
        assert_eq!(
            points_url("https://api.weather.gov/", 47.5404, -122.6361),
            "https://api.weather.gov/points/47.5404,-122.6361"
        );
    }

    #[test]
    fn test_parse_forecast_first_period() {
        let snapshot = parse_forecast(forecast_body("5 to 10 mph")).unwrap();
        assert_eq!(snapshot.wind_speed.to_string(), "5 to 10 mph");
        assert_eq!(snapshot.wind_direction, "SSW");
        assert_eq!(snapshot.short_forecast, "Mostly Cloudy");
        assert_eq!(snapshot.temperature, 44.0);
        assert_eq!(snapshot.temperature_unit, "F");
    }

    #[test]
    fn test_parse_forecast_missing_wind_is_shape_error() {
        let body = json!({ "properties": { "periods": [
            { "temperature": 44, "windDirection": "S", "shortForecast": "Fog" }
        ]}});
        assert!(matches!(parse_forecast(body), Err(FetchError::Shape(_))));
    }

    #[test]
    fn test_parse_forecast_no_periods() {
        let body = json!({ "properties": { "periods": [] } });
        assert!(parse_forecast(body).is_err());
    }

    #[test]
    fn test_parse_points_requires_forecast() {
        assert_eq!(parse_points(points_body()).unwrap(), FORECAST);
        assert!(parse_points(json!({ "properties": {} })).is_err());
        assert!(parse_points(json!({ "properties": { "forecast": "" } })).is_err());
    }

    #[test]
    fn test_fetch_weather_chains_requests() {
        let http = StubSource::new()
            .route(&format!("{}/points/", BASE), points_body())
            .route(FORECAST, forecast_body("10 mph"));
        let endpoints = endpoints();
        let sources = Sources {
            http: &http,
            cache: &NoCache,
            endpoints: &endpoints,
            tide_ttl: TIDE_CACHE_TTL,
        };

        let fetched = fetch_weather(&sources, DEFAULT_LAT, DEFAULT_LON).unwrap();
        assert_eq!(fetched.value.wind_speed.magnitude(), Some(10.0));
        assert_eq!(fetched.source_mode, SourceMode::Live);

        let calls = http.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].ends_with("/points/47.5404,-122.6361"));
        assert_eq!(calls[1], FORECAST);
    }

    #[test]
    fn test_fetch_weather_stops_after_failed_points() {
        let http = StubSource::new()
            .fail(&format!("{}/points/", BASE), 500)
            .route(FORECAST, forecast_body("10 mph"));
        let endpoints = endpoints();
        let sources = Sources {
            http: &http,
            cache: &NoCache,
            endpoints: &endpoints,
            tide_ttl: TIDE_CACHE_TTL,
        };

        assert!(fetch_weather(&sources, DEFAULT_LAT, DEFAULT_LON).is_none());
        assert_eq!(http.call_count(), 1);
    }

    #[test]
    fn test_weather_item_for_missing_data() {
        let item = weather_item(1.0, 2.0, None);
        assert_eq!(item.errors[0].code, "WEATHER_UNAVAILABLE");
    }
}

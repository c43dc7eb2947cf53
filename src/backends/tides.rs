//! NOAA CO-OPS tide predictions
//!
//! Fetches high/low predictions for a station and keeps the first two as the
//! last and next tide. Results are cached per station (and date, when given).

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backends::http::{build_url, FetchError};
use crate::backends::{Fetched, Sources};
use crate::cache::store::{get_typed, set_typed};
use crate::core::conditions::{TideKind, TidePair, TideReading, NOAA_TIME_FORMAT};
use crate::core::model::{ResultItem, SailError, SourceMode};
use crate::core::util::{duration_ms, now_ms};

/// Port Orchard, WA
pub const DEFAULT_STATION: &str = "9445958";

/// How long a tide response is served from cache
pub const TIDE_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Deserialize)]
struct PredictionsResponse {
    #[serde(default)]
    predictions: Option<Vec<RawPrediction>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    t: String,
    v: String,
    #[serde(rename = "type")]
    kind: String,
}

impl RawPrediction {
    fn to_reading(&self) -> Result<TideReading, FetchError> {
        let kind = TideKind::from_code(&self.kind)
            .ok_or_else(|| FetchError::shape(format!("unknown tide type '{}'", self.kind)))?;
        let time = NaiveDateTime::parse_from_str(self.t.trim(), NOAA_TIME_FORMAT)
            .map_err(|e| FetchError::shape(format!("bad prediction time '{}': {}", self.t, e)))?;
        let height = self
            .v
            .trim()
            .parse::<f64>()
            .map_err(|e| FetchError::shape(format!("bad prediction height '{}': {}", self.v, e)))?;
        Ok(TideReading { kind, time, height })
    }
}

/// Cache key for a station, optionally pinned to a date
pub fn cache_key(station: &str, date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => format!("noaa_data_{}_{}", station, date.format("%Y%m%d")),
        None => format!("noaa_data_{}", station),
    }
}

/// Request URL for a station's hilo predictions
pub fn predictions_url(
    base: &str,
    station: &str,
    date: Option<NaiveDate>,
) -> Result<String, FetchError> {
    let mut params: Vec<(&str, String)> = vec![
        ("product", "predictions".to_string()),
        ("datum", "MLLW".to_string()),
        ("station", station.to_string()),
        ("time_zone", "lst_ldt".to_string()),
        ("units", "english".to_string()),
        ("interval", "hilo".to_string()),
        ("format", "json".to_string()),
    ];
    match date {
        Some(date) => {
            let end = date.checked_add_days(Days::new(1)).unwrap_or(date);
            params.push(("begin_date", date.format("%Y%m%d").to_string()));
            params.push(("end_date", end.format("%Y%m%d").to_string()));
        }
        None => params.push(("date", "today".to_string())),
    }

    let borrowed: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
    build_url(base, &borrowed)
}

/// Pull the last/next pair out of a predictions document
pub fn parse_predictions(body: serde_json::Value) -> Result<TidePair, FetchError> {
    let response: PredictionsResponse =
        serde_json::from_value(body).map_err(FetchError::shape)?;

    if let Some(error) = response.error {
        return Err(FetchError::Upstream(error.message));
    }

    let predictions = response
        .predictions
        .ok_or_else(|| FetchError::shape("missing 'predictions'"))?;
    if predictions.len() < 2 {
        return Err(FetchError::shape(format!(
            "expected at least 2 predictions, got {}",
            predictions.len()
        )));
    }

    Ok(TidePair {
        last: predictions[0].to_reading()?,
        next: predictions[1].to_reading()?,
    })
}

/// Fetch the tide pair for a station, serving from cache when possible.
///
/// Returns `None` when no data is available; the reason is logged.
pub fn fetch_tides(
    sources: &Sources<'_>,
    station: &str,
    date: Option<NaiveDate>,
) -> Option<Fetched<TidePair>> {
    let key = cache_key(station, date);

    if let Some(cached) = get_typed::<TidePair>(sources.cache, &key) {
        debug!(key = %key, "returning cached tide data");
        return Some(Fetched {
            value: cached.value,
            source_mode: SourceMode::Cache,
            fetched_at_ms: cached.written_at_ms,
            expires_at_ms: Some(cached.expires_at_ms),
        });
    }

    let tides = match request_tides(sources, station, date) {
        Ok(tides) => tides,
        Err(e) => {
            warn!(station, error = %e, "error fetching NOAA tidal data");
            return None;
        }
    };

    let fetched_at_ms = now_ms();
    if let Err(e) = set_typed(sources.cache, &key, &tides, sources.tide_ttl) {
        warn!(key = %key, error = %e, "failed to cache tide data");
    }

    Some(Fetched {
        value: tides,
        source_mode: SourceMode::Live,
        fetched_at_ms,
        expires_at_ms: Some(fetched_at_ms.saturating_add(duration_ms(sources.tide_ttl))),
    })
}

fn request_tides(
    sources: &Sources<'_>,
    station: &str,
    date: Option<NaiveDate>,
) -> Result<TidePair, FetchError> {
    let url = predictions_url(&sources.endpoints.tides, station, date)?;
    let body = sources.http.get_json(&url)?;
    parse_predictions(body)
}

/// Result item for a tide fetch outcome
pub fn tide_item(station: &str, fetched: Option<&Fetched<TidePair>>) -> ResultItem {
    match fetched {
        Some(fetched) => {
            ResultItem::tide(station, &fetched.value, fetched.source_mode).with_meta(fetched.meta())
        }
        None => ResultItem::error(SailError::new(
            "TIDES_UNAVAILABLE",
            format!("No tide data available for station {}", station),
        )),
    }
}

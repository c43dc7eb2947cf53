//! NOAA tide prediction stations
//!
//! The station list is fetched once a day and ranked by distance from the
//! forecast coordinates, so a place name can be checked against the tides
//! of the station closest to it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::backends::geocode::Coordinates;
use crate::backends::http::{build_url, FetchError};
use crate::backends::tides::fetch_tides;
use crate::backends::{Fetched, Sources};
use crate::cache::store::{get_typed, set_typed};
use crate::core::conditions::TidePair;
use crate::core::model::SourceMode;
use crate::core::util::{duration_ms, now_ms};

pub const STATIONS_CACHE_KEY: &str = "noaa_stations";

/// The station list barely changes; keep it for a day
pub const STATIONS_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// How many of the nearest stations are tried before giving up
pub const MAX_CANDIDATES: usize = 8;

const EARTH_RADIUS_MI: f64 = 3958.8;

/// A station that publishes tide predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// A station and how far it is from the point of interest
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStation {
    pub station: Station,
    pub distance_mi: f64,
}

#[derive(Debug, Deserialize)]
struct StationsResponse {
    stations: Vec<RawStation>,
}

#[derive(Debug, Deserialize)]
struct RawStation {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
}

/// Stations with usable coordinates out of an mdapi document
pub fn parse_stations(body: serde_json::Value) -> Result<Vec<Station>, FetchError> {
    let response: StationsResponse = serde_json::from_value(body).map_err(FetchError::shape)?;

    let stations: Vec<Station> = response
        .stations
        .into_iter()
        .filter_map(|raw| match (raw.lat, raw.lng) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some(Station {
                id: raw.id,
                name: raw.name,
                lat,
                lon,
            }),
            _ => {
                debug!(id = %raw.id, "station without coordinates, skipping");
                None
            }
        })
        .collect();

    if stations.is_empty() {
        return Err(FetchError::shape("station list is empty"));
    }
    Ok(stations)
}

/// Great-circle distance in statute miles
pub fn distance_mi(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MI * h.sqrt().min(1.0).asin()
}

/// The `limit` stations closest to a point, nearest first
pub fn nearest(stations: &[Station], at: Coordinates, limit: usize) -> Vec<NearbyStation> {
    let mut ranked: Vec<NearbyStation> = stations
        .iter()
        .map(|station| NearbyStation {
            distance_mi: distance_mi(
                at,
                Coordinates {
                    lat: station.lat,
                    lon: station.lon,
                },
            ),
            station: station.clone(),
        })
        .collect();

    ranked.sort_by(|a, b| a.distance_mi.total_cmp(&b.distance_mi));
    ranked.truncate(limit);
    ranked
}

/// Fetch the station list, serving from cache when possible.
///
/// Returns `None` when no list is available; the reason is logged.
pub fn fetch_stations(sources: &Sources<'_>) -> Option<Fetched<Vec<Station>>> {
    if let Some(cached) = get_typed::<Vec<Station>>(sources.cache, STATIONS_CACHE_KEY) {
        debug!(count = cached.value.len(), "returning cached NOAA stations");
        return Some(Fetched {
            value: cached.value,
            source_mode: SourceMode::Cache,
            fetched_at_ms: cached.written_at_ms,
            expires_at_ms: Some(cached.expires_at_ms),
        });
    }

    let stations = match request_stations(sources) {
        Ok(stations) => stations,
        Err(e) => {
            warn!(error = %e, "error fetching NOAA station list");
            return None;
        }
    };

    if let Err(e) = set_typed(sources.cache, STATIONS_CACHE_KEY, &stations, STATIONS_CACHE_TTL) {
        warn!(error = %e, "failed to cache NOAA station list");
    }

    let fetched_at_ms = now_ms();
    Some(Fetched {
        value: stations,
        source_mode: SourceMode::Live,
        fetched_at_ms,
        expires_at_ms: Some(fetched_at_ms.saturating_add(duration_ms(STATIONS_CACHE_TTL))),
    })
}

fn request_stations(sources: &Sources<'_>) -> Result<Vec<Station>, FetchError> {
    let url = build_url(&sources.endpoints.stations, &[("type", "tidepredictions")])?;
    parse_stations(sources.http.get_json(&url)?)
}

/// Try candidates nearest first; the first station with predictions wins
pub fn first_with_tides<'c>(
    sources: &Sources<'_>,
    candidates: &'c [NearbyStation],
    date: Option<NaiveDate>,
) -> Option<(&'c NearbyStation, Fetched<TidePair>)> {
    candidates.iter().find_map(|candidate| {
        let tides = fetch_tides(sources, &candidate.station.id, date);
        if tides.is_none() {
            debug!(station = %candidate.station.id, "no predictions, trying next-nearest station");
        }
        tides.map(|tides| (candidate, tides))
    })
}

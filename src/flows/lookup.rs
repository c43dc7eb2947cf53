//! Lookup flow - where to read tides and weather from
//!
//! A request names a tide station and a forecast target. Place names are
//! geocoded once; when no station was given for a place, the nearest NOAA
//! station with predictions is used instead of the default one.

use anyhow::Result;
use chrono::NaiveDate;

use crate::backends::geocode::{geocode, location_item, Coordinates};
use crate::backends::stations::{fetch_stations, first_with_tides, nearest, MAX_CANDIDATES};
use crate::backends::tides::{fetch_tides, tide_item, DEFAULT_STATION};
use crate::backends::weather::{fetch_weather, weather_item};
use crate::backends::{Fetched, Sources};
use crate::core::conditions::{TidePair, WeatherSnapshot};
use crate::core::model::{ResultItem, ResultSet, SailError};
use crate::core::render::{RenderConfig, Renderer};

/// Where to look for the forecast
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Coordinates { lat: f64, lon: f64 },
    Place(String),
}

/// Inputs of one lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Explicit station; `None` means default or nearest to the place
    pub station: Option<String>,
    pub date: Option<NaiveDate>,
    pub target: Target,
}

impl Request {
    fn wants_nearest_station(&self) -> bool {
        self.station.is_none() && matches!(self.target, Target::Place(_))
    }
}

/// Coordinates of the target. Place names are geocoded and reported.
pub fn locate(sources: &Sources<'_>, target: &Target, result_set: &mut ResultSet) -> Option<Coordinates> {
    match target {
        Target::Coordinates { lat, lon } => Some(Coordinates {
            lat: *lat,
            lon: *lon,
        }),
        Target::Place(place) => {
            let resolved = geocode(sources, place);
            result_set.push(location_item(place, resolved.as_ref()));
            resolved.map(|f| f.value)
        }
    }
}

/// Tides for the request, reported into `result_set`.
///
/// An explicit station is used as given. A place without one is matched to
/// its nearest station; bare coordinates keep the default station.
pub fn gather_tides(
    sources: &Sources<'_>,
    request: &Request,
    located: Option<Coordinates>,
    result_set: &mut ResultSet,
) -> Option<Fetched<TidePair>> {
    let station = match (&request.station, &request.target) {
        (Some(station), _) => station.as_str(),
        (None, Target::Coordinates { .. }) => DEFAULT_STATION,
        (None, Target::Place(place)) => {
            return nearest_station_tides(sources, place, located, request.date, result_set)
        }
    };

    let tides = fetch_tides(sources, station, request.date);
    result_set.push(tide_item(station, tides.as_ref()));
    tides
}

fn nearest_station_tides(
    sources: &Sources<'_>,
    place: &str,
    located: Option<Coordinates>,
    date: Option<NaiveDate>,
    result_set: &mut ResultSet,
) -> Option<Fetched<TidePair>> {
    let Some(at) = located else {
        result_set.push(ResultItem::error(SailError::new(
            "NO_STATION",
            format!("No tide station for unresolved place '{}'", place),
        )));
        return None;
    };

    let Some(stations) = fetch_stations(sources) else {
        result_set.push(ResultItem::error(SailError::new(
            "STATIONS_UNAVAILABLE",
            "NOAA station list is unavailable",
        )));
        return None;
    };

    let candidates = nearest(&stations.value, at, MAX_CANDIDATES);
    match first_with_tides(sources, &candidates, date) {
        Some((chosen, tides)) => {
            result_set.push(ResultItem::station(
                &chosen.station.id,
                &chosen.station.name,
                chosen.distance_mi,
                stations.source_mode,
            ));
            result_set.push(tide_item(&chosen.station.id, Some(&tides)));
            Some(tides)
        }
        None => {
            result_set.push(ResultItem::error(SailError::new(
                "TIDES_UNAVAILABLE",
                format!(
                    "No tide data available from the {} stations nearest '{}'",
                    candidates.len(),
                    place
                ),
            )));
            None
        }
    }
}

/// Forecast for resolved coordinates, reported into `result_set`
pub fn gather_weather(
    sources: &Sources<'_>,
    located: Option<Coordinates>,
    result_set: &mut ResultSet,
) -> Option<Fetched<WeatherSnapshot>> {
    let at = located?;
    let weather = fetch_weather(sources, at.lat, at.lon);
    result_set.push(weather_item(at.lat, at.lon, weather.as_ref()));
    weather
}

/// Everything the tides command reports
pub fn tides_report(sources: &Sources<'_>, request: &Request) -> ResultSet {
    let mut result_set = ResultSet::new();
    let located = if request.wants_nearest_station() {
        locate(sources, &request.target, &mut result_set)
    } else {
        None
    };
    gather_tides(sources, request, located, &mut result_set);
    result_set
}

/// Everything the weather command reports
pub fn weather_report(sources: &Sources<'_>, target: &Target) -> ResultSet {
    let mut result_set = ResultSet::new();
    let located = locate(sources, target, &mut result_set);
    gather_weather(sources, located, &mut result_set);
    result_set
}

/// Run the tides command
pub fn run_tides(sources: &Sources<'_>, request: &Request, config: RenderConfig) -> Result<()> {
    let result_set = tides_report(sources, request);

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}

/// Run the weather command
pub fn run_weather(sources: &Sources<'_>, target: &Target, config: RenderConfig) -> Result<()> {
    let result_set = weather_report(sources, target);

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}

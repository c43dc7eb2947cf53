//! Unified Result Model
//!
//! Every command maps what it fetched or derived into this model before
//! rendering output.

use serde::{Deserialize, Serialize};

use crate::core::conditions::{SailingDecision, TidePair, WeatherSnapshot};

/// The kind of result item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Tide,
    Station,
    Weather,
    Location,
    Decision,
    Cache,
    Error,
}

/// Source mode indicating how the result was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Cache,
    Live,
    Derived,
}

/// Metadata for a result item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    /// When the underlying record was fetched (ms since epoch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at_ms: Option<i64>,

    /// When the cached copy stops being served (ms since epoch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<i64>,
}

/// Error information for a result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SailError {
    pub code: String,
    pub message: String,
}

impl SailError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The unified result item that all commands produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    /// The kind of this result
    pub kind: Kind,

    /// What the record is about: station id, "lat,lon", cache key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// One-line human summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Structured payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// How this result was obtained
    pub source_mode: SourceMode,

    /// Metadata
    pub meta: Meta,

    /// Errors (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SailError>,
}

impl ResultItem {
    fn base(kind: Kind, source_mode: SourceMode) -> Self {
        Self {
            kind,
            subject: None,
            summary: None,
            data: None,
            source_mode,
            meta: Meta::default(),
            errors: Vec::new(),
        }
    }

    /// Create a tide result for a station
    pub fn tide(station: &str, tides: &TidePair, source_mode: SourceMode) -> Self {
        let summary = format!(
            "Tides @ {}: last {} {:.2} ft at {}, next {} {:.2} ft at {} ({})",
            station,
            tides.last.kind,
            tides.last.height,
            tides.last.time.format("%Y-%m-%d %H:%M"),
            tides.next.kind,
            tides.next.height,
            tides.next.time.format("%Y-%m-%d %H:%M"),
            tides.phase()
        );
        let mut data = serde_json::to_value(tides).unwrap_or_default();
        if let Some(map) = data.as_object_mut() {
            map.insert(
                "phase".to_string(),
                serde_json::to_value(tides.phase()).unwrap_or_default(),
            );
        }

        Self {
            subject: Some(station.to_string()),
            summary: Some(summary),
            data: Some(data),
            ..Self::base(Kind::Tide, source_mode)
        }
    }

    /// Create a result for the tide station picked near a location
    pub fn station(
        id: &str,
        name: &str,
        distance_mi: f64,
        source_mode: SourceMode,
    ) -> Self {
        Self {
            subject: Some(id.to_string()),
            summary: Some(format!(
                "Station {} ({}): {:.1} mi away",
                id, name, distance_mi
            )),
            data: Some(serde_json::json!({
                "id": id,
                "name": name,
                "distance_mi": distance_mi,
            })),
            ..Self::base(Kind::Station, source_mode)
        }
    }

    /// Create a weather result for a coordinate
    pub fn weather(lat: f64, lon: f64, weather: &WeatherSnapshot) -> Self {
        let summary = format!(
            "Weather @ {},{}: wind {} from {}, {}°{}, {}",
            lat,
            lon,
            weather.wind_speed,
            weather.wind_direction,
            weather.temperature,
            weather.temperature_unit,
            weather.short_forecast
        );

        let mut data = serde_json::to_value(weather).unwrap_or_default();
        if let Some(map) = data.as_object_mut() {
            map.insert(
                "wind_magnitude".to_string(),
                serde_json::json!(weather.wind_speed.magnitude()),
            );
            map.insert(
                "wind_unit".to_string(),
                serde_json::json!(weather.wind_speed.unit()),
            );
        }

        Self {
            subject: Some(format!("{},{}", lat, lon)),
            summary: Some(summary),
            data: Some(data),
            ..Self::base(Kind::Weather, SourceMode::Live)
        }
    }

    /// Create a geocoded location result
    pub fn location(query: &str, lat: f64, lon: f64, source_mode: SourceMode) -> Self {
        Self {
            subject: Some(query.to_string()),
            summary: Some(format!("Location '{}': {},{}", query, lat, lon)),
            data: Some(serde_json::json!({ "lat": lat, "lon": lon })),
            ..Self::base(Kind::Location, source_mode)
        }
    }

    /// Create a decision result
    pub fn decision(decision: &SailingDecision) -> Self {
        Self {
            summary: Some(decision.to_string()),
            data: serde_json::to_value(decision).ok(),
            ..Self::base(Kind::Decision, SourceMode::Derived)
        }
    }

    /// Create a cache bookkeeping result
    pub fn cache(key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            subject: Some(key.into()),
            summary: Some(summary.into()),
            ..Self::base(Kind::Cache, SourceMode::Cache)
        }
    }

    /// Create a new error result
    pub fn error(error: SailError) -> Self {
        Self {
            summary: Some(error.message.clone()),
            errors: vec![error],
            ..Self::base(Kind::Error, SourceMode::Derived)
        }
    }

    /// Set metadata
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }
}

/// Result set containing multiple result items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultItem;
    type IntoIter = std::vec::IntoIter<ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<ResultItem> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ResultItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

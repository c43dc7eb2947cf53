//! Sailing conditions - tide readings, weather snapshots and decisions
//!
//! These are the records that flow through the check pipeline. Tide and
//! weather records are produced by the fetchers, decisions by the evaluator.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Wire format NOAA uses for prediction timestamps
pub const NOAA_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Trailing unit word of a forecast wind speed ("10 mph", "5 to 10 kt")
static WIND_UNIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\S+\s.*?([A-Za-z][A-Za-z/]*)\s*$").expect("Invalid WIND_UNIT_RE regex")
});

/// High or low water
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideKind {
    #[serde(rename = "H", alias = "HH")]
    High,
    #[serde(rename = "L", alias = "LL")]
    Low,
}

impl TideKind {
    /// Parse a NOAA hilo code. Higher-high and lower-low fold into High and Low.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "H" | "HH" => Some(TideKind::High),
            "L" | "LL" => Some(TideKind::Low),
            _ => None,
        }
    }
}

impl fmt::Display for TideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TideKind::High => write!(f, "High"),
            TideKind::Low => write!(f, "Low"),
        }
    }
}

/// A single high/low tide prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TideReading {
    pub kind: TideKind,

    /// Station-local time of the extreme
    #[serde(serialize_with = "ser_noaa_time", deserialize_with = "de_noaa_time")]
    pub time: NaiveDateTime,

    /// Height in feet above MLLW
    pub height: f64,
}

fn ser_noaa_time<S: Serializer>(time: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&time.format(NOAA_TIME_FORMAT).to_string())
}

fn de_noaa_time<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(d)?;
    NaiveDateTime::parse_from_str(&raw, NOAA_TIME_FORMAT).map_err(serde::de::Error::custom)
}

/// The most recent and the upcoming tide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidePair {
    pub last: TideReading,
    pub next: TideReading,
}

impl TidePair {
    pub fn phase(&self) -> TidePhase {
        TidePhase::between(self.last.kind, self.next.kind)
    }
}

/// Direction the water is moving between two extremes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TidePhase {
    Rising,
    Falling,
    SlackHigh,
    SlackLow,
}

impl TidePhase {
    pub fn between(last: TideKind, next: TideKind) -> Self {
        match (last, next) {
            (TideKind::High, TideKind::Low) => TidePhase::Falling,
            (TideKind::Low, TideKind::High) => TidePhase::Rising,
            (TideKind::High, TideKind::High) => TidePhase::SlackHigh,
            (TideKind::Low, TideKind::Low) => TidePhase::SlackLow,
        }
    }
}

impl fmt::Display for TidePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TidePhase::Rising => "rising",
            TidePhase::Falling => "falling",
            TidePhase::SlackHigh => "high slack",
            TidePhase::SlackLow => "low slack",
        };
        f.write_str(label)
    }
}

/// Wind speed as reported upstream, e.g. "10 mph" or "5 to 10 mph"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindSpeed(String);

impl WindSpeed {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Leading whitespace-delimited token as a finite number
    pub fn magnitude(&self) -> Option<f64> {
        let value: f64 = self.0.split_whitespace().next()?.parse().ok()?;
        value.is_finite().then_some(value)
    }

    /// Trailing token, when the value carries one
    pub fn unit(&self) -> Option<&str> {
        WIND_UNIT_RE
            .captures(self.0.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl fmt::Display for WindSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_temperature_unit() -> String {
    "F".to_string()
}

/// Summary of the first forecast period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub wind_speed: WindSpeed,
    pub wind_direction: String,
    pub short_forecast: String,
    pub temperature: f64,
    #[serde(default = "default_temperature_unit")]
    pub temperature_unit: String,
}

/// Binary go/no-go outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Safe,
    Unsafe,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Safe => write!(f, "Safe"),
            Verdict::Unsafe => write!(f, "Unsafe"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SailingDecision {
    pub verdict: Verdict,
    pub reason: String,
}

impl SailingDecision {
    pub fn new(verdict: Verdict, reason: impl Into<String>) -> Self {
        Self {
            verdict,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SailingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sailing Decision: {} ({})", self.verdict, self.reason)
    }
}

//! Decision evaluator - tide + wind rules
//!
//! Rules, in order:
//! 1. Either record missing -> Unsafe, "Missing data."
//! 2. Wind above 25 (upstream units) -> Unsafe, "High wind speed."
//! 3. Otherwise Safe when the last tide was high, Unsafe when it was low.

use thiserror::Error;

use crate::core::conditions::{
    SailingDecision, TideKind, TidePair, Verdict, WeatherSnapshot,
};

/// Highest wind magnitude that still allows sailing
pub const MAX_WIND_SPEED: f64 = 25.0;

pub const REASON_MISSING_DATA: &str = "Missing data.";
pub const REASON_HIGH_WIND: &str = "High wind speed.";
pub const REASON_FAVORABLE: &str = "Tide and wind conditions are favorable.";

#[derive(Debug, Error, PartialEq)]
pub enum DecisionError {
    #[error("wind speed '{0}' does not start with a number")]
    InvalidWindSpeed(String),
}

/// Combine tide and weather records into a sailing decision
pub fn evaluate(
    tides: Option<&TidePair>,
    weather: Option<&WeatherSnapshot>,
) -> Result<SailingDecision, DecisionError> {
    let (tides, weather) = match (tides, weather) {
        (Some(tides), Some(weather)) => (tides, weather),
        _ => return Ok(SailingDecision::new(Verdict::Unsafe, REASON_MISSING_DATA)),
    };

    let wind = weather
        .wind_speed
        .magnitude()
        .ok_or_else(|| DecisionError::InvalidWindSpeed(weather.wind_speed.to_string()))?;

    if wind > MAX_WIND_SPEED {
        return Ok(SailingDecision::new(Verdict::Unsafe, REASON_HIGH_WIND));
    }

    let verdict = match tides.last.kind {
        TideKind::High => Verdict::Safe,
        TideKind::Low => Verdict::Unsafe,
    };
    Ok(SailingDecision::new(verdict, REASON_FAVORABLE))
}

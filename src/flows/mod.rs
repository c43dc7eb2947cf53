//! Flows module - Operations combining multiple sources
//!
//! Provides:
//! - decision: pure tide + wind rule evaluation
//! - lookup: place and station resolution, tides and weather reports
//! - check: fetch tides and weather, then decide

pub mod check;
pub mod decision;
pub mod lookup;

//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Sailing condition records (tides, weather, decisions)
//! - Unified result model (ResultItem)
//! - Rendering functions for different output formats
//! - Cache location helpers
//! - Common utilities

pub mod conditions;
pub mod model;
pub mod paths;
pub mod render;
pub mod util;

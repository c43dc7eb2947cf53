//! Cache module - Manages the .sailcheck/cache directory
//!
//! Provides:
//! - A key-value store with per-entry expiration (CacheStore)
//! - Disk-backed and disabled implementations
//! - Cache entry metadata

pub mod meta;
pub mod store;

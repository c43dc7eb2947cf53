//! Cache entry metadata

use serde::{Deserialize, Serialize};

/// Cache format version
pub const CACHE_VERSION: &str = "1";

/// One cached value as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache format version
    pub cache_version: String,

    /// Original (unhashed) key
    pub key: String,

    /// Cached payload
    pub value: serde_json::Value,

    /// When the entry was written (ms since epoch)
    pub written_at_ms: i64,

    /// When the entry stops being served (ms since epoch)
    pub expires_at_ms: i64,
}

impl CacheEntry {
    pub fn new(key: &str, value: serde_json::Value, written_at_ms: i64, ttl_ms: i64) -> Self {
        Self {
            cache_version: CACHE_VERSION.to_string(),
            key: key.to_string(),
            value,
            written_at_ms,
            expires_at_ms: written_at_ms.saturating_add(ttl_ms),
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

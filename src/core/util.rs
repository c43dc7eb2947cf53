//! Common utilities

use std::time::{Duration, SystemTime};
use xxhash_rust::xxh3::xxh3_64;

/// Stable hex digest used to turn cache keys into file names
pub fn hash_key(key: &str) -> String {
    format!("{:016x}", xxh3_64(key.as_bytes()))
}

/// Get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Duration as whole milliseconds, saturating
pub fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

//! Cache store - Key-value storage with expiration
//!
//! The cache is an explicit handle passed to the fetchers. `DiskCache` keeps
//! one JSON file per key under `.sailcheck/cache/`; `NoCache` stores nothing
//! and backs `--no-cache`.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::meta::{CacheEntry, CACHE_VERSION};
use crate::core::model::{Meta, ResultItem, ResultSet};
use crate::core::render::{RenderConfig, Renderer};
use crate::core::util::{duration_ms, hash_key, now_ms};

/// Cache file extension
pub const ENTRY_EXT: &str = "json";

/// Key-value cache with per-entry expiration
pub trait CacheStore {
    /// Live (unexpired) entry for a key
    fn entry(&self, key: &str) -> Option<CacheEntry>;

    /// Store a value, replacing any previous entry
    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()>;

    /// All stored entries, expired ones included
    fn entries(&self) -> Result<Vec<CacheEntry>>;

    /// Remove every entry, returning how many were removed
    fn clear(&self) -> Result<usize>;

    #[allow(dead_code)]
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entry(key).map(|entry| entry.value)
    }

    #[allow(dead_code)]
    fn contains_key(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }
}

/// A typed value read back from the cache
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub written_at_ms: i64,
    pub expires_at_ms: i64,
}

/// Read and deserialize a live entry. Entries of the wrong shape read as misses.
pub fn get_typed<T: DeserializeOwned>(cache: &dyn CacheStore, key: &str) -> Option<Cached<T>> {
    let entry = cache.entry(key)?;
    match serde_json::from_value(entry.value) {
        Ok(value) => Some(Cached {
            value,
            written_at_ms: entry.written_at_ms,
            expires_at_ms: entry.expires_at_ms,
        }),
        Err(e) => {
            warn!(key, error = %e, "cached value has unexpected shape, ignoring");
            None
        }
    }
}

/// Serialize and store a value
pub fn set_typed<T: Serialize>(
    cache: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<()> {
    let json = serde_json::to_value(value).context("Failed to serialize cache value")?;
    cache.set(key, json, ttl)
}

/// Disk-backed cache rooted at a directory
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", hash_key(key), ENTRY_EXT))
    }

    /// Ensure cache directory exists
    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("Failed to create cache directory: {:?}", self.dir))?;
        }
        Ok(())
    }

    fn read_entry(path: &Path) -> Option<CacheEntry> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) if entry.cache_version == CACHE_VERSION => Some(entry),
            Ok(entry) => {
                debug!(path = ?path, version = %entry.cache_version, "stale cache format");
                None
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "corrupt cache entry");
                None
            }
        }
    }

    fn entry_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for dirent in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read cache directory: {:?}", self.dir))?
        {
            let path = dirent?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXT) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl CacheStore for DiskCache {
    fn entry(&self, key: &str) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let entry = Self::read_entry(&path)?;
        // Hash collisions read as misses
        if entry.key != key {
            return None;
        }
        if entry.is_expired(now_ms()) {
            debug!(key, "cache entry expired");
            return None;
        }
        Some(entry)
    }

    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()> {
        self.ensure_dir()?;
        let entry = CacheEntry::new(key, value, now_ms(), duration_ms(ttl));
        let path = self.entry_path(key);
        let json = serde_json::to_string_pretty(&entry)?;

        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create cache file: {:?}", path))?;
        writeln!(file, "{}", json)?;
        debug!(key, ttl_secs = ttl.as_secs(), "cache entry written");
        Ok(())
    }

    fn entries(&self) -> Result<Vec<CacheEntry>> {
        Ok(self
            .entry_files()?
            .iter()
            .filter_map(|path| Self::read_entry(path))
            .collect())
    }

    fn clear(&self) -> Result<usize> {
        let files = self.entry_files()?;
        for path in &files {
            fs::remove_file(path)
                .with_context(|| format!("Failed to remove cache file: {:?}", path))?;
        }
        Ok(files.len())
    }
}

/// Cache that never stores anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl CacheStore for NoCache {
    fn entry(&self, _key: &str) -> Option<CacheEntry> {
        None
    }

    fn set(&self, _key: &str, _value: serde_json::Value, _ttl: Duration) -> Result<()> {
        Ok(())
    }

    fn entries(&self) -> Result<Vec<CacheEntry>> {
        Ok(Vec::new())
    }

    fn clear(&self) -> Result<usize> {
        Ok(0)
    }
}

/// Result item describing one stored entry
pub fn entry_item(entry: &CacheEntry, now_ms: i64) -> ResultItem {
    let status = if entry.is_expired(now_ms) {
        "expired".to_string()
    } else {
        let remaining_secs = (entry.expires_at_ms - now_ms) / 1000;
        format!("expires in {}m{:02}s", remaining_secs / 60, remaining_secs % 60)
    };

    ResultItem::cache(&entry.key, format!("{} ({})", entry.key, status)).with_meta(Meta {
        fetched_at_ms: Some(entry.written_at_ms),
        expires_at_ms: Some(entry.expires_at_ms),
    })
}

/// List stored entries
pub fn run_list(cache: &dyn CacheStore, config: RenderConfig) -> Result<()> {
    let now = now_ms();
    let result_set: ResultSet = cache
        .entries()?
        .iter()
        .map(|entry| entry_item(entry, now))
        .collect();

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}

/// Clear the cache
pub fn run_clear(cache: &dyn CacheStore, config: RenderConfig) -> Result<()> {
    let removed = cache.clear()?;

    let mut result_set = ResultSet::new();
    result_set.push(ResultItem::cache(
        "*",
        format!("Removed {} cache entr{}", removed, if removed == 1 { "y" } else { "ies" }),
    ));

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}

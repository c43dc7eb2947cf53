//! Cache location helpers

use std::path::{Path, PathBuf};

/// Name of the per-root state directory
pub const STATE_DIR: &str = ".sailcheck";

/// Get the .sailcheck state directory for a given root
pub fn state_dir(root: &Path) -> PathBuf {
    root.join(STATE_DIR)
}

/// Get the response cache directory for a given root
pub fn cache_dir(root: &Path) -> PathBuf {
    state_dir(root).join("cache")
}

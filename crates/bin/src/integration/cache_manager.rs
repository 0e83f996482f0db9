//! Cache manager for fetched series.
//!
//! Opens the SQLite series cache at a platform-specific default location.

use hobart_data::{DataError, SeriesCache};
use std::path::PathBuf;

/// Get the default cache directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/hobart/`
/// - macOS: `~/Library/Caches/hobart/`
/// - Windows: `%LOCALAPPDATA%\hobart\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hobart")
}

/// Get the cache database path.
pub(crate) fn cache_path() -> PathBuf {
    default_cache_dir().join("hobart.db")
}

/// Open the cache, creating the directory if needed.
pub(crate) fn open_cache() -> Result<SeriesCache, DataError> {
    let path = cache_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    SeriesCache::new(&path)
}

/// Print the cache location and contents.
pub(crate) fn print_cache_info() {
    println!("  Cache location: {}", cache_path().display());
    if !cache_path().exists() {
        println!("  Cached data: none");
        return;
    }
    match open_cache().and_then(|cache| cache.stats()) {
        Ok(stats) => println!(
            "  Cached data: {} observations for {} series",
            stats.observation_count, stats.series_count
        ),
        Err(e) => tracing::warn!(error = %e, "could not read cache statistics"),
    }
}

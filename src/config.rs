//! Configuration Module
//!
//! Construction-time settings for the file-backed cache tier.

use std::env;
use std::path::PathBuf;

/// File tier configuration.
///
/// All values can be loaded from environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCacheConfig {
    /// Base directory holding the sharded cache files
    pub cache_dir: PathBuf,
    /// Prepended to every derived file name
    pub prefix: String,
    /// Salts the file name hash. Not used for encryption or integrity.
    pub security_key: String,
}

impl FileCacheConfig {
    /// Builds a config, mapping an empty `cache_dir` to the system temp directory.
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        security_key: impl Into<String>,
    ) -> Self {
        Self {
            cache_dir: resolve_cache_dir(cache_dir.into()),
            prefix: prefix.into(),
            security_key: security_key.into(),
        }
    }

    /// Creates a new FileCacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Cache directory (default: system temp directory)
    /// - `CACHE_PREFIX` - File name prefix (default: empty)
    /// - `CACHE_SECURITY_KEY` - File name hash salt (default: empty)
    pub fn from_env() -> Self {
        Self::new(
            env::var("CACHE_DIR").unwrap_or_default(),
            env::var("CACHE_PREFIX").unwrap_or_default(),
            env::var("CACHE_SECURITY_KEY").unwrap_or_default(),
        )
    }
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self::new(PathBuf::new(), String::new(), String::new())
    }
}

fn resolve_cache_dir(dir: PathBuf) -> PathBuf {
    if dir.as_os_str().is_empty() {
        env::temp_dir()
    } else {
        dir
    }
}

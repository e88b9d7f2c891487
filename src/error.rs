//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::error::Error as StdError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Boxed source error shared between the returned error and the last-error slot.
pub type SharedSource = Arc<dyn StdError + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for both cache tiers.
///
/// Cloning is cheap: sources are reference counted so the same failure can be
/// handed back to the caller and kept in the cache's last-error slot.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Filesystem failure while reading, writing or removing a cache file
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// Cache item could not be serialized
    #[error("Encode error: {0}")]
    Encode(#[source] SharedSource),

    /// Cache file bytes could not be deserialized into a cache item
    #[error("Decode error: {0}")]
    Decode(#[source] SharedSource),
}

impl CacheError {
    pub(crate) fn io(path: &Path, err: io::Error) -> Self {
        CacheError::Io {
            path: path.to_path_buf(),
            source: Arc::new(err),
        }
    }

    pub fn encode<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        CacheError::Encode(Arc::new(err))
    }

    pub fn decode<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        CacheError::Decode(Arc::new(err))
    }

    /// True when the underlying I/O failure was a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

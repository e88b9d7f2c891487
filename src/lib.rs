//! Tiered Cache - a key/value cache with optional TTL expiry
//!
//! [`MemoryCache`] keeps entries in a map; [`FileCache`] wraps it and mirrors
//! every entry to a file so values survive a process restart.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Cache, CacheItem, Codec, FileCache, JsonCodec, MemoryCache};
pub use config::FileCacheConfig;
pub use error::{CacheError, Result};

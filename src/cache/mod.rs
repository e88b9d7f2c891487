//! Cache Module
//!
//! Two-tier key/value cache with lazy TTL expiry: an in-memory tier, and a
//! file tier that mirrors it to disk.

mod backend;
mod codec;
mod file;
mod item;
mod memory;


// Re-export public types
pub use backend::Cache;
pub use codec::{Codec, JsonCodec};
pub use file::FileCache;
pub use item::{current_timestamp, current_timestamp_ms, CacheItem};
pub use memory::MemoryCache;

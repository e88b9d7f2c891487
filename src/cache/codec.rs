//! Codec Module
//!
//! Serialization used by the file tier to store cache items on disk.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::CacheItem;
use crate::error::{CacheError, Result};

/// Turns cache items into bytes and back.
///
/// The file tier only relies on `decode(encode(item)) == item`; the byte format
/// is up to the implementation.
pub trait Codec: Send + Sync {
    fn encode<V: Serialize>(&self, item: &CacheItem<V>) -> Result<Vec<u8>>;

    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<CacheItem<V>>;
}

// == JSON Codec ==
/// Default codec, stores items as `{"Exp": .., "Val": ..}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<V: Serialize>(&self, item: &CacheItem<V>) -> Result<Vec<u8>> {
        serde_json::to_vec(item).map_err(CacheError::encode)
    }

    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<CacheItem<V>> {
        serde_json::from_slice(bytes).map_err(CacheError::decode)
    }
}

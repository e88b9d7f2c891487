//! File Tier Module
//!
//! Wraps a [`MemoryCache`] and mirrors every entry to its own file on disk so
//! cached values survive a restart.
//!
//! # Layout
//! `{cache_dir}/{hash[0..6]}/{prefix}{hash}.data`, where `hash` is the lowercase
//! hex MD5 of `security_key + key`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{Cache, CacheItem, Codec, JsonCodec, MemoryCache};
use crate::config::FileCacheConfig;
use crate::error::{CacheError, Result};

/// Length of the hash prefix used as the shard directory name.
const SHARD_LEN: usize = 6;

/// Extension of every cache file.
const FILE_EXT: &str = "data";

// == File Cache ==
/// Memory cache mirrored to disk, one file per key.
///
/// Memory is checked first; a miss falls back to the file and repopulates
/// memory on hit. Writes go to memory, then to disk.
///
/// Lock order: the file lock is always taken before the memory tier's lock.
pub struct FileCache<V, C = JsonCodec> {
    /// Hot entries, also owns the last-error slot
    memory: MemoryCache<V>,
    /// Serializes file I/O against memory updates
    file_lock: RwLock<()>,
    cache_dir: PathBuf,
    prefix: String,
    security_key: String,
    codec: C,
}

impl<V> FileCache<V, JsonCodec> {
    // == Constructors ==
    /// Creates a JSON-backed file cache. An empty `dir` maps to the system temp dir.
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        security_key: impl Into<String>,
    ) -> Self {
        Self::from_config(&FileCacheConfig::new(dir, prefix, security_key))
    }

    pub fn from_config(config: &FileCacheConfig) -> Self {
        Self::with_codec(config, JsonCodec)
    }
}

impl<V, C: Codec> FileCache<V, C> {
    /// Creates a file cache storing items with a custom codec.
    pub fn with_codec(config: &FileCacheConfig, codec: C) -> Self {
        debug!(cache_dir = ?config.cache_dir, prefix = %config.prefix, "File cache created");

        Self {
            memory: MemoryCache::new(),
            file_lock: RwLock::new(()),
            cache_dir: config.cache_dir.clone(),
            prefix: config.prefix.clone(),
            security_key: config.security_key.clone(),
            codec,
        }
    }

    // == Accessors ==
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of entries loaded in memory. Files not yet read are not counted.
    pub fn count(&self) -> usize {
        self.memory.count()
    }

    pub fn last_err(&self) -> Option<CacheError> {
        self.memory.last_err()
    }

    // == Get Filename ==
    /// Derives the file path for `key`.
    ///
    /// Pure: the same key, prefix and security key always give the same path.
    pub fn get_filename(&self, key: &str) -> PathBuf {
        let digest = if self.security_key.is_empty() {
            md5::compute(key)
        } else {
            md5::compute(format!("{}{}", self.security_key, key))
        };
        let hash = format!("{:x}", digest);

        self.cache_dir
            .join(&hash[..SHARD_LEN])
            .join(format!("{}{}.{}", self.prefix, hash, FILE_EXT))
    }

    /// Removes the file at `path`. A missing file is not an error.
    fn remove_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CacheError::io(path, err)),
        }
    }

    /// Deletes `key` from both tiers. Caller must hold the file write lock.
    fn del_locked(&self, key: &str) -> Result<()>
    where
        V: Clone,
    {
        let _ = self.memory.del(key);

        let path = self.get_filename(key);
        self.remove_file(&path)
            .map_err(|err| self.memory.record_err(err))?;
        debug!(key = %key, path = ?path, "Deleted cache file");
        Ok(())
    }
}

impl<V, C> FileCache<V, C>
where
    V: Clone + Serialize + DeserializeOwned,
    C: Codec,
{
    /// Reads and decodes the file at `path`. `Ok(None)` if there is no file.
    fn read_item(&self, path: &Path) -> Result<Option<CacheItem<V>>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CacheError::io(path, err)),
        };

        self.codec.decode(&bytes).map(Some)
    }

    /// Encodes `item` and writes it to `path`, creating the shard directory.
    fn write_item(&self, path: &Path, item: &CacheItem<V>) -> Result<()> {
        let bytes = self.codec.encode(item)?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|err| CacheError::io(dir, err))?;
        }
        fs::write(path, bytes).map_err(|err| CacheError::io(path, err))
    }

    /// Deletes `key` from both tiers if its file still holds an expired item.
    ///
    /// Re-checked under the write lock so a concurrent `set` is not undone.
    fn sweep_expired(&self, key: &str) {
        let _guard = self.file_lock.write();

        if self.memory.has(key) {
            return;
        }

        let path = self.get_filename(key);
        if let Ok(Some(item)) = self.read_item(&path) {
            if item.is_expired() {
                debug!(key = %key, "Swept expired cache file");
                let _ = self.del_locked(key);
            }
        }
    }
}

impl<V, C> Cache<V> for FileCache<V, C>
where
    V: Clone + Serialize + DeserializeOwned,
    C: Codec,
{
    // == Has ==
    /// Checks memory, then the file. Expired files count as absent and are removed.
    fn has(&self, key: &str) -> bool {
        if self.memory.has(key) {
            return true;
        }

        let live = {
            let _guard = self.file_lock.read();
            match self.read_item(&self.get_filename(key)) {
                Ok(Some(item)) => item.is_live(),
                Ok(None) => return false,
                Err(err) => {
                    self.memory.record_err(err);
                    return false;
                }
            }
        };

        if !live {
            self.sweep_expired(key);
        }
        live
    }

    // == Get ==
    /// A corrupt or unreadable file is reported as a miss; the cause is kept
    /// in [`last_err`](FileCache::last_err).
    fn get(&self, key: &str) -> Option<V> {
        if let Some(val) = self.memory.get(key) {
            return Some(val);
        }

        {
            let _guard = self.file_lock.read();
            let path = self.get_filename(key);

            let item = match self.read_item(&path) {
                Ok(Some(item)) => item,
                Ok(None) => {
                    debug!(key = %key, "Cache miss");
                    return None;
                }
                Err(err) => {
                    self.memory.record_err(err);
                    return None;
                }
            };

            if item.is_live() {
                debug!(
                    key = %key,
                    path = ?path,
                    ttl_remaining = ?item.ttl_remaining(),
                    "Loaded entry from file"
                );
                let val = item.val.clone();
                self.memory.insert_item(key, item);
                return Some(val);
            }
        }

        self.sweep_expired(key);
        None
    }

    // == Set ==
    /// The memory write is not rolled back if writing the file fails.
    fn set(&self, key: &str, val: V, ttl: Duration) -> Result<()> {
        let _guard = self.file_lock.write();

        let item = self.memory.store(key, val, ttl);
        let path = self.get_filename(key);

        self.write_item(&path, &item)
            .map_err(|err| self.memory.record_err(err))?;
        debug!(key = %key, path = ?path, "Wrote cache file");
        Ok(())
    }

    // == Delete ==
    fn del(&self, key: &str) -> Result<()> {
        let _guard = self.file_lock.write();
        self.del_locked(key)
    }

    // == Clear ==
    /// Removes the files of every key in memory, then the whole cache
    /// directory, including files of keys never loaded by this instance.
    ///
    /// Stops at the first file that cannot be removed, leaving the rest.
    fn clear(&self) -> Result<()> {
        let _guard = self.file_lock.write();

        for key in self.memory.keys() {
            let path = self.get_filename(&key);
            self.remove_file(&path)
                .map_err(|err| self.memory.record_err(err))?;
        }

        let _ = self.memory.clear();

        match fs::remove_dir_all(&self.cache_dir) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(self
                    .memory
                    .record_err(CacheError::io(&self.cache_dir, err)));
            }
        }

        info!(cache_dir = ?self.cache_dir, "Cleared file cache");
        Ok(())
    }
}

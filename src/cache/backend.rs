//! Cache Backend Trait
//!
//! The operation set shared by the memory and file tiers.

use std::time::Duration;

use crate::error::Result;

/// Key/value cache with per-entry TTL.
///
/// Implementors provide the single-key operations; the multi-key variants are
/// built on top of them.
pub trait Cache<V> {
    /// Returns true if a live entry exists for `key`.
    fn has(&self, key: &str) -> bool;

    /// Returns the value for `key` if present and not expired.
    fn get(&self, key: &str) -> Option<V>;

    /// Stores `val` under `key`, replacing any previous entry.
    /// A zero `ttl` means the entry never expires.
    fn set(&self, key: &str, val: V, ttl: Duration) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn del(&self, key: &str) -> Result<()>;

    /// Removes every entry.
    fn clear(&self) -> Result<()>;

    // == Multi-key Operations ==
    /// Looks up each key in order. The result is aligned with `keys`.
    fn get_multi<K: AsRef<str>>(&self, keys: &[K]) -> Vec<Option<V>> {
        keys.iter().map(|key| self.get(key.as_ref())).collect()
    }

    /// Stores each pair with the same TTL.
    ///
    /// Stops at the first failure; pairs stored before it stay stored.
    fn set_multi<I, K>(&self, values: I, ttl: Duration) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
    {
        for (key, val) in values {
            self.set(key.as_ref(), val, ttl)?;
        }
        Ok(())
    }

    /// Removes each key. Individual failures are not reported here; they remain
    /// visible through the tier's last error.
    fn del_multi<K: AsRef<str>>(&self, keys: &[K]) -> Result<()> {
        for key in keys {
            let _ = self.del(key.as_ref());
        }
        Ok(())
    }
}

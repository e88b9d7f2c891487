//! Cache Item Module
//!
//! Defines the unit of stored data with its absolute expiry time.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

// == Cache Item ==
/// A stored value with its expiry instant.
///
/// The serialized field names are kept as `Exp` and `Val` so cache files stay
/// readable across versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheItem<V> {
    /// Absolute expiry time (Unix seconds), 0 = never expires
    #[serde(rename = "Exp")]
    pub exp: i64,
    /// The stored value
    #[serde(rename = "Val")]
    pub val: V,
}

impl<V> CacheItem<V> {
    // == Constructors ==
    /// Creates an item that never expires.
    pub fn new(val: V) -> Self {
        Self { exp: 0, val }
    }

    /// Creates an item expiring `ttl` from now. A zero TTL means no expiry.
    ///
    /// Expiry is whole seconds: `now + ttl`, with sub-second parts of `ttl`
    /// dropped. The item is never live at or after `set time + ttl`.
    pub fn with_ttl(val: V, ttl: Duration) -> Self {
        if ttl.is_zero() {
            return Self::new(val);
        }

        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let exp = current_timestamp().saturating_add(ttl_secs);

        Self { exp, val }
    }

    // == Liveness ==
    /// True if the item has no expiry or its expiry is still in the future.
    pub fn is_live(&self) -> bool {
        self.exp == 0 || self.exp > current_timestamp()
    }

    /// Inverse of [`is_live`](Self::is_live).
    pub fn is_expired(&self) -> bool {
        !self.is_live()
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None if the item never expires.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the item has expired
    /// - `Some(remaining)` if the item has a TTL that hasn't elapsed
    /// - `None` if the item has no TTL
    pub fn ttl_remaining(&self) -> Option<Duration> {
        if self.exp == 0 {
            return None;
        }

        let remaining_ms = self
            .exp
            .saturating_mul(1000)
            .saturating_sub(current_timestamp_ms());
        Some(Duration::from_millis(remaining_ms.max(0) as u64))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Sleeps until the wall clock is in the first fifth of a second, so a test
/// can set and read an entry within the same second.
#[cfg(test)]
pub(crate) fn wait_for_second_start() {
    while current_timestamp_ms() % 1000 >= 200 {
        std::thread::sleep(Duration::from_millis(5));
    }
}

//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque store key produced by [`KeyCodec`](crate::cache::KeyCodec)
///
/// Two application keys with the same encoding address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(Vec<u8>);

impl CacheKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CacheKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    /// Shows the length and a short hex prefix, never the full key
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key[{}B:", self.0.len())?;
        for byte in self.0.iter().take(8) {
            write!(f, "{:02x}", byte)?;
        }
        if self.0.len() > 8 {
            write!(f, "..")?;
        }
        write!(f, "]")
    }
}

/// Point-in-time store counters for observability
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Number of inserts that created a new key
    pub keys_added: u64,

    /// Number of inserts that replaced an existing key
    pub keys_updated: u64,

    /// Number of keys removed by size pressure or ttl expiry
    pub keys_evicted: u64,

    /// Total cost admitted
    pub cost_added: u64,

    /// Total cost removed by eviction
    pub cost_evicted: u64,

    /// Inserts refused by the store
    pub sets_rejected: u64,

    /// Total number of lookups that found an entry
    pub hits: u64,

    /// Total number of lookups that found nothing
    pub misses: u64,
}

impl CacheMetrics {
    /// Fraction of lookups that were hits (0.0 - 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Inserts the store accepted
    pub fn sets_accepted(&self) -> u64 {
        self.keys_added + self.keys_updated
    }
}

impl fmt::Display for CacheMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheMetrics {{ hits: {}, misses: {}, hit_ratio: {:.2}, keys_added: {}, keys_updated: {}, keys_evicted: {}, sets_rejected: {} }}",
            self.hits,
            self.misses,
            self.hit_ratio(),
            self.keys_added,
            self.keys_updated,
            self.keys_evicted,
            self.sets_rejected
        )
    }
}

//! Bounded store contract and the default moka-backed implementation

use crate::cache::{
    config::CacheConfig,
    sequence::RecordedSequence,
    types::{CacheKey, CacheMetrics},
};
use moka::notification::RemovalCause;
use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use moka::Expiry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Bounded key/value store holding recorded sequences
///
/// Implementations own admission, eviction and cost accounting and must be
/// safe to call from many threads at once. Inserts may become visible to
/// `get` asynchronously.
pub trait Store: Send + Sync {
    /// Offer an entry with the given cost; returns whether it was accepted
    fn insert(&self, key: CacheKey, value: Arc<RecordedSequence>, cost: u64) -> bool;

    fn get(&self, key: &CacheKey) -> Option<Arc<RecordedSequence>>;

    /// Remove an entry; removing an absent key is a no-op
    fn delete(&self, key: &CacheKey);

    /// Remove every entry
    fn clear(&self);

    fn metrics(&self) -> CacheMetrics;

    /// Apply buffered writes and evictions, if the store buffers them
    fn flush(&self) {}
}

/// Value held by moka: the shared sequence plus its admission data
#[derive(Clone)]
struct StoredSequence {
    sequence: Arc<RecordedSequence>,
    cost: u32,
    ttl: Option<Duration>,
}

/// Per-entry expiry driven by the ttl chosen at insert time
struct EntryTtl;

impl Expiry<CacheKey, StoredSequence> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &StoredSequence,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &StoredSequence,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

#[derive(Default)]
struct StoreCounters {
    enabled: bool,
    keys_added: AtomicU64,
    keys_updated: AtomicU64,
    keys_evicted: AtomicU64,
    cost_added: AtomicU64,
    cost_evicted: AtomicU64,
    sets_rejected: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    /// Keys currently held; maintained even when metrics are disabled
    live_keys: AtomicU64,
}

impl StoreCounters {
    fn bump(&self, counter: &AtomicU64, by: u64) {
        if self.enabled {
            counter.fetch_add(by, Ordering::Relaxed);
        }
    }

    /// Claim room for one more key unless `max_keys` are already held
    fn reserve_key(&self, max_keys: u64) -> bool {
        self.live_keys
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                (held < max_keys).then_some(held + 1)
            })
            .is_ok()
    }

    fn release_key(&self) {
        let _ = self
            .live_keys
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                held.checked_sub(1)
            });
    }

    fn snapshot(&self) -> CacheMetrics {
        CacheMetrics {
            keys_added: self.keys_added.load(Ordering::Relaxed),
            keys_updated: self.keys_updated.load(Ordering::Relaxed),
            keys_evicted: self.keys_evicted.load(Ordering::Relaxed),
            cost_added: self.cost_added.load(Ordering::Relaxed),
            cost_evicted: self.cost_evicted.load(Ordering::Relaxed),
            sets_rejected: self.sets_rejected.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Upper bound on the map slots allocated up front
const INITIAL_CAPACITY_LIMIT: u64 = 1024;

/// Store backed by `moka::sync::Cache`
///
/// This implementation provides:
/// - TinyLFU admission with LRU eviction, weighted by entry cost
/// - A hard cap of `max_keys` entries; new keys beyond it are rejected
/// - Per-entry ttl (with jitter) when the config sets one
/// - Lock-free counters fed by an eviction listener
pub struct MokaStore {
    entries: Cache<CacheKey, StoredSequence>,
    config: CacheConfig,
    counters: Arc<StoreCounters>,
}

impl MokaStore {
    /// Create a store sized by the given configuration
    pub fn new(config: CacheConfig) -> Self {
        info!(
            "Initializing moka store: max_size_bytes={}, max_keys={}, ttl={:?}",
            config.max_size_bytes, config.max_keys, config.default_ttl
        );

        let counters = Arc::new(StoreCounters {
            enabled: config.enable_metrics,
            ..Default::default()
        });
        let listener_counters = Arc::clone(&counters);

        let entries = Cache::builder()
            .max_capacity(config.max_size_bytes)
            .initial_capacity(config.max_keys.min(INITIAL_CAPACITY_LIMIT) as usize)
            .weigher(|_key: &CacheKey, value: &StoredSequence| value.cost)
            .expire_after(EntryTtl)
            .eviction_listener(
                move |key: Arc<CacheKey>, value: StoredSequence, cause: RemovalCause| {
                    if cause != RemovalCause::Replaced {
                        listener_counters.release_key();
                    }
                    if cause.was_evicted() {
                        debug!("Evicted {} ({:?})", key, cause);
                        listener_counters.bump(&listener_counters.keys_evicted, 1);
                        listener_counters.bump(&listener_counters.cost_evicted, value.cost as u64);
                    }
                },
            )
            .build();

        Self {
            entries,
            config,
            counters,
        }
    }

    /// Approximate number of live entries
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Number of keys counted against `max_keys`
    pub fn live_keys(&self) -> u64 {
        self.counters.live_keys.load(Ordering::Acquire)
    }

    /// Approximate total cost of live entries
    pub fn weighted_size(&self) -> u64 {
        self.entries.weighted_size()
    }
}

impl Store for MokaStore {
    fn insert(&self, key: CacheKey, value: Arc<RecordedSequence>, cost: u64) -> bool {
        if cost > self.config.max_size_bytes || cost > u32::MAX as u64 {
            warn!(
                "Rejecting {}: cost {} exceeds capacity {}",
                key, cost, self.config.max_size_bytes
            );
            self.counters.bump(&self.counters.sets_rejected, 1);
            return false;
        }

        let stored = StoredSequence {
            sequence: value,
            cost: cost as u32,
            ttl: self.config.ttl_with_jitter(),
        };

        let max_keys = self.config.max_keys;
        if self.live_keys() >= max_keys && !self.entries.contains_key(&key) {
            // expired and size-evicted entries only release their slot once
            // pending maintenance has run
            self.entries.run_pending_tasks();
        }

        let counters = &self.counters;
        let outcome = self
            .entries
            .entry(key.clone())
            .and_compute_with(|existing| {
                if existing.is_some() || counters.reserve_key(max_keys) {
                    Op::Put(stored)
                } else {
                    Op::Nop
                }
            });

        match outcome {
            CompResult::Inserted(_) => {
                self.counters.bump(&self.counters.keys_added, 1);
                self.counters.bump(&self.counters.cost_added, cost);
                true
            }
            CompResult::ReplacedWith(_) => {
                self.counters.bump(&self.counters.keys_updated, 1);
                self.counters.bump(&self.counters.cost_added, cost);
                true
            }
            _ => {
                warn!("Rejecting {}: store already holds {} keys", key, max_keys);
                self.counters.bump(&self.counters.sets_rejected, 1);
                false
            }
        }
    }

    fn get(&self, key: &CacheKey) -> Option<Arc<RecordedSequence>> {
        match self.entries.get(key) {
            Some(stored) => {
                self.counters.bump(&self.counters.hits, 1);
                Some(stored.sequence)
            }
            None => {
                self.counters.bump(&self.counters.misses, 1);
                None
            }
        }
    }

    fn delete(&self, key: &CacheKey) {
        self.entries.invalidate(key);
    }

    fn clear(&self) {
        // invalidate_all defers removal to maintenance, which would keep the
        // cleared keys counted against max_keys
        let keys: Vec<Arc<CacheKey>> = self.entries.iter().map(|(key, _)| key).collect();
        for key in keys {
            self.entries.invalidate(key.as_ref());
        }
    }

    fn metrics(&self) -> CacheMetrics {
        self.counters.snapshot()
    }

    fn flush(&self) {
        self.entries.run_pending_tasks();
    }
}

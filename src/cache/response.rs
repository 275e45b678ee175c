//! Cache facade tying key encoding, the store, recorders and replayers together

use crate::cache::{
    config::CacheConfig,
    key::KeyCodec,
    recorder::Recorder,
    replayer::Replayer,
    sequence::RecordedSequence,
    store::{MokaStore, Store},
    types::{CacheKey, CacheMetrics},
};
use crate::error::{CacheError, Result};
use crate::reader::Reader;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Client-side cache of decoded responses
///
/// Construct one per client from a [`CacheConfig`] and share it behind an
/// `Arc`; there is no process-wide instance. Every operation taking a key
/// encodes it with [`KeyCodec`] and returns the encoding error unchanged.
///
/// Inserts may become visible to `get` asynchronously. Use
/// [`wait_for`](ResponseCache::wait_for) when a test or caller needs to observe
/// a fresh entry.
pub struct ResponseCache {
    config: CacheConfig,
    store: Arc<dyn Store>,
}

impl ResponseCache {
    /// Create a cache backed by a [`MokaStore`]
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate().map_err(CacheError::ConfigError)?;
        let store = Arc::new(MokaStore::new(config.clone()));
        Ok(Self::with_store(config, store))
    }

    /// Create a cache over any store implementation
    pub fn with_store(config: CacheConfig, store: Arc<dyn Store>) -> Self {
        info!("Initializing response cache with config: {:?}", config);
        Self { config, store }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Start capturing the values read from `inner`
    pub fn recorder<'a, R: Reader + ?Sized>(&'a self, inner: &'a mut R) -> Recorder<'a, R> {
        Recorder::new(self, inner)
    }

    /// Look up `key`; a hit yields a fresh [`Replayer`]
    pub fn get<K: Serialize + ?Sized>(&self, key: &K) -> Result<Option<Replayer>> {
        let encoded = KeyCodec::encode(key)?;
        Ok(self.lookup(&encoded))
    }

    /// Store `sequence` under `key`; returns whether the store accepted it
    pub fn set<K: Serialize + ?Sized>(&self, key: &K, sequence: RecordedSequence) -> Result<bool> {
        let encoded = KeyCodec::encode(key)?;
        Ok(self.store_encoded(encoded, sequence))
    }

    /// Remove the entry for `key`, if any
    pub fn clear<K: Serialize + ?Sized>(&self, key: &K) -> Result<()> {
        let encoded = KeyCodec::encode(key)?;
        debug!("Clearing {}", encoded);
        self.store.delete(&encoded);
        Ok(())
    }

    /// Remove every entry
    pub fn clear_all(&self) {
        info!("Clearing all cached responses");
        self.store.clear();
    }

    /// Point-in-time counters of the underlying store
    pub fn metrics(&self) -> CacheMetrics {
        self.store.metrics()
    }

    /// Ask the store to apply buffered writes and evictions
    pub fn flush(&self) {
        self.store.flush();
    }

    /// Poll for `key` up to `attempts` times, sleeping `backoff` between tries
    ///
    /// Returns `Ok(None)` if the entry never became visible.
    pub async fn wait_for<K: Serialize + ?Sized>(
        &self,
        key: &K,
        attempts: usize,
        backoff: Duration,
    ) -> Result<Option<Replayer>> {
        let encoded = KeyCodec::encode(key)?;

        for attempt in 1..=attempts {
            if let Some(replayer) = self.lookup(&encoded) {
                return Ok(Some(replayer));
            }
            if attempt < attempts {
                debug!(
                    "{} not visible yet (attempt {}/{}), retrying in {:?}",
                    encoded, attempt, attempts, backoff
                );
                tokio::time::sleep(backoff).await;
            }
        }

        Ok(None)
    }

    /// Run `read` against a cached replay of `key`, or against `live` on a miss
    ///
    /// On a hit the read logic runs against a [`Replayer`]. If the replay fails
    /// with an exhausted or type-mismatch error the entry is dropped and the
    /// read runs live. A live read is recorded and persisted only when it
    /// succeeds without any failed decoder reads.
    pub fn read_through<K, R, T, F>(&self, key: &K, live: &mut R, mut read: F) -> Result<T>
    where
        K: Serialize + ?Sized,
        R: Reader + ?Sized,
        F: FnMut(&mut dyn Reader) -> Result<T>,
    {
        let encoded = KeyCodec::encode(key)?;

        if let Some(mut replayer) = self.lookup(&encoded) {
            let rd: &mut dyn Reader = &mut replayer;
            match read(rd) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_replay_error() => {
                    warn!(
                        "Replay of {} failed, dropping entry and reading live: {}",
                        encoded, err
                    );
                    self.store.delete(&encoded);
                }
                Err(err) => return Err(err),
            }
        }

        let mut recorder = Recorder::new(self, live);
        let value = {
            let rd: &mut dyn Reader = &mut recorder;
            read(rd)?
        };

        if recorder.failed_reads() == 0 {
            self.store_encoded(encoded, recorder.into_sequence());
        } else {
            warn!(
                "Not caching {}: {} read(s) failed during capture",
                encoded,
                recorder.failed_reads()
            );
        }

        Ok(value)
    }

    fn lookup(&self, key: &CacheKey) -> Option<Replayer> {
        match self.store.get(key) {
            Some(sequence) => {
                debug!(
                    "Cache hit: {} ({} values, captured {:?} ago)",
                    key,
                    sequence.len(),
                    sequence.age()
                );
                Some(Replayer::new(sequence))
            }
            None => {
                debug!("Cache miss: {}", key);
                None
            }
        }
    }

    pub(crate) fn store_encoded(&self, key: CacheKey, sequence: RecordedSequence) -> bool {
        let cost = (key.len() + sequence.size_bytes()) as u64;
        let values = sequence.len();
        let accepted = self.store.insert(key.clone(), Arc::new(sequence), cost);

        if accepted {
            debug!("Stored {} ({} values, cost {})", key, values, cost);
        } else {
            warn!("Store rejected {} (cost {})", key, cost);
        }
        accepted
    }
}

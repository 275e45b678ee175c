//! # Record/Replay Response Cache
//!
//! This module caches the *typed values* a protocol decoder produced while
//! parsing a response, rather than the response bytes. A cache hit hands back a
//! [`Replayer`] that implements the same [`Reader`](crate::reader::Reader)
//! contract as the live decoder, so response parsing code runs unchanged.
//!
//! ## Components
//!
//! - [`KeyCodec`]: application key to opaque [`CacheKey`]
//! - [`RecordedSequence`]: ordered [`RecordedValue`]s, the unit of storage
//! - [`Recorder`]: decorates a live reader and captures what it reads
//! - [`Replayer`]: serves a captured sequence with per-read kind checks
//! - [`Store`] / [`MokaStore`]: bounded concurrent storage
//! - [`ResponseCache`]: the facade tying them together
//!
//! ## Example
//!
//! ```rust
//! use reply_cache::cache::{CacheConfig, ResponseCache};
//! use reply_cache::reader::Reader;
//!
//! # fn example(live: &mut dyn Reader) -> anyhow::Result<()> {
//! let cache = ResponseCache::new(
//!     CacheConfig::builder()
//!         .max_keys(1000)
//!         .max_size_bytes(1 << 20)
//!         .build(),
//! )?;
//!
//! // Capture a live read
//! let mut recorder = cache.recorder(live);
//! let pong = recorder.read_string()?;
//! recorder.persist(&["PING"])?;
//!
//! // Replay it later without touching the connection
//! if let Some(mut replayer) = cache.get(&["PING"])? {
//!     assert_eq!(replayer.read_string()?, pong);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod key;
pub mod recorder;
pub mod replayer;
pub mod response;
pub mod sequence;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use key::KeyCodec;
pub use recorder::Recorder;
pub use replayer::Replayer;
pub use response::ResponseCache;
pub use sequence::{RecordedSequence, RecordedValue, ValueKind};
pub use store::{MokaStore, Store};
pub use types::{CacheKey, CacheMetrics};

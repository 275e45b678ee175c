//! # reply-cache
//!
//! A client-side response cache for request/response protocol clients.
//!
//! Instead of caching raw bytes, the cache records the sequence of typed values
//! a decoder extracts while parsing one response. A cache hit replays that
//! sequence through the same [`Reader`] interface the response parser already
//! uses, with no network round trip and no re-parsing.
//!
//! ## Features
//!
//! - Recorder and replayer decorators over any [`Reader`]
//! - Type-checked replay: every read must match the kind that was recorded
//! - Canonical key encoding for any `serde::Serialize` key
//! - Bounded storage with TinyLFU admission, cost weighting and optional ttl
//! - Read-through helper that falls back to a live read when a replay fails
//!
//! ## Read-through
//!
//! ```no_run
//! use reply_cache::{CacheConfig, Reader, ResponseCache};
//!
//! fn read_pong(rd: &mut dyn Reader) -> reply_cache::Result<String> {
//!     rd.read_string()
//! }
//!
//! # fn example(conn: &mut dyn Reader) -> anyhow::Result<()> {
//! let cache = ResponseCache::new(CacheConfig::default())?;
//!
//! // First call reads from `conn` and records; later calls replay.
//! let pong = cache.read_through(&["PING"], conn, read_pong)?;
//! println!("{}", pong);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod reader;

// Re-export main types for convenience
pub use cache::{
    CacheConfig, CacheConfigBuilder, CacheKey, CacheMetrics, KeyCodec, MokaStore, RecordedSequence,
    RecordedValue, Recorder, Replayer, ResponseCache, Store, ValueKind,
};
pub use error::{CacheError, Result};
pub use reader::{Reader, Reply};

//! Error types for cache operations
//!
//! This module defines the error type shared by the key codec, the recorder,
//! the replayer and the cache facade. Live decoders report their failures
//! through [`CacheError::DecodeError`] so that a recorder can pass them through
//! unchanged.

use crate::cache::sequence::ValueKind;
use thiserror::Error;

/// Main error type for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// The application key could not be serialized into a cache key
    #[error("Key encoding error: {0}")]
    EncodeError(#[from] serde_json::Error),

    /// A replay read went past the end of the cached sequence
    #[error("no more data available in the cached value")]
    ExhaustedError,

    /// A replay read asked for a different kind than the one that was recorded
    #[error("type mismatch in cached value, expected {expected}, got {actual}")]
    TypeMismatchError { expected: ValueKind, actual: ValueKind },

    /// Error reported by a live protocol decoder
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// The capture saw failed reads and cannot be stored
    #[error("Capture is incomplete: {failed_reads} read(s) failed while recording")]
    IncompleteCaptureError { failed_reads: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CacheError {
    /// Whether this error was raised while replaying a cached sequence.
    ///
    /// Replay errors mean the cached entry does not match what the read logic
    /// expects; the caller can drop the entry and read live instead.
    pub fn is_replay_error(&self) -> bool {
        matches!(
            self,
            CacheError::ExhaustedError | CacheError::TypeMismatchError { .. }
        )
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

//! Application key encoding
//!
//! Keys are encoded with `serde_json`, which gives a canonical byte form for
//! strings, numbers, tuples, structs and ordered maps. `HashMap` keys iterate in
//! an unspecified order; use `BTreeMap` when a map is part of a key.

use crate::cache::types::CacheKey;
use crate::error::Result;
use serde::Serialize;

/// Serializes application keys into store keys
pub struct KeyCodec;

impl KeyCodec {
    /// Encode `key` into a [`CacheKey`]
    ///
    /// Fails with [`CacheError::EncodeError`](crate::error::CacheError::EncodeError)
    /// when the key has no serializable form.
    pub fn encode<K: Serialize + ?Sized>(key: &K) -> Result<CacheKey> {
        let bytes = serde_json::to_vec(key)?;
        Ok(CacheKey::from_bytes(bytes))
    }
}

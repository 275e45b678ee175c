//! Shared helpers for integration tests

#![allow(dead_code)]

use reply_cache::{CacheError, Reader, Replayer, Reply, ResponseCache, Result};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Live reader returning the same canned values for every call
#[derive(Debug, Default)]
pub struct MockReader {
    /// Number of value reads served so far
    pub reads: usize,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reader for MockReader {
    fn peek(&mut self, n: usize) -> Result<Vec<u8>> {
        self.reads += 1;
        Ok(vec![b'a'; n])
    }

    fn peek_reply_type(&mut self) -> Result<u8> {
        self.reads += 1;
        Ok(b'x')
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        self.reads += 1;
        Ok(b"line".to_vec())
    }

    fn read_reply(&mut self) -> Result<Reply> {
        self.reads += 1;
        Ok(Reply::String("reply".to_string()))
    }

    fn read_int(&mut self) -> Result<i64> {
        self.reads += 1;
        Ok(42)
    }

    fn read_uint(&mut self) -> Result<u64> {
        self.reads += 1;
        Ok(42)
    }

    fn read_float(&mut self) -> Result<f64> {
        self.reads += 1;
        Ok(2.5)
    }

    fn read_string(&mut self) -> Result<String> {
        self.reads += 1;
        Ok("foo".to_string())
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.reads += 1;
        Ok(true)
    }

    fn read_slice(&mut self) -> Result<Vec<Reply>> {
        self.reads += 1;
        Ok(vec![Reply::String("slice".to_string())])
    }

    fn read_fixed_array_len(&mut self, fixed_len: usize) -> Result<()> {
        if fixed_len != 1 {
            return Err(CacheError::DecodeError("unexpected length".to_string()));
        }
        Ok(())
    }

    fn read_array_len(&mut self) -> Result<usize> {
        self.reads += 1;
        Ok(1)
    }

    fn read_fixed_map_len(&mut self, fixed_len: usize) -> Result<()> {
        if fixed_len != 1 {
            return Err(CacheError::DecodeError("unexpected length".to_string()));
        }
        Ok(())
    }

    fn read_map_len(&mut self) -> Result<usize> {
        self.reads += 1;
        Ok(1)
    }

    fn discard_next(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Key that refuses to serialize, standing in for channels or closures
pub struct Unserializable;

impl Serialize for Unserializable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Err(S::Error::custom("value of this type cannot be encoded"))
    }
}

/// Wait for a key to appear, compensating for asynchronous store inserts
pub async fn wait_get<K: Serialize + ?Sized>(cache: &ResponseCache, key: &K) -> Option<Replayer> {
    cache
        .wait_for(key, 10, Duration::from_millis(10))
        .await
        .ok()
        .flatten()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

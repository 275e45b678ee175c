//! Demonstrates recording and replaying decoded responses
//!
//! This example shows how to:
//! - Capture the reads of a live decoder with a recorder
//! - Replay them from the cache without touching the connection
//! - Use read-through to combine both steps
//!
//! Run with `RUST_LOG=debug` to see cache hits and misses.

use reply_cache::{CacheConfig, CacheError, Reader, Reply, ResponseCache, Result};
use std::collections::VecDeque;
use std::time::Duration;

/// Decoder over a scripted list of replies, standing in for a socket
struct ScriptedReader {
    replies: VecDeque<Reply>,
    reads: usize,
}

impl ScriptedReader {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: replies.into(),
            reads: 0,
        }
    }

    fn next(&mut self) -> Result<Reply> {
        self.reads += 1;
        self.replies
            .pop_front()
            .ok_or_else(|| CacheError::DecodeError("connection closed".to_string()))
    }
}

impl Reader for ScriptedReader {
    fn peek(&mut self, n: usize) -> Result<Vec<u8>> {
        let text = self.replies.front().map(|r| r.to_string()).unwrap_or_default();
        Ok(text.into_bytes().into_iter().take(n).collect())
    }

    fn peek_reply_type(&mut self) -> Result<u8> {
        match self.replies.front() {
            Some(Reply::Int(_)) => Ok(b':'),
            Some(Reply::Array(_)) => Ok(b'*'),
            Some(Reply::Map(_)) => Ok(b'%'),
            Some(_) => Ok(b'$'),
            None => Err(CacheError::DecodeError("connection closed".to_string())),
        }
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        Ok(self.next()?.to_string().into_bytes())
    }

    fn read_reply(&mut self) -> Result<Reply> {
        self.next()
    }

    fn read_int(&mut self) -> Result<i64> {
        match self.next()? {
            Reply::Int(n) => Ok(n),
            other => Err(CacheError::DecodeError(format!("expected int, got {}", other))),
        }
    }

    fn read_uint(&mut self) -> Result<u64> {
        let n = self.read_int()?;
        u64::try_from(n).map_err(|e| CacheError::DecodeError(e.to_string()))
    }

    fn read_float(&mut self) -> Result<f64> {
        match self.next()? {
            Reply::Float(f) => Ok(f),
            other => Err(CacheError::DecodeError(format!("expected float, got {}", other))),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        match self.next()? {
            Reply::String(s) | Reply::Status(s) => Ok(s),
            other => Err(CacheError::DecodeError(format!("expected string, got {}", other))),
        }
    }

    fn read_bool(&mut self) -> Result<bool> {
        match self.next()? {
            Reply::Bool(b) => Ok(b),
            Reply::Int(n) => Ok(n != 0),
            other => Err(CacheError::DecodeError(format!("expected bool, got {}", other))),
        }
    }

    fn read_slice(&mut self) -> Result<Vec<Reply>> {
        match self.next()? {
            Reply::Array(items) => Ok(items),
            other => Err(CacheError::DecodeError(format!("expected array, got {}", other))),
        }
    }

    fn read_fixed_array_len(&mut self, fixed_len: usize) -> Result<()> {
        let len = self.read_array_len()?;
        if len != fixed_len {
            return Err(CacheError::DecodeError(format!(
                "got {} elements, wanted {}",
                len, fixed_len
            )));
        }
        Ok(())
    }

    fn read_array_len(&mut self) -> Result<usize> {
        match self.next()? {
            Reply::Int(n) if n >= 0 => Ok(n as usize),
            other => Err(CacheError::DecodeError(format!("expected length, got {}", other))),
        }
    }

    fn read_fixed_map_len(&mut self, fixed_len: usize) -> Result<()> {
        self.read_fixed_array_len(fixed_len)
    }

    fn read_map_len(&mut self) -> Result<usize> {
        self.read_array_len()
    }

    fn discard_next(&mut self) -> Result<()> {
        self.next().map(|_| ())
    }
}

/// Parse an `HGETALL`-style reply of field/value pairs
fn read_hash(rd: &mut dyn Reader) -> Result<Vec<(String, String)>> {
    let len = rd.read_map_len()?;
    let mut fields = Vec::with_capacity(len);
    for _ in 0..len {
        let field = rd.read_string()?;
        let value = rd.read_string()?;
        fields.push((field, value));
    }
    Ok(fields)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cache = ResponseCache::new(
        CacheConfig::builder()
            .max_keys(1000)
            .max_size_bytes(1 << 20)
            .default_ttl(Duration::from_secs(60))
            .build(),
    )?;

    // 1. Record a live read
    println!("1. Recording GET greeting...");
    let mut conn = ScriptedReader::new(vec![Reply::String("hello".to_string())]);
    let mut recorder = cache.recorder(&mut conn);
    let greeting = recorder.read_string()?;
    recorder.persist(&["GET", "greeting"])?;
    println!("   Live value: {}", greeting);

    // 2. Replay it
    println!("\n2. Replaying GET greeting...");
    match cache.wait_for(&["GET", "greeting"], 10, Duration::from_millis(10)).await? {
        Some(mut replayer) => println!("   Replayed value: {}", replayer.read_string()?),
        None => println!("   Entry not visible yet"),
    }

    // 3. A mismatched read is reported, not coerced
    println!("\n3. Reading the cached string as an int...");
    if let Some(mut replayer) = cache.get(&["GET", "greeting"])? {
        match replayer.read_int() {
            Ok(n) => println!("   Unexpected int: {}", n),
            Err(e) => println!("   Rejected: {}", e),
        }
    }

    // 4. Read-through
    println!("\n4. Read-through HGETALL user:1...");
    let mut conn = ScriptedReader::new(vec![
        Reply::Int(2),
        Reply::String("name".to_string()),
        Reply::String("ada".to_string()),
        Reply::String("lang".to_string()),
        Reply::String("rust".to_string()),
    ]);
    let key = ("HGETALL", "user:1");

    let first = cache.read_through(&key, &mut conn, read_hash)?;
    println!("   First call: {:?} ({} live reads)", first, conn.reads);

    cache.wait_for(&key, 10, Duration::from_millis(10)).await?;
    let second = cache.read_through(&key, &mut conn, read_hash)?;
    println!("   Second call: {:?} ({} live reads)", second, conn.reads);

    // 5. Metrics
    println!("\n5. Metrics");
    println!("   {}", cache.metrics());

    cache.clear_all();
    println!("\n✓ Demo complete");

    Ok(())
}

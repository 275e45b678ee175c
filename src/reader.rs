//! Decoder contract shared by live protocol decoders, recorders and replayers
//!
//! A [`Reader`] is handed to response-parsing code after the protocol layer has
//! already created it. The cache never constructs readers; it only decorates an
//! existing one ([`Recorder`](crate::cache::Recorder)) or stands in for one
//! ([`Replayer`](crate::cache::Replayer)).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A generic decoded reply of arbitrary shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reply {
    /// Null bulk string or null array
    Nil,

    /// Simple status line such as `OK` or `PONG`
    Status(String),

    /// Bulk or verbatim string
    String(String),

    /// Integer reply
    Int(i64),

    /// Double reply
    Float(f64),

    /// Boolean reply
    Bool(bool),

    /// Ordered list of replies
    Array(Vec<Reply>),

    /// Key/value pairs in wire order
    Map(Vec<(Reply, Reply)>),
}

impl Reply {
    /// Approximate heap footprint of this reply in bytes
    pub fn size_bytes(&self) -> usize {
        let own = std::mem::size_of::<Reply>();
        match self {
            Reply::Nil | Reply::Int(_) | Reply::Float(_) | Reply::Bool(_) => own,
            Reply::Status(s) | Reply::String(s) => own + s.len(),
            Reply::Array(items) => own + items.iter().map(Reply::size_bytes).sum::<usize>(),
            Reply::Map(pairs) => {
                own + pairs
                    .iter()
                    .map(|(k, v)| k.size_bytes() + v.size_bytes())
                    .sum::<usize>()
            }
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Nil => write!(f, "(nil)"),
            Reply::Status(s) => write!(f, "{}", s),
            Reply::String(s) => write!(f, "{:?}", s),
            Reply::Int(i) => write!(f, "(integer) {}", i),
            Reply::Float(x) => write!(f, "(double) {}", x),
            Reply::Bool(b) => write!(f, "({})", b),
            Reply::Array(items) => write!(f, "(array, {} items)", items.len()),
            Reply::Map(pairs) => write!(f, "(map, {} pairs)", pairs.len()),
        }
    }
}

/// Typed read operations used by commands to parse their responses
///
/// The trait is object safe so response parsers can take `&mut dyn Reader`
/// and run unchanged against a live decoder, a recorder or a replayer.
pub trait Reader {
    /// Look at the next `n` bytes without consuming them
    fn peek(&mut self, n: usize) -> Result<Vec<u8>>;

    /// Look at the reply type marker of the next reply
    fn peek_reply_type(&mut self) -> Result<u8>;

    /// Read one protocol line
    fn read_line(&mut self) -> Result<Vec<u8>>;

    /// Read a reply of arbitrary shape
    fn read_reply(&mut self) -> Result<Reply>;

    fn read_int(&mut self) -> Result<i64>;

    fn read_uint(&mut self) -> Result<u64>;

    fn read_float(&mut self) -> Result<f64>;

    fn read_string(&mut self) -> Result<String>;

    fn read_bool(&mut self) -> Result<bool>;

    /// Read an array reply as a heterogeneous list
    fn read_slice(&mut self) -> Result<Vec<Reply>>;

    /// Consume an array header and assert its length
    fn read_fixed_array_len(&mut self, fixed_len: usize) -> Result<()>;

    fn read_array_len(&mut self) -> Result<usize>;

    /// Consume a map header and assert its length
    fn read_fixed_map_len(&mut self, fixed_len: usize) -> Result<()>;

    fn read_map_len(&mut self) -> Result<usize>;

    /// Skip the next reply entirely
    fn discard_next(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_size_grows_with_payload() {
        let small = Reply::String("a".to_string());
        let large = Reply::String("a".repeat(100));
        assert!(large.size_bytes() > small.size_bytes());

        let nested = Reply::Array(vec![small.clone(), large.clone()]);
        assert!(nested.size_bytes() > small.size_bytes() + large.size_bytes());
    }

    #[test]
    fn test_reply_display() {
        assert_eq!(Reply::Nil.to_string(), "(nil)");
        assert_eq!(Reply::Status("PONG".to_string()).to_string(), "PONG");
        assert_eq!(Reply::Int(7).to_string(), "(integer) 7");
        assert_eq!(
            Reply::Map(vec![(Reply::Int(1), Reply::Nil)]).to_string(),
            "(map, 1 pairs)"
        );
    }
}

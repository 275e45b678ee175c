//! Recorded values and the ordered sequence that is stored per response

use crate::reader::Reply;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Discriminant of a [`RecordedValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Raw bytes from `peek` or `read_line`
    Bytes,

    /// Reply type marker from `peek_reply_type`
    Byte,

    Reply,
    Int,
    Uint,
    Float,
    String,
    Bool,

    /// Heterogeneous list from `read_slice`
    Slice,

    /// Array or map length
    Len,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bytes => write!(f, "bytes"),
            ValueKind::Byte => write!(f, "byte"),
            ValueKind::Reply => write!(f, "reply"),
            ValueKind::Int => write!(f, "int"),
            ValueKind::Uint => write!(f, "uint"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::String => write!(f, "string"),
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Slice => write!(f, "slice"),
            ValueKind::Len => write!(f, "len"),
        }
    }
}

/// One value produced by a decoder read, tagged with its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordedValue {
    Bytes(Vec<u8>),
    Byte(u8),
    Reply(Reply),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Bool(bool),
    Slice(Vec<Reply>),
    Len(usize),
}

impl RecordedValue {
    /// The kind tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            RecordedValue::Bytes(_) => ValueKind::Bytes,
            RecordedValue::Byte(_) => ValueKind::Byte,
            RecordedValue::Reply(_) => ValueKind::Reply,
            RecordedValue::Int(_) => ValueKind::Int,
            RecordedValue::Uint(_) => ValueKind::Uint,
            RecordedValue::Float(_) => ValueKind::Float,
            RecordedValue::String(_) => ValueKind::String,
            RecordedValue::Bool(_) => ValueKind::Bool,
            RecordedValue::Slice(_) => ValueKind::Slice,
            RecordedValue::Len(_) => ValueKind::Len,
        }
    }

    /// Placeholder recorded when a live read of `kind` fails
    pub fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bytes => RecordedValue::Bytes(Vec::new()),
            ValueKind::Byte => RecordedValue::Byte(0),
            ValueKind::Reply => RecordedValue::Reply(Reply::Nil),
            ValueKind::Int => RecordedValue::Int(0),
            ValueKind::Uint => RecordedValue::Uint(0),
            ValueKind::Float => RecordedValue::Float(0.0),
            ValueKind::String => RecordedValue::String(String::new()),
            ValueKind::Bool => RecordedValue::Bool(false),
            ValueKind::Slice => RecordedValue::Slice(Vec::new()),
            ValueKind::Len => RecordedValue::Len(0),
        }
    }

    /// View this value as a generic reply
    ///
    /// Byte strings that are not UTF-8 are converted lossily; integers too
    /// large for `i64` become their decimal string.
    pub fn to_reply(&self) -> Reply {
        match self {
            RecordedValue::Reply(r) => r.clone(),
            RecordedValue::Bytes(b) => Reply::String(String::from_utf8_lossy(b).into_owned()),
            RecordedValue::Byte(b) => Reply::Int(i64::from(*b)),
            RecordedValue::Int(i) => Reply::Int(*i),
            RecordedValue::Uint(u) => i64::try_from(*u)
                .map(Reply::Int)
                .unwrap_or_else(|_| Reply::String(u.to_string())),
            RecordedValue::Float(f) => Reply::Float(*f),
            RecordedValue::String(s) => Reply::String(s.clone()),
            RecordedValue::Bool(b) => Reply::Bool(*b),
            RecordedValue::Slice(items) => Reply::Array(items.clone()),
            RecordedValue::Len(n) => i64::try_from(*n)
                .map(Reply::Int)
                .unwrap_or_else(|_| Reply::String(n.to_string())),
        }
    }

    /// Approximate size of this value in bytes, used as store cost
    pub fn size_bytes(&self) -> usize {
        let own = std::mem::size_of::<RecordedValue>();
        match self {
            RecordedValue::Bytes(b) => own + b.len(),
            RecordedValue::String(s) => own + s.len(),
            RecordedValue::Reply(r) => own + r.size_bytes(),
            RecordedValue::Slice(items) => own + items.iter().map(Reply::size_bytes).sum::<usize>(),
            RecordedValue::Byte(_)
            | RecordedValue::Int(_)
            | RecordedValue::Uint(_)
            | RecordedValue::Float(_)
            | RecordedValue::Bool(_)
            | RecordedValue::Len(_) => own,
        }
    }
}

/// Ordered values captured while decoding one response
///
/// Read order during replay must match `values` exactly. Once handed to the
/// store a sequence is shared behind an `Arc` and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedSequence {
    values: Vec<RecordedValue>,

    /// When the capture started
    captured_at: DateTime<Utc>,
}

impl RecordedSequence {
    /// Create an empty sequence stamped with the current time
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            captured_at: Utc::now(),
        }
    }

    /// Build a sequence from already recorded values
    pub fn from_values(values: Vec<RecordedValue>) -> Self {
        Self {
            values,
            captured_at: Utc::now(),
        }
    }

    pub(crate) fn push(&mut self, value: RecordedValue) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RecordedValue> {
        self.values.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecordedValue> {
        self.values.iter()
    }

    /// Kind tags in capture order
    pub fn kinds(&self) -> Vec<ValueKind> {
        self.values.iter().map(RecordedValue::kind).collect()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Time since the capture started
    pub fn age(&self) -> Duration {
        (Utc::now() - self.captured_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    /// Approximate size of the sequence in bytes
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<RecordedSequence>()
            + self.values.iter().map(RecordedValue::size_bytes).sum::<usize>()
    }
}

impl Default for RecordedSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a RecordedSequence {
    type Item = &'a RecordedValue;
    type IntoIter = std::slice::Iter<'a, RecordedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

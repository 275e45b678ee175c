//! Reader that serves values from a stored sequence instead of the network

use crate::cache::sequence::{RecordedSequence, RecordedValue, ValueKind};
use crate::error::{CacheError, Result};
use crate::reader::{Reader, Reply};
use std::sync::Arc;

/// Replays a [`RecordedSequence`] through the [`Reader`] interface
///
/// Each value read takes the next recorded value, in capture order. A read of
/// the wrong kind fails with [`CacheError::TypeMismatchError`] and still
/// consumes the value. `read_reply` is the exception: it accepts any recorded
/// value and returns it as a generic [`Reply`]. Structural reads always
/// succeed and consume nothing.
///
/// A replayer is a single-use cursor; get a fresh one from the cache for every
/// replay.
#[derive(Debug)]
pub struct Replayer {
    sequence: Arc<RecordedSequence>,
    cursor: usize,
}

impl Replayer {
    pub fn new(sequence: Arc<RecordedSequence>) -> Self {
        Self {
            sequence,
            cursor: 0,
        }
    }

    /// Number of values already consumed
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Number of values left to replay
    pub fn remaining(&self) -> usize {
        self.sequence.len().saturating_sub(self.cursor)
    }

    pub fn sequence(&self) -> &RecordedSequence {
        &self.sequence
    }

    fn pop(&mut self) -> Result<&RecordedValue> {
        let index = self.cursor;
        if index >= self.sequence.len() {
            return Err(CacheError::ExhaustedError);
        }
        self.cursor += 1;
        self.sequence.get(index).ok_or(CacheError::ExhaustedError)
    }
}

fn mismatch<T>(expected: ValueKind, actual: &RecordedValue) -> Result<T> {
    Err(CacheError::TypeMismatchError {
        expected,
        actual: actual.kind(),
    })
}

macro_rules! replay_as {
    ($self:ident, $variant:ident) => {
        match $self.pop()? {
            RecordedValue::$variant(value) => Ok(value.clone()),
            other => mismatch(ValueKind::$variant, other),
        }
    };
}

impl Reader for Replayer {
    fn peek(&mut self, _n: usize) -> Result<Vec<u8>> {
        replay_as!(self, Bytes)
    }

    fn peek_reply_type(&mut self) -> Result<u8> {
        replay_as!(self, Byte)
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        replay_as!(self, Bytes)
    }

    fn read_reply(&mut self) -> Result<Reply> {
        Ok(self.pop()?.to_reply())
    }

    fn read_int(&mut self) -> Result<i64> {
        replay_as!(self, Int)
    }

    fn read_uint(&mut self) -> Result<u64> {
        replay_as!(self, Uint)
    }

    fn read_float(&mut self) -> Result<f64> {
        replay_as!(self, Float)
    }

    fn read_string(&mut self) -> Result<String> {
        replay_as!(self, String)
    }

    fn read_bool(&mut self) -> Result<bool> {
        replay_as!(self, Bool)
    }

    fn read_slice(&mut self) -> Result<Vec<Reply>> {
        replay_as!(self, Slice)
    }

    fn read_fixed_array_len(&mut self, _fixed_len: usize) -> Result<()> {
        Ok(())
    }

    fn read_array_len(&mut self) -> Result<usize> {
        replay_as!(self, Len)
    }

    fn read_fixed_map_len(&mut self, _fixed_len: usize) -> Result<()> {
        Ok(())
    }

    fn read_map_len(&mut self) -> Result<usize> {
        replay_as!(self, Len)
    }

    fn discard_next(&mut self) -> Result<()> {
        Ok(())
    }
}

//! Reader decorator that captures every decoded value

use crate::cache::key::KeyCodec;
use crate::cache::response::ResponseCache;
use crate::cache::sequence::{RecordedSequence, RecordedValue, ValueKind};
use crate::error::{CacheError, Result};
use crate::reader::{Reader, Reply};
use serde::Serialize;
use tracing::warn;

/// Wraps a live [`Reader`] and records the values it produces
///
/// The recorder only sees calls made through it; it borrows a reader the
/// protocol layer already created. Every value read is forwarded, appended to
/// the capture and returned unchanged. Structural reads are forwarded and not
/// recorded.
///
/// Use one recorder per response. The capture only grows.
pub struct Recorder<'a, R: Reader + ?Sized> {
    cache: &'a ResponseCache,
    inner: &'a mut R,
    sequence: RecordedSequence,
    failed_reads: usize,
}

impl<'a, R: Reader + ?Sized> Recorder<'a, R> {
    pub fn new(cache: &'a ResponseCache, inner: &'a mut R) -> Self {
        Self {
            cache,
            inner,
            sequence: RecordedSequence::new(),
            failed_reads: 0,
        }
    }

    /// Values captured so far
    pub fn sequence(&self) -> &RecordedSequence {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Number of live reads that returned an error during capture
    pub fn failed_reads(&self) -> usize {
        self.failed_reads
    }

    /// Release the live reader and keep the capture
    pub fn into_sequence(self) -> RecordedSequence {
        self.sequence
    }

    /// Store the capture under `key`
    ///
    /// Returns whether the store accepted the entry. The key is encoded first,
    /// so an unencodable key fails with `EncodeError` and the store is never
    /// touched. A capture that saw a failed read is refused with
    /// `IncompleteCaptureError`: its placeholders cannot be told apart from
    /// real zero values on replay.
    pub fn persist<K: Serialize + ?Sized>(&self, key: &K) -> Result<bool> {
        let encoded = KeyCodec::encode(key)?;

        if self.failed_reads > 0 {
            warn!(
                "Not persisting {}: {} read(s) failed during capture",
                encoded, self.failed_reads
            );
            return Err(CacheError::IncompleteCaptureError {
                failed_reads: self.failed_reads,
            });
        }

        Ok(self.cache.store_encoded(encoded, self.sequence.clone()))
    }

    fn capture<T>(
        &mut self,
        kind: ValueKind,
        result: Result<T>,
        to_value: impl FnOnce(&T) -> RecordedValue,
    ) -> Result<T> {
        match &result {
            Ok(value) => self.sequence.push(to_value(value)),
            Err(_) => {
                self.failed_reads += 1;
                self.sequence.push(RecordedValue::zero(kind));
            }
        }
        result
    }
}

macro_rules! record {
    ($self:ident, $read:expr, $variant:ident) => {{
        let result = $read;
        $self.capture(ValueKind::$variant, result, |value| {
            RecordedValue::$variant(value.clone())
        })
    }};
}

impl<'a, R: Reader + ?Sized> Reader for Recorder<'a, R> {
    fn peek(&mut self, n: usize) -> Result<Vec<u8>> {
        record!(self, self.inner.peek(n), Bytes)
    }

    fn peek_reply_type(&mut self) -> Result<u8> {
        record!(self, self.inner.peek_reply_type(), Byte)
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        record!(self, self.inner.read_line(), Bytes)
    }

    fn read_reply(&mut self) -> Result<Reply> {
        record!(self, self.inner.read_reply(), Reply)
    }

    fn read_int(&mut self) -> Result<i64> {
        record!(self, self.inner.read_int(), Int)
    }

    fn read_uint(&mut self) -> Result<u64> {
        record!(self, self.inner.read_uint(), Uint)
    }

    fn read_float(&mut self) -> Result<f64> {
        record!(self, self.inner.read_float(), Float)
    }

    fn read_string(&mut self) -> Result<String> {
        record!(self, self.inner.read_string(), String)
    }

    fn read_bool(&mut self) -> Result<bool> {
        record!(self, self.inner.read_bool(), Bool)
    }

    fn read_slice(&mut self) -> Result<Vec<Reply>> {
        record!(self, self.inner.read_slice(), Slice)
    }

    fn read_fixed_array_len(&mut self, fixed_len: usize) -> Result<()> {
        self.inner.read_fixed_array_len(fixed_len)
    }

    fn read_array_len(&mut self) -> Result<usize> {
        record!(self, self.inner.read_array_len(), Len)
    }

    fn read_fixed_map_len(&mut self, fixed_len: usize) -> Result<()> {
        self.inner.read_fixed_map_len(fixed_len)
    }

    fn read_map_len(&mut self) -> Result<usize> {
        record!(self, self.inner.read_map_len(), Len)
    }

    fn discard_next(&mut self) -> Result<()> {
        self.inner.discard_next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::config::CacheConfig;

    /// Live reader returning fixed values
    struct StubReader {
        fail_strings: bool,
    }

    impl Reader for StubReader {
        fn peek(&mut self, n: usize) -> Result<Vec<u8>> {
            Ok(vec![b'a'; n])
        }
        fn peek_reply_type(&mut self) -> Result<u8> {
            Ok(b'x')
        }
        fn read_line(&mut self) -> Result<Vec<u8>> {
            Ok(b"line".to_vec())
        }
        fn read_reply(&mut self) -> Result<Reply> {
            Ok(Reply::String("reply".to_string()))
        }
        fn read_int(&mut self) -> Result<i64> {
            Ok(42)
        }
        fn read_uint(&mut self) -> Result<u64> {
            Ok(42)
        }
        fn read_float(&mut self) -> Result<f64> {
            Ok(2.5)
        }
        fn read_string(&mut self) -> Result<String> {
            if self.fail_strings {
                Err(CacheError::DecodeError("unexpected eof".to_string()))
            } else {
                Ok("foo".to_string())
            }
        }
        fn read_bool(&mut self) -> Result<bool> {
            Ok(true)
        }
        fn read_slice(&mut self) -> Result<Vec<Reply>> {
            Ok(vec![Reply::String("slice".to_string())])
        }
        fn read_fixed_array_len(&mut self, fixed_len: usize) -> Result<()> {
            if fixed_len == 1 {
                Ok(())
            } else {
                Err(CacheError::DecodeError("unexpected length".to_string()))
            }
        }
        fn read_array_len(&mut self) -> Result<usize> {
            Ok(1)
        }
        fn read_fixed_map_len(&mut self, fixed_len: usize) -> Result<()> {
            self.read_fixed_array_len(fixed_len)
        }
        fn read_map_len(&mut self) -> Result<usize> {
            Ok(1)
        }
        fn discard_next(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn cache() -> ResponseCache {
        ResponseCache::new(CacheConfig::small()).unwrap()
    }

    #[test]
    fn test_records_every_value_read_in_order() {
        let cache = cache();
        let mut live = StubReader { fail_strings: false };
        let mut recorder = cache.recorder(&mut live);

        assert_eq!(recorder.peek(3).unwrap(), b"aaa".to_vec());
        assert_eq!(recorder.peek_reply_type().unwrap(), b'x');
        assert_eq!(recorder.read_array_len().unwrap(), 1);
        assert_eq!(recorder.read_string().unwrap(), "foo");
        assert_eq!(recorder.read_float().unwrap(), 2.5);

        assert_eq!(
            recorder.sequence().kinds(),
            vec![
                ValueKind::Bytes,
                ValueKind::Byte,
                ValueKind::Len,
                ValueKind::String,
                ValueKind::Float,
            ]
        );
        assert_eq!(recorder.failed_reads(), 0);
    }

    #[test]
    fn test_structural_reads_are_forwarded_not_recorded() {
        let cache = cache();
        let mut live = StubReader { fail_strings: false };
        let mut recorder = cache.recorder(&mut live);

        recorder.read_fixed_array_len(1).unwrap();
        recorder.read_fixed_map_len(1).unwrap();
        recorder.discard_next().unwrap();
        assert!(recorder.is_empty());

        // the live error comes back untouched
        let err = recorder.read_fixed_array_len(2).unwrap_err();
        assert!(matches!(err, CacheError::DecodeError(ref m) if m == "unexpected length"));
        assert!(recorder.is_empty());
        assert_eq!(recorder.failed_reads(), 0);
    }

    #[test]
    fn test_decode_error_is_passed_through_and_recorded() {
        let cache = cache();
        let mut live = StubReader { fail_strings: true };
        let mut recorder = cache.recorder(&mut live);

        let err = recorder.read_string().unwrap_err();
        assert!(matches!(err, CacheError::DecodeError(_)));
        assert_eq!(recorder.len(), 1);
        assert_eq!(
            recorder.sequence().get(0),
            Some(&RecordedValue::String(String::new()))
        );
        assert_eq!(recorder.failed_reads(), 1);
    }

    #[test]
    fn test_persist_refuses_incomplete_capture() {
        let cache = cache();
        let mut live = StubReader { fail_strings: true };
        let mut recorder = cache.recorder(&mut live);
        let _ = recorder.read_string();

        let err = recorder.persist("k").unwrap_err();
        assert!(matches!(
            err,
            CacheError::IncompleteCaptureError { failed_reads: 1 }
        ));
        assert_eq!(cache.metrics().keys_added, 0);
    }

    #[test]
    fn test_persist_stores_capture() {
        let cache = cache();
        let mut live = StubReader { fail_strings: false };
        let mut recorder = cache.recorder(&mut live);
        recorder.read_int().unwrap();

        assert!(recorder.persist("k").unwrap());
        assert_eq!(cache.metrics().keys_added, 1);

        let sequence = recorder.into_sequence();
        assert_eq!(sequence.get(0), Some(&RecordedValue::Int(42)));
    }

    #[test]
    fn test_recorder_over_trait_object() {
        let cache = cache();
        let mut live = StubReader { fail_strings: false };
        let live: &mut dyn Reader = &mut live;
        let mut recorder = Recorder::new(&cache, live);

        assert_eq!(recorder.read_slice().unwrap().len(), 1);
        assert_eq!(recorder.len(), 1);
    }
}

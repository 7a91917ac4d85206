//! Cursor-based wire decoder with strict type checking.
//!
//! [`InputBuffer`] consumes the payload of one message. Every read checks
//! the stored type tag against the requested kind; a mismatch or a
//! truncated payload is a hard [`Error`](crate::error::Error), never
//! undefined behavior or silently wrong data.

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

use super::{OutputBuffer, ValueKind};

// ============================================================================
// InputBuffer
// ============================================================================

/// Decoder over one received message payload.
///
/// Reads must mirror the write order of the producing [`OutputBuffer`]
/// exactly. The decoder keeps a cursor; partially consumed buffers stay
/// usable for the remaining fields.
///
/// # Example
///
/// ```
/// use adblock_ipc::wire::{InputBuffer, OutputBuffer};
///
/// let mut out = OutputBuffer::new();
/// out.write_str("hello").write_i32(7);
///
/// let mut input = InputBuffer::from(out);
/// assert_eq!(input.read_str().unwrap(), "hello");
/// assert_eq!(input.read_i32().unwrap(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct InputBuffer {
    /// Full message payload.
    bytes: Vec<u8>,
    /// Read cursor into `bytes`.
    position: usize,
}

impl InputBuffer {
    /// Creates a decoder over a received payload.
    #[inline]
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, position: 0 }
    }

    /// Returns the number of unread bytes.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Returns `true` if every byte has been consumed.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Peeks at the type tag of the next field without consuming it.
    ///
    /// Used by dynamically typed fields (pref values) to pick a decode path.
    ///
    /// # Errors
    ///
    /// - [`Error::UnexpectedEof`] if no field remains
    /// - [`Error::Decode`] if the tag is unknown
    pub fn peek_kind(&self) -> Result<ValueKind> {
        let end = self.position.checked_add(4).ok_or(Error::UnexpectedEof)?;
        if end > self.bytes.len() {
            return Err(Error::UnexpectedEof);
        }
        let tag = i32::from_le_bytes(
            self.bytes[self.position..end]
                .try_into()
                .map_err(|_| Error::UnexpectedEof)?,
        );
        ValueKind::from_tag(tag).ok_or_else(|| Error::decode(format!("unknown type tag {tag}")))
    }

    /// Reads a UTF-8 string field.
    ///
    /// # Errors
    ///
    /// Decode error on type mismatch, truncation, or invalid UTF-8.
    pub fn read_str(&mut self) -> Result<String> {
        self.check_kind(ValueKind::Utf8)?;
        let length = self.read_raw_u32()? as usize;
        let bytes = self.take(length)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::decode("invalid UTF-8 in string field"))
    }

    /// Reads a UTF-16 string field.
    ///
    /// # Errors
    ///
    /// Decode error on type mismatch, truncation, or unpaired surrogates.
    pub fn read_wide_str(&mut self) -> Result<String> {
        self.check_kind(ValueKind::Utf16)?;
        let count = self.read_raw_u32()? as usize;
        let bytes = self.take(count.checked_mul(2).ok_or(Error::UnexpectedEof)?)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units)
            .map_err(|_| Error::decode("invalid UTF-16 in wide string field"))
    }

    /// Reads a signed 64-bit integer field.
    ///
    /// # Errors
    ///
    /// Decode error on type mismatch or truncation.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.check_kind(ValueKind::Int64)?;
        let bytes = self.take(8)?;
        Ok(i64::from_le_bytes(
            bytes.try_into().map_err(|_| Error::UnexpectedEof)?,
        ))
    }

    /// Reads a signed 32-bit integer field.
    ///
    /// # Errors
    ///
    /// Decode error on type mismatch or truncation.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.check_kind(ValueKind::Int32)?;
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes(
            bytes.try_into().map_err(|_| Error::UnexpectedEof)?,
        ))
    }

    /// Reads a boolean field.
    ///
    /// # Errors
    ///
    /// Decode error on type mismatch, truncation, or a byte other than 0/1.
    pub fn read_bool(&mut self) -> Result<bool> {
        self.check_kind(ValueKind::Bool)?;
        let bytes = self.take(1)?;
        match bytes[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::decode(format!("invalid bool byte {other}"))),
        }
    }

    /// Reads a sequence of UTF-8 strings.
    ///
    /// # Errors
    ///
    /// Decode error on type mismatch, truncation, or a negative count.
    pub fn read_strings(&mut self) -> Result<Vec<String>> {
        let count = self.read_i32()?;
        if count < 0 {
            return Err(Error::decode(format!("negative sequence count {count}")));
        }
        // Cap pre-allocation; trust len only after decoding succeeds.
        let mut values = Vec::with_capacity((count as usize).min(1024));
        for _ in 0..count {
            values.push(self.read_str()?);
        }
        Ok(values)
    }

    /// Consumes the next type tag and verifies it.
    fn check_kind(&mut self, expected: ValueKind) -> Result<()> {
        let found = self.peek_kind()?;
        if found != expected {
            return Err(Error::UnexpectedType { expected, found });
        }
        self.position += 4;
        Ok(())
    }

    /// Reads a raw (untagged) little-endian u32, used for length prefixes.
    fn read_raw_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(
            bytes.try_into().map_err(|_| Error::UnexpectedEof)?,
        ))
    }

    /// Takes `length` raw bytes off the cursor.
    fn take(&mut self, length: usize) -> Result<&[u8]> {
        let end = self.position.checked_add(length).ok_or(Error::UnexpectedEof)?;
        if end > self.bytes.len() {
            return Err(Error::UnexpectedEof);
        }
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }
}

impl From<OutputBuffer> for InputBuffer {
    /// Wraps an encoder's contents for decoding, without copying through
    /// the transport. Used heavily in tests and in-process dispatch.
    fn from(buffer: OutputBuffer) -> Self {
        Self::new(buffer.into_bytes())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<F: FnOnce(&mut OutputBuffer)>(f: F) -> InputBuffer {
        let mut out = OutputBuffer::new();
        f(&mut out);
        InputBuffer::from(out)
    }

    #[test]
    fn test_round_trip_all_kinds() {
        let mut input = encode(|out| {
            out.write_str("utf8")
                .write_wide_str("wide ✓")
                .write_i64(-1)
                .write_i32(i32::MIN)
                .write_bool(true)
                .write_strings(&["a", "b", "c"]);
        });

        assert_eq!(input.read_str().unwrap(), "utf8");
        assert_eq!(input.read_wide_str().unwrap(), "wide ✓");
        assert_eq!(input.read_i64().unwrap(), -1);
        assert_eq!(input.read_i32().unwrap(), i32::MIN);
        assert!(input.read_bool().unwrap());
        assert_eq!(input.read_strings().unwrap(), vec!["a", "b", "c"]);
        assert!(input.is_exhausted());
    }

    #[test]
    fn test_round_trip_empty_string() {
        let mut input = encode(|out| {
            out.write_str("");
        });
        assert_eq!(input.read_str().unwrap(), "");
    }

    #[test]
    fn test_round_trip_large_string() {
        let large = "x".repeat(4 * 1024 * 1024);
        let mut input = encode(|out| {
            out.write_str(&large);
        });
        assert_eq!(input.read_str().unwrap(), large);
    }

    #[test]
    fn test_round_trip_empty_sequence() {
        let mut input = encode(|out| {
            out.write_strings::<&str>(&[]);
        });
        assert!(input.read_strings().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_sequence_with_delimiters() {
        let values = ["a\0b", "", "tab\tand\nnewline"];
        let mut input = encode(|out| {
            out.write_strings(&values);
        });
        assert_eq!(input.read_strings().unwrap(), values);
    }

    #[test]
    fn test_wrong_order_is_type_error() {
        let mut input = encode(|out| {
            out.write_i32(42).write_str("after");
        });

        let err = input.read_str().unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedType {
                expected: ValueKind::Utf8,
                found: ValueKind::Int32,
            }
        ));

        // The mismatched field is still readable with the right type.
        assert_eq!(input.read_i32().unwrap(), 42);
        assert_eq!(input.read_str().unwrap(), "after");
    }

    #[test]
    fn test_read_past_end_is_eof() {
        let mut input = encode(|out| {
            out.write_bool(false);
        });
        assert!(!input.read_bool().unwrap());
        assert!(matches!(input.read_bool().unwrap_err(), Error::UnexpectedEof));
    }

    #[test]
    fn test_truncated_payload_is_eof() {
        let mut out = OutputBuffer::new();
        out.write_str("truncate me");
        let mut bytes = out.into_bytes();
        bytes.truncate(bytes.len() - 3);

        let mut input = InputBuffer::new(bytes);
        assert!(matches!(input.read_str().unwrap_err(), Error::UnexpectedEof));
    }

    #[test]
    fn test_unknown_tag_is_decode_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&99i32.to_le_bytes());
        let mut input = InputBuffer::new(bytes);
        assert!(input.read_i32().unwrap_err().is_decode_error());
    }

    #[test]
    fn test_invalid_bool_byte() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&ValueKind::Bool.tag().to_le_bytes());
        bytes.push(2);
        let mut input = InputBuffer::new(bytes);
        assert!(matches!(input.read_bool().unwrap_err(), Error::Decode { .. }));
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&ValueKind::Utf8.tag().to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0xff, 0xfe]);
        let mut input = InputBuffer::new(bytes);
        assert!(matches!(input.read_str().unwrap_err(), Error::Decode { .. }));
    }

    #[test]
    fn test_peek_kind_does_not_consume() {
        let input = encode(|out| {
            out.write_i64(5);
        });
        assert_eq!(input.peek_kind().unwrap(), ValueKind::Int64);
        assert_eq!(input.peek_kind().unwrap(), ValueKind::Int64);
    }

    #[test]
    fn test_negative_sequence_count() {
        let mut out = OutputBuffer::new();
        out.write_i32(-1);
        let mut input = InputBuffer::from(out);
        assert!(input.read_strings().unwrap_err().is_decode_error());
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn prop_str_round_trip(text in ".*") {
                let mut out = OutputBuffer::new();
                out.write_str(&text);
                let mut input = InputBuffer::from(out);
                prop_assert_eq!(input.read_str().unwrap(), text);
                prop_assert!(input.is_exhausted());
            }

            #[test]
            fn prop_wide_str_round_trip(text in ".*") {
                let mut out = OutputBuffer::new();
                out.write_wide_str(&text);
                let mut input = InputBuffer::from(out);
                prop_assert_eq!(input.read_wide_str().unwrap(), text);
            }

            #[test]
            fn prop_scalar_round_trip(a in any::<i64>(), b in any::<i32>(), c in any::<bool>()) {
                let mut out = OutputBuffer::new();
                out.write_i64(a).write_i32(b).write_bool(c);
                let mut input = InputBuffer::from(out);
                prop_assert_eq!(input.read_i64().unwrap(), a);
                prop_assert_eq!(input.read_i32().unwrap(), b);
                prop_assert_eq!(input.read_bool().unwrap(), c);
            }

            #[test]
            fn prop_string_sequence_round_trip(items in proptest::collection::vec(".*", 0..16)) {
                let mut out = OutputBuffer::new();
                out.write_strings(&items);
                let mut input = InputBuffer::from(out);
                prop_assert_eq!(input.read_strings().unwrap(), items);
            }

            #[test]
            fn prop_truncation_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
                let mut input = InputBuffer::new(bytes);
                // Arbitrary bytes must fail cleanly, never panic.
                let _ = input.read_str();
                let _ = input.read_i64();
                let _ = input.read_bool();
            }
        }
    }
}

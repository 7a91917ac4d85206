//! Append-only wire encoder.
//!
//! [`OutputBuffer`] builds the payload of one message. Fields are appended
//! with their type tag; the finished buffer is handed to the transport as a
//! single length-prefixed frame.

// ============================================================================
// Imports
// ============================================================================

use super::ValueKind;

// ============================================================================
// OutputBuffer
// ============================================================================

/// Encoder for one wire message payload.
///
/// Append operations cannot fail; the buffer grows as needed. The field
/// order chosen here is the schema — the decoder must mirror it exactly.
///
/// # Example
///
/// ```
/// use adblock_ipc::wire::OutputBuffer;
///
/// let mut buffer = OutputBuffer::new();
/// buffer.write_str("http://example.com/ad.png");
/// buffer.write_i32(3);
/// buffer.write_bool(true);
/// assert!(!buffer.as_bytes().is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct OutputBuffer {
    /// Accumulated payload bytes.
    bytes: Vec<u8>,
}

impl OutputBuffer {
    /// Creates an empty buffer.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Returns the encoded payload bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the buffer and returns the encoded payload.
    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns the encoded payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing has been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Appends a UTF-8 string field.
    pub fn write_str(&mut self, value: &str) -> &mut Self {
        self.write_tag(ValueKind::Utf8);
        let bytes = value.as_bytes();
        self.bytes.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Appends a UTF-16 string field.
    ///
    /// The payload carries UTF-16 code units, matching the legacy wide
    /// string encoding on the wire.
    pub fn write_wide_str(&mut self, value: &str) -> &mut Self {
        self.write_tag(ValueKind::Utf16);
        let units: Vec<u16> = value.encode_utf16().collect();
        self.bytes.extend_from_slice(&(units.len() as u32).to_le_bytes());
        for unit in units {
            self.bytes.extend_from_slice(&unit.to_le_bytes());
        }
        self
    }

    /// Appends a signed 64-bit integer field.
    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.write_tag(ValueKind::Int64);
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends a signed 32-bit integer field.
    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.write_tag(ValueKind::Int32);
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends a boolean field.
    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.write_tag(ValueKind::Bool);
        self.bytes.push(u8::from(value));
        self
    }

    /// Appends a sequence of UTF-8 strings.
    ///
    /// Encoded as an i32 count followed by each element as a tagged string.
    pub fn write_strings<S: AsRef<str>>(&mut self, values: &[S]) -> &mut Self {
        self.write_i32(values.len() as i32);
        for value in values {
            self.write_str(value.as_ref());
        }
        self
    }

    /// Appends a raw type tag.
    fn write_tag(&mut self, kind: ValueKind) {
        self.bytes.extend_from_slice(&kind.tag().to_le_bytes());
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Binary wire codec.
//!
//! Encodes and decodes a fixed set of value kinds into a contiguous byte
//! buffer. Every field is written as a 4-byte type tag followed by its
//! payload, and must be read back in exactly the order and type it was
//! written — a mismatched read is a decode error, never silent garbage.
//!
//! # Wire Encodings
//!
//! | Kind | Tag | Payload |
//! |------|-----|---------|
//! | UTF-8 string | 0 | u32 byte length + raw bytes |
//! | UTF-16 string | 1 | u32 code unit count + u16 LE code units |
//! | int64 | 2 | 8 bytes LE |
//! | int32 | 3 | 4 bytes LE |
//! | bool | 4 | 1 byte (0/1) |
//!
//! String sequences are an i32 count followed by that many tagged UTF-8
//! strings ([`OutputBuffer::write_strings`] / [`InputBuffer::read_strings`]).
//!
//! # Round-Trip Law
//!
//! For every supported kind and value, `decode(encode(x)) == x` — including
//! empty strings, zero-length sequences, and multi-megabyte payloads (the
//! only size ceiling is the 32-bit length field).

// ============================================================================
// Submodules
// ============================================================================

/// Append-only encoder producing a contiguous byte sequence.
pub mod output;

/// Cursor-based decoder with strict type checking.
pub mod input;

// ============================================================================
// Re-exports
// ============================================================================

pub use input::InputBuffer;
pub use output::OutputBuffer;

// ============================================================================
// ValueKind
// ============================================================================

/// Type tag preceding every encoded field.
///
/// Tag values are part of the wire contract and must never be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ValueKind {
    /// UTF-8 string.
    Utf8 = 0,
    /// UTF-16 string (wide string on the legacy side).
    Utf16 = 1,
    /// Signed 64-bit integer.
    Int64 = 2,
    /// Signed 32-bit integer.
    Int32 = 3,
    /// Boolean.
    Bool = 4,
}

impl ValueKind {
    /// Returns the kind for a raw wire tag, or `None` for unknown tags.
    #[inline]
    #[must_use]
    pub const fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(Self::Utf8),
            1 => Some(Self::Utf16),
            2 => Some(Self::Int64),
            3 => Some(Self::Int32),
            4 => Some(Self::Bool),
            _ => None,
        }
    }

    /// Returns the raw wire tag for this kind.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> i32 {
        self as i32
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_values_are_stable() {
        assert_eq!(ValueKind::Utf8.tag(), 0);
        assert_eq!(ValueKind::Utf16.tag(), 1);
        assert_eq!(ValueKind::Int64.tag(), 2);
        assert_eq!(ValueKind::Int32.tag(), 3);
        assert_eq!(ValueKind::Bool.tag(), 4);
    }

    #[test]
    fn test_from_tag_round_trip() {
        for kind in [
            ValueKind::Utf8,
            ValueKind::Utf16,
            ValueKind::Int64,
            ValueKind::Int32,
            ValueKind::Bool,
        ] {
            assert_eq!(ValueKind::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn test_from_tag_rejects_unknown() {
        assert_eq!(ValueKind::from_tag(5), None);
        assert_eq!(ValueKind::from_tag(-1), None);
        assert_eq!(ValueKind::from_tag(i32::MAX), None);
    }
}

//! Protocol value types.
//!
//! Coarse content classification, subscription descriptions, and
//! dynamically typed preference values, with their wire encodings.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::wire::{InputBuffer, OutputBuffer, ValueKind};

// ============================================================================
// ContentType
// ============================================================================

/// Coarse classification of a requested resource.
///
/// Carried on the wire as an i32. [`ContentType::Other`] is the generic /
/// unknown classification; block decisions for it are never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ContentType {
    /// Generic or unknown resource.
    Other = 0,
    /// Script.
    Script = 1,
    /// Image.
    Image = 2,
    /// Stylesheet.
    Stylesheet = 3,
    /// Plugin object.
    Object = 4,
    /// Subdocument (iframe).
    Subdocument = 5,
    /// Top-level document.
    Document = 6,
    /// XMLHttpRequest / fetch.
    Xmlhttprequest = 7,
}

impl ContentType {
    /// Returns the wire representation.
    #[inline]
    #[must_use]
    pub const fn id(self) -> i32 {
        self as i32
    }

    /// Maps a wire value back to a content type.
    ///
    /// Unknown values degrade to [`ContentType::Other`]: the classification
    /// is advisory, a bad value must not fail the whole exchange.
    #[inline]
    #[must_use]
    pub const fn from_id(id: i32) -> Self {
        match id {
            1 => Self::Script,
            2 => Self::Image,
            3 => Self::Stylesheet,
            4 => Self::Object,
            5 => Self::Subdocument,
            6 => Self::Document,
            7 => Self::Xmlhttprequest,
            _ => Self::Other,
        }
    }

    /// Returns `true` when the classification is specific enough for the
    /// client-side decision cache.
    #[inline]
    #[must_use]
    pub const fn is_defined(self) -> bool {
        !matches!(self, Self::Other)
    }

    /// Returns the request-type string the filter backend understands.
    #[inline]
    #[must_use]
    pub const fn as_request_type(self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::Script => "script",
            Self::Image => "image",
            Self::Stylesheet => "stylesheet",
            Self::Object => "object",
            Self::Subdocument => "sub_frame",
            Self::Document => "main_frame",
            Self::Xmlhttprequest => "xmlhttprequest",
        }
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// A named, versioned remote filter list the user can enable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Download URL, also the subscription's identity.
    pub url: String,
    /// Human-readable title.
    pub title: String,
    /// Language or region specialization, possibly empty.
    pub specialization: String,
    /// Whether the subscription is currently enabled.
    pub listed: bool,
}

impl Subscription {
    /// Appends the subscription's fields in wire order.
    pub fn write_to(&self, buffer: &mut OutputBuffer) {
        buffer
            .write_str(&self.url)
            .write_str(&self.title)
            .write_str(&self.specialization)
            .write_bool(self.listed);
    }

    /// Reads one subscription's fields in wire order.
    ///
    /// # Errors
    ///
    /// Decode error on schema mismatch or truncation.
    pub fn read_from(buffer: &mut InputBuffer) -> Result<Self> {
        Ok(Self {
            url: buffer.read_str()?,
            title: buffer.read_str()?,
            specialization: buffer.read_str()?,
            listed: buffer.read_bool()?,
        })
    }
}

/// Appends a counted subscription sequence.
pub fn write_subscriptions(buffer: &mut OutputBuffer, subscriptions: &[Subscription]) {
    buffer.write_i32(subscriptions.len() as i32);
    for subscription in subscriptions {
        subscription.write_to(buffer);
    }
}

/// Reads a counted subscription sequence.
///
/// # Errors
///
/// Decode error on schema mismatch, truncation, or a negative count.
pub fn read_subscriptions(buffer: &mut InputBuffer) -> Result<Vec<Subscription>> {
    let count = buffer.read_i32()?;
    if count < 0 {
        return Err(Error::decode(format!("negative subscription count {count}")));
    }
    let mut subscriptions = Vec::with_capacity((count as usize).min(1024));
    for _ in 0..count {
        subscriptions.push(Subscription::read_from(buffer)?);
    }
    Ok(subscriptions)
}

// ============================================================================
// PrefValue
// ============================================================================

/// Dynamically typed preference value.
///
/// `SetPref`/`GetPref` carry one of four kinds; the wire type tag of the
/// value field selects the decode path (the one place the protocol leans
/// on the codec's self-describing tags).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum PrefValue {
    /// UTF-8 string preference.
    Str(String),
    /// 64-bit integer preference.
    Int64(i64),
    /// 32-bit integer preference.
    Int32(i32),
    /// Boolean preference.
    Bool(bool),
}

impl PrefValue {
    /// Appends the value as one tagged field.
    pub fn write_to(&self, buffer: &mut OutputBuffer) {
        match self {
            Self::Str(value) => buffer.write_str(value),
            Self::Int64(value) => buffer.write_i64(*value),
            Self::Int32(value) => buffer.write_i32(*value),
            Self::Bool(value) => buffer.write_bool(*value),
        };
    }

    /// Reads one value, selecting the kind from the next type tag.
    ///
    /// # Errors
    ///
    /// Decode error on truncation or a tag with no pref interpretation
    /// (wide strings are not valid pref values).
    pub fn read_from(buffer: &mut InputBuffer) -> Result<Self> {
        match buffer.peek_kind()? {
            ValueKind::Utf8 => Ok(Self::Str(buffer.read_str()?)),
            ValueKind::Int64 => Ok(Self::Int64(buffer.read_i64()?)),
            ValueKind::Int32 => Ok(Self::Int32(buffer.read_i32()?)),
            ValueKind::Bool => Ok(Self::Bool(buffer.read_bool()?)),
            ValueKind::Utf16 => Err(Error::decode("wide string is not a valid pref value")),
        }
    }

    /// Returns the boolean value, if this is a boolean pref.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer value, widening `Int32` to i64.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(value) => Some(*value),
            Self::Int32(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    /// Returns the string value, if this is a string pref.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PrefValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PrefValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<i32> for PrefValue {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<bool> for PrefValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_wire_values() {
        assert_eq!(ContentType::Other.id(), 0);
        assert_eq!(ContentType::Xmlhttprequest.id(), 7);
        assert_eq!(ContentType::from_id(2), ContentType::Image);
    }

    #[test]
    fn test_unknown_content_type_degrades_to_other() {
        assert_eq!(ContentType::from_id(42), ContentType::Other);
        assert_eq!(ContentType::from_id(-3), ContentType::Other);
    }

    #[test]
    fn test_content_type_defined() {
        assert!(!ContentType::Other.is_defined());
        assert!(ContentType::Image.is_defined());
        assert!(ContentType::Document.is_defined());
    }

    #[test]
    fn test_subscription_round_trip() {
        let subscription = Subscription {
            url: "https://easylist.to/easylist/easylist.txt".to_string(),
            title: "EasyList".to_string(),
            specialization: "".to_string(),
            listed: true,
        };

        let mut out = OutputBuffer::new();
        subscription.write_to(&mut out);
        let mut input = InputBuffer::from(out);
        assert_eq!(Subscription::read_from(&mut input).unwrap(), subscription);
    }

    #[test]
    fn test_subscription_sequence_round_trip() {
        let subscriptions = vec![
            Subscription {
                url: "https://a.example/list.txt".to_string(),
                title: "A".to_string(),
                specialization: "en".to_string(),
                listed: true,
            },
            Subscription {
                url: "https://b.example/list.txt".to_string(),
                title: "B".to_string(),
                specialization: "".to_string(),
                listed: false,
            },
        ];

        let mut out = OutputBuffer::new();
        write_subscriptions(&mut out, &subscriptions);
        let mut input = InputBuffer::from(out);
        assert_eq!(read_subscriptions(&mut input).unwrap(), subscriptions);
    }

    #[test]
    fn test_pref_value_round_trip_each_kind() {
        for value in [
            PrefValue::Str("hello".to_string()),
            PrefValue::Int64(-9),
            PrefValue::Int32(12),
            PrefValue::Bool(false),
        ] {
            let mut out = OutputBuffer::new();
            value.write_to(&mut out);
            let mut input = InputBuffer::from(out);
            assert_eq!(PrefValue::read_from(&mut input).unwrap(), value);
        }
    }

    #[test]
    fn test_pref_value_rejects_wide_string() {
        let mut out = OutputBuffer::new();
        out.write_wide_str("wide");
        let mut input = InputBuffer::from(out);
        assert!(PrefValue::read_from(&mut input).unwrap_err().is_decode_error());
    }

    #[test]
    fn test_pref_value_accessors() {
        assert_eq!(PrefValue::Bool(true).as_bool(), Some(true));
        assert_eq!(PrefValue::Int32(3).as_i64(), Some(3));
        assert_eq!(PrefValue::Int64(4).as_i64(), Some(4));
        assert_eq!(PrefValue::Str("s".into()).as_str(), Some("s"));
        assert_eq!(PrefValue::Str("s".into()).as_bool(), None);
    }

    #[test]
    fn test_pref_value_serde_round_trip() {
        let value = PrefValue::Int64(1234);
        let json = serde_json::to_string(&value).unwrap();
        let back: PrefValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}

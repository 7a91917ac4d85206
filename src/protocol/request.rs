//! Shared request schema.
//!
//! One [`Request`] variant per procedure, with symmetric
//! [`encode`](Request::encode) / [`decode`](Request::decode). The client
//! facade encodes; the engine decodes; both compile against this single
//! definition, which is the compile-time schema check that replaces any
//! runtime negotiation.

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;
use crate::wire::{InputBuffer, OutputBuffer};

use super::procedure::Procedure;
use super::types::{ContentType, PrefValue};

// ============================================================================
// Request
// ============================================================================

/// A fully typed RPC request.
///
/// The wire layout is the procedure identifier (tagged i32) followed by
/// the argument fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Does this URL match a blocking filter?
    Matches {
        /// Requested resource URL.
        url: String,
        /// Resource classification.
        content_type: ContentType,
        /// URL of the document issuing the request.
        document_url: String,
    },

    /// Element-hiding selectors for a domain.
    GetElemhideSelectors {
        /// Domain to look up.
        domain: String,
    },

    /// All subscriptions the engine knows about.
    AvailableSubscriptions,

    /// Subscriptions currently enabled.
    ListedSubscriptions,

    /// Replace the enabled subscriptions with one.
    SetSubscription {
        /// Subscription URL to enable.
        url: String,
    },

    /// Refresh the filters of every enabled subscription.
    UpdateAllSubscriptions,

    /// Domains covered by document-level exception filters.
    GetExceptionDomains,

    /// Is this URL whitelisted at document level?
    IsWhitelistedUrl {
        /// URL to check.
        url: String,
    },

    /// Add a user filter rule.
    AddFilter {
        /// Filter text in Adblock Plus syntax.
        text: String,
    },

    /// Remove a user filter rule.
    RemoveFilter {
        /// Filter text to remove.
        text: String,
    },

    /// Set a preference value.
    SetPref {
        /// Preference name.
        name: String,
        /// New value, dynamically typed.
        value: PrefValue,
    },

    /// Get a preference value.
    GetPref {
        /// Preference name.
        name: String,
    },

    /// Trigger an update check; completion reported out-of-band.
    CheckForUpdates {
        /// Opaque token echoed in the out-of-band completion report.
        callback_token: i32,
    },

    /// First-run detection, reported at most once per engine lifetime.
    IsFirstRunActionNeeded,

    /// Localized documentation link.
    GetDocumentationLink,
}

impl Request {
    /// Returns the procedure identifier for this request.
    #[must_use]
    pub const fn procedure(&self) -> Procedure {
        match self {
            Self::Matches { .. } => Procedure::Matches,
            Self::GetElemhideSelectors { .. } => Procedure::GetElemhideSelectors,
            Self::AvailableSubscriptions => Procedure::AvailableSubscriptions,
            Self::ListedSubscriptions => Procedure::ListedSubscriptions,
            Self::SetSubscription { .. } => Procedure::SetSubscription,
            Self::UpdateAllSubscriptions => Procedure::UpdateAllSubscriptions,
            Self::GetExceptionDomains => Procedure::GetExceptionDomains,
            Self::IsWhitelistedUrl { .. } => Procedure::IsWhitelistedUrl,
            Self::AddFilter { .. } => Procedure::AddFilter,
            Self::RemoveFilter { .. } => Procedure::RemoveFilter,
            Self::SetPref { .. } => Procedure::SetPref,
            Self::GetPref { .. } => Procedure::GetPref,
            Self::CheckForUpdates { .. } => Procedure::CheckForUpdates,
            Self::IsFirstRunActionNeeded => Procedure::IsFirstRunActionNeeded,
            Self::GetDocumentationLink => Procedure::GetDocumentationLink,
        }
    }

    /// Encodes the request into a wire message payload.
    #[must_use]
    pub fn encode(&self) -> OutputBuffer {
        let mut buffer = OutputBuffer::new();
        buffer.write_i32(self.procedure().id());

        match self {
            Self::Matches {
                url,
                content_type,
                document_url,
            } => {
                buffer
                    .write_str(url)
                    .write_i32(content_type.id())
                    .write_str(document_url);
            }
            Self::GetElemhideSelectors { domain } => {
                buffer.write_str(domain);
            }
            Self::SetSubscription { url } | Self::IsWhitelistedUrl { url } => {
                buffer.write_str(url);
            }
            Self::AddFilter { text } | Self::RemoveFilter { text } => {
                buffer.write_str(text);
            }
            Self::SetPref { name, value } => {
                buffer.write_str(name);
                value.write_to(&mut buffer);
            }
            Self::GetPref { name } => {
                buffer.write_str(name);
            }
            Self::CheckForUpdates { callback_token } => {
                buffer.write_i32(*callback_token);
            }
            Self::AvailableSubscriptions
            | Self::ListedSubscriptions
            | Self::UpdateAllSubscriptions
            | Self::GetExceptionDomains
            | Self::IsFirstRunActionNeeded
            | Self::GetDocumentationLink => {}
        }

        buffer
    }

    /// Decodes one request from a received message payload.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownProcedure`](crate::Error::UnknownProcedure) for
    ///   identifiers outside the table
    /// - decode errors when the argument fields do not match the
    ///   procedure's schema
    pub fn decode(buffer: &mut InputBuffer) -> Result<Self> {
        let procedure = Procedure::from_id(buffer.read_i32()?)?;

        let request = match procedure {
            Procedure::Matches => Self::Matches {
                url: buffer.read_str()?,
                content_type: ContentType::from_id(buffer.read_i32()?),
                document_url: buffer.read_str()?,
            },
            Procedure::GetElemhideSelectors => Self::GetElemhideSelectors {
                domain: buffer.read_str()?,
            },
            Procedure::AvailableSubscriptions => Self::AvailableSubscriptions,
            Procedure::ListedSubscriptions => Self::ListedSubscriptions,
            Procedure::SetSubscription => Self::SetSubscription {
                url: buffer.read_str()?,
            },
            Procedure::UpdateAllSubscriptions => Self::UpdateAllSubscriptions,
            Procedure::GetExceptionDomains => Self::GetExceptionDomains,
            Procedure::IsWhitelistedUrl => Self::IsWhitelistedUrl {
                url: buffer.read_str()?,
            },
            Procedure::AddFilter => Self::AddFilter {
                text: buffer.read_str()?,
            },
            Procedure::RemoveFilter => Self::RemoveFilter {
                text: buffer.read_str()?,
            },
            Procedure::SetPref => Self::SetPref {
                name: buffer.read_str()?,
                value: PrefValue::read_from(buffer)?,
            },
            Procedure::GetPref => Self::GetPref {
                name: buffer.read_str()?,
            },
            Procedure::CheckForUpdates => Self::CheckForUpdates {
                callback_token: buffer.read_i32()?,
            },
            Procedure::IsFirstRunActionNeeded => Self::IsFirstRunActionNeeded,
            Procedure::GetDocumentationLink => Self::GetDocumentationLink,
        };

        Ok(request)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;

    fn round_trip(request: Request) {
        let mut input = InputBuffer::from(request.encode());
        let decoded = Request::decode(&mut input).expect("decode");
        assert_eq!(decoded, request);
        assert!(input.is_exhausted());
    }

    #[test]
    fn test_matches_round_trip() {
        round_trip(Request::Matches {
            url: "http://ads.example/banner.png".to_string(),
            content_type: ContentType::Image,
            document_url: "http://example.com".to_string(),
        });
    }

    #[test]
    fn test_argumentless_round_trips() {
        round_trip(Request::AvailableSubscriptions);
        round_trip(Request::ListedSubscriptions);
        round_trip(Request::UpdateAllSubscriptions);
        round_trip(Request::GetExceptionDomains);
        round_trip(Request::IsFirstRunActionNeeded);
        round_trip(Request::GetDocumentationLink);
    }

    #[test]
    fn test_string_argument_round_trips() {
        round_trip(Request::GetElemhideSelectors {
            domain: "example.com".to_string(),
        });
        round_trip(Request::SetSubscription {
            url: "https://easylist.to/easylist/easylist.txt".to_string(),
        });
        round_trip(Request::IsWhitelistedUrl {
            url: "http://example.com/".to_string(),
        });
        round_trip(Request::AddFilter {
            text: "||ads.example^".to_string(),
        });
        round_trip(Request::RemoveFilter {
            text: "||ads.example^".to_string(),
        });
        round_trip(Request::GetPref {
            name: "patternsbackups".to_string(),
        });
    }

    #[test]
    fn test_set_pref_round_trips_each_value_kind() {
        for value in [
            PrefValue::Str("https://example.com".to_string()),
            PrefValue::Int64(5),
            PrefValue::Int32(-5),
            PrefValue::Bool(true),
        ] {
            round_trip(Request::SetPref {
                name: "some_pref".to_string(),
                value,
            });
        }
    }

    #[test]
    fn test_check_for_updates_round_trip() {
        round_trip(Request::CheckForUpdates { callback_token: 17 });
    }

    #[test]
    fn test_unknown_procedure_id_rejected() {
        let mut buffer = OutputBuffer::new();
        buffer.write_i32(999);
        let err = Request::decode(&mut InputBuffer::from(buffer)).unwrap_err();
        assert!(matches!(err, Error::UnknownProcedure { id: 999 }));
    }

    #[test]
    fn test_argument_type_mismatch_rejected() {
        // Matches expects a string url, give it an i32.
        let mut buffer = OutputBuffer::new();
        buffer.write_i32(Procedure::Matches.id()).write_i32(5);
        let err = Request::decode(&mut InputBuffer::from(buffer)).unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_truncated_arguments_rejected() {
        let mut buffer = OutputBuffer::new();
        buffer.write_i32(Procedure::SetPref.id()).write_str("name");
        // Value field missing entirely.
        let err = Request::decode(&mut InputBuffer::from(buffer)).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof));
    }

    #[test]
    fn test_procedure_mapping_is_consistent() {
        let request = Request::AddFilter {
            text: "||tracker.example^".to_string(),
        };
        assert_eq!(request.procedure(), Procedure::AddFilter);

        let mut input = InputBuffer::from(request.encode());
        assert_eq!(input.read_i32().unwrap(), Procedure::AddFilter.id());
    }
}

//! Stable procedure identifiers.
//!
//! Each identifier names one RPC operation. Values are part of the wire
//! contract, versioned with the binary via
//! [`PROTOCOL_VERSION`](super::PROTOCOL_VERSION) — never reorder them.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::error::{Error, Result};

// ============================================================================
// Procedure
// ============================================================================

/// Enumerated identifier for one RPC operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Procedure {
    /// Does this URL match a blocking filter?
    Matches = 0,
    /// Element-hiding selectors for a domain.
    GetElemhideSelectors = 1,
    /// All subscriptions the engine knows about.
    AvailableSubscriptions = 2,
    /// Subscriptions currently enabled.
    ListedSubscriptions = 3,
    /// Replace the enabled subscriptions with one.
    SetSubscription = 4,
    /// Refresh the filters of every enabled subscription.
    UpdateAllSubscriptions = 5,
    /// Domains covered by `@@||domain^$document` exception filters.
    GetExceptionDomains = 6,
    /// Is this URL whitelisted at document level?
    IsWhitelistedUrl = 7,
    /// Add a user filter rule.
    AddFilter = 8,
    /// Remove a user filter rule.
    RemoveFilter = 9,
    /// Set a preference value.
    SetPref = 10,
    /// Get a preference value.
    GetPref = 11,
    /// Trigger an update check; completion is delivered out-of-band.
    CheckForUpdates = 12,
    /// First-run detection, reported at most once per engine lifetime.
    IsFirstRunActionNeeded = 13,
    /// Localized documentation link (wide string on the wire).
    GetDocumentationLink = 14,
}

impl Procedure {
    /// Returns the raw wire identifier.
    #[inline]
    #[must_use]
    pub const fn id(self) -> i32 {
        self as i32
    }

    /// Looks up a procedure by its wire identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProcedure`] for identifiers outside the
    /// table.
    pub fn from_id(id: i32) -> Result<Self> {
        match id {
            0 => Ok(Self::Matches),
            1 => Ok(Self::GetElemhideSelectors),
            2 => Ok(Self::AvailableSubscriptions),
            3 => Ok(Self::ListedSubscriptions),
            4 => Ok(Self::SetSubscription),
            5 => Ok(Self::UpdateAllSubscriptions),
            6 => Ok(Self::GetExceptionDomains),
            7 => Ok(Self::IsWhitelistedUrl),
            8 => Ok(Self::AddFilter),
            9 => Ok(Self::RemoveFilter),
            10 => Ok(Self::SetPref),
            11 => Ok(Self::GetPref),
            12 => Ok(Self::CheckForUpdates),
            13 => Ok(Self::IsFirstRunActionNeeded),
            14 => Ok(Self::GetDocumentationLink),
            other => Err(Error::UnknownProcedure { id: other }),
        }
    }

    /// Returns `true` for pure queries with no engine-side side effect.
    #[inline]
    #[must_use]
    pub const fn is_query(self) -> bool {
        matches!(
            self,
            Self::Matches
                | Self::GetElemhideSelectors
                | Self::AvailableSubscriptions
                | Self::ListedSubscriptions
                | Self::GetExceptionDomains
                | Self::IsWhitelistedUrl
                | Self::GetPref
                | Self::GetDocumentationLink
        )
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Procedure; 15] = [
        Procedure::Matches,
        Procedure::GetElemhideSelectors,
        Procedure::AvailableSubscriptions,
        Procedure::ListedSubscriptions,
        Procedure::SetSubscription,
        Procedure::UpdateAllSubscriptions,
        Procedure::GetExceptionDomains,
        Procedure::IsWhitelistedUrl,
        Procedure::AddFilter,
        Procedure::RemoveFilter,
        Procedure::SetPref,
        Procedure::GetPref,
        Procedure::CheckForUpdates,
        Procedure::IsFirstRunActionNeeded,
        Procedure::GetDocumentationLink,
    ];

    #[test]
    fn test_ids_are_dense_and_stable() {
        for (index, procedure) in ALL.iter().enumerate() {
            assert_eq!(procedure.id(), index as i32);
        }
    }

    #[test]
    fn test_from_id_round_trip() {
        for procedure in ALL {
            assert_eq!(Procedure::from_id(procedure.id()).unwrap(), procedure);
        }
    }

    #[test]
    fn test_from_id_rejects_unknown() {
        let err = Procedure::from_id(15).unwrap_err();
        assert!(matches!(err, Error::UnknownProcedure { id: 15 }));
        assert!(Procedure::from_id(-1).is_err());
    }

    #[test]
    fn test_query_classification() {
        assert!(Procedure::Matches.is_query());
        assert!(Procedure::GetPref.is_query());
        assert!(!Procedure::AddFilter.is_query());
        assert!(!Procedure::CheckForUpdates.is_query());
        assert!(!Procedure::IsFirstRunActionNeeded.is_query());
    }
}

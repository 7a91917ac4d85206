//! Filter backend collaborator seam.
//!
//! The actual ad-blocking logic (URL pattern matching, element-hiding
//! selector generation, filter-list parsing) is an external collaborator.
//! The engine reaches it only through [`FilterBackend`], one method per
//! procedure in the dispatch table.

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;
use crate::protocol::{ContentType, PrefValue, Subscription};

// ============================================================================
// FilterBackend
// ============================================================================

/// The engine's view of the filter engine collaborator.
///
/// Implementations are shared by all worker tasks and own their interior
/// locking: every method takes `&self` and must be safe under concurrent
/// calls. Methods are synchronous — backend work is CPU-bound matching,
/// not I/O.
pub trait FilterBackend: Send + Sync + 'static {
    /// Returns `true` if `url` matches a blocking filter, taking
    /// exception (whitelisting) filters into account.
    fn matches(&self, url: &str, content_type: ContentType, document_url: &str) -> Result<bool>;

    /// Element-hiding CSS selectors applicable to `domain`.
    fn element_hiding_selectors(&self, domain: &str) -> Result<Vec<String>>;

    /// Every subscription the backend can offer.
    fn available_subscriptions(&self) -> Result<Vec<Subscription>>;

    /// Subscriptions currently enabled.
    fn listed_subscriptions(&self) -> Result<Vec<Subscription>>;

    /// Disables all subscriptions, then enables the one at `url`.
    fn set_subscription(&self, url: &str) -> Result<()>;

    /// Refreshes the filters of every enabled subscription.
    fn update_all_subscriptions(&self) -> Result<()>;

    /// Domains covered by `@@||domain^$document` exception filters.
    fn exception_domains(&self) -> Result<Vec<String>>;

    /// Returns `true` if `url` is whitelisted at document level.
    fn is_whitelisted_url(&self, url: &str) -> Result<bool>;

    /// Adds a user filter rule.
    fn add_filter(&self, text: &str) -> Result<()>;

    /// Removes a user filter rule.
    fn remove_filter(&self, text: &str) -> Result<()>;

    /// Sets a preference.
    fn set_pref(&self, name: &str, value: PrefValue) -> Result<()>;

    /// Reads a preference; `None` when the preference is unset.
    fn get_pref(&self, name: &str) -> Result<Option<PrefValue>>;

    /// Triggers an update check. The reply to the caller is immediate;
    /// the outcome is reported out-of-band tagged with `callback_token`.
    fn check_for_updates(&self, callback_token: i32) -> Result<()>;

    /// Returns `true` exactly once, on the first call of the first run
    /// of this backend's data directory.
    fn is_first_run_action_needed(&self) -> Result<bool>;

    /// Localized documentation link.
    fn documentation_link(&self) -> Result<String>;
}

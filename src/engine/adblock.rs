//! Filter backend built on the brave `adblock` crate.
//!
//! Filter lists live as Adblock Plus format `.txt` files in a filters
//! directory; each file is one subscription. User filters and preferences
//! persist as JSON in the engine data directory. The matcher is rebuilt
//! from the enabled sources whenever they change — mutations are rare
//! (user edits), lookups are hot.

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use adblock::Engine;
use adblock::lists::{FilterSet, ParseOptions};
use adblock::request::Request as NetRequest;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{ContentType, PrefValue, Subscription};

use super::backend::FilterBackend;

// ============================================================================
// Constants
// ============================================================================

/// Persisted state file inside the data directory.
const STATE_FILE: &str = "state.json";

/// Fallback documentation link when the pref is unset.
const DEFAULT_DOCUMENTATION_LINK: &str = "https://adblockplus.org/redirect?link=documentation";

// ============================================================================
// Persisted State
// ============================================================================

/// State surviving engine restarts.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    /// URLs of enabled subscriptions.
    listed: Vec<String>,
    /// User filter rules in Adblock Plus syntax.
    user_filters: Vec<String>,
    /// Preference map.
    prefs: FxHashMap<String, PrefValue>,
}

// ============================================================================
// SubscriptionFile
// ============================================================================

/// One filter-list file found in the filters directory.
#[derive(Debug, Clone)]
struct SubscriptionFile {
    /// Identity of the subscription (file URL).
    url: String,
    /// Human-readable title (file stem).
    title: String,
    /// Path to the list file.
    path: PathBuf,
}

impl SubscriptionFile {
    fn describe(&self, listed: bool) -> Subscription {
        Subscription {
            url: self.url.clone(),
            title: self.title.clone(),
            specialization: String::new(),
            listed,
        }
    }
}

// ============================================================================
// AdblockBackend
// ============================================================================

/// Mutable backend state behind one lock.
struct Inner {
    /// Compiled matcher over the enabled sources.
    engine: Engine,
    /// Filter-list files discovered in the filters directory.
    subscriptions: Vec<SubscriptionFile>,
    /// Persisted user state.
    state: PersistedState,
    /// Whether this data directory had no prior state at startup.
    first_run: bool,
    /// First-run action already handed to a client.
    first_run_reported: bool,
}

/// [`FilterBackend`] over the brave `adblock` matcher.
pub struct AdblockBackend {
    /// Data directory holding `state.json`.
    data_dir: PathBuf,
    /// Lock around matcher and persisted state.
    inner: Mutex<Inner>,
}

impl AdblockBackend {
    /// Loads persisted state, scans the filters directory, and compiles
    /// the matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the
    /// state file is unreadable.
    pub fn new(data_dir: impl Into<PathBuf>, filters_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let filters_dir = filters_dir.into();
        fs::create_dir_all(&data_dir)?;

        let state_path = data_dir.join(STATE_FILE);
        let first_run = !state_path.exists();
        let mut state = if first_run {
            PersistedState::default()
        } else {
            serde_json::from_str(&fs::read_to_string(&state_path)?)?
        };

        let subscriptions = scan_filter_lists(&filters_dir);
        if first_run {
            // Everything available starts enabled.
            state.listed = subscriptions.iter().map(|s| s.url.clone()).collect();
        }

        let engine = compile(&subscriptions, &state);
        info!(
            subscriptions = subscriptions.len(),
            user_filters = state.user_filters.len(),
            first_run,
            "Filter backend initialized"
        );

        Ok(Self {
            data_dir,
            inner: Mutex::new(Inner {
                engine,
                subscriptions,
                state,
                first_run,
                first_run_reported: false,
            }),
        })
    }

    /// Persists the current state and recompiles the matcher.
    fn save_and_recompile(&self, inner: &mut Inner) -> Result<()> {
        let json = serde_json::to_string_pretty(&inner.state)?;
        fs::write(self.data_dir.join(STATE_FILE), json)?;
        inner.engine = compile(&inner.subscriptions, &inner.state);
        Ok(())
    }
}

// ============================================================================
// Compilation Helpers
// ============================================================================

/// Finds `.txt` filter lists in the filters directory.
///
/// A missing or empty directory is not an error: the engine then blocks
/// nothing beyond user filters.
fn scan_filter_lists(filters_dir: &Path) -> Vec<SubscriptionFile> {
    let Ok(entries) = fs::read_dir(filters_dir) else {
        warn!(dir = %filters_dir.display(), "Filters directory missing; no subscriptions");
        return Vec::new();
    };

    let mut lists: Vec<SubscriptionFile> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .map(|path| {
            let title = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            SubscriptionFile {
                url: format!("file://{}", path.display()),
                title,
                path,
            }
        })
        .collect();

    // Deterministic ordering regardless of directory iteration order.
    lists.sort_by(|a, b| a.url.cmp(&b.url));
    lists
}

/// Compiles a matcher from the enabled subscriptions plus user filters.
fn compile(subscriptions: &[SubscriptionFile], state: &PersistedState) -> Engine {
    let mut filter_set = FilterSet::new(false);

    for subscription in subscriptions {
        if !state.listed.contains(&subscription.url) {
            continue;
        }
        match fs::read_to_string(&subscription.path) {
            Ok(content) => {
                filter_set.add_filter_list(&content, ParseOptions::default());
                debug!(title = %subscription.title, "Subscription compiled");
            }
            Err(e) => {
                warn!(path = %subscription.path.display(), error = %e, "Unreadable filter list");
            }
        }
    }

    if !state.user_filters.is_empty() {
        let combined = state.user_filters.join("\n");
        filter_set.add_filter_list(&combined, ParseOptions::default());
    }

    Engine::from_filter_set(filter_set, true)
}

// ============================================================================
// FilterBackend Implementation
// ============================================================================

impl FilterBackend for AdblockBackend {
    fn matches(&self, url: &str, content_type: ContentType, document_url: &str) -> Result<bool> {
        let request = match NetRequest::new(url, document_url, content_type.as_request_type())
            .or_else(|_| NetRequest::new(url, "", "other"))
        {
            Ok(request) => request,
            // Unparseable URL (data:, blob:, ...) — never block it.
            Err(_) => return Ok(false),
        };

        let inner = self.inner.lock();
        Ok(inner.engine.check_network_request(&request).matched)
    }

    fn element_hiding_selectors(&self, domain: &str) -> Result<Vec<String>> {
        let inner = self.inner.lock();
        let resources = inner
            .engine
            .url_cosmetic_resources(&format!("https://{domain}/"));

        let mut selectors: Vec<String> = resources.hide_selectors.into_iter().collect();
        selectors.sort();
        Ok(selectors)
    }

    fn available_subscriptions(&self) -> Result<Vec<Subscription>> {
        let inner = self.inner.lock();
        Ok(inner
            .subscriptions
            .iter()
            .map(|s| s.describe(inner.state.listed.contains(&s.url)))
            .collect())
    }

    fn listed_subscriptions(&self) -> Result<Vec<Subscription>> {
        let inner = self.inner.lock();
        Ok(inner
            .subscriptions
            .iter()
            .filter(|s| inner.state.listed.contains(&s.url))
            .map(|s| s.describe(true))
            .collect())
    }

    fn set_subscription(&self, url: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.subscriptions.iter().any(|s| s.url == url) {
            return Err(Error::backend(format!("unknown subscription: {url}")));
        }
        inner.state.listed = vec![url.to_string()];
        self.save_and_recompile(&mut inner)
    }

    fn update_all_subscriptions(&self) -> Result<()> {
        // List files are refreshed on disk by an external downloader;
        // updating means recompiling from their current contents.
        let mut inner = self.inner.lock();
        self.save_and_recompile(&mut inner)
    }

    fn exception_domains(&self) -> Result<Vec<String>> {
        const PREFIX: &str = "@@||";
        const SUFFIX: &str = "^$document";

        let inner = self.inner.lock();
        Ok(inner
            .state
            .user_filters
            .iter()
            .filter_map(|text| {
                text.strip_prefix(PREFIX)
                    .and_then(|rest| rest.strip_suffix(SUFFIX))
            })
            .map(str::to_string)
            .collect())
    }

    fn is_whitelisted_url(&self, url: &str) -> Result<bool> {
        let Ok(request) = NetRequest::new(url, url, "main_frame") else {
            return Ok(false);
        };

        let inner = self.inner.lock();
        Ok(inner.engine.check_network_request(&request).exception.is_some())
    }

    fn add_filter(&self, text: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state.user_filters.iter().any(|f| f == text) {
            return Ok(());
        }
        inner.state.user_filters.push(text.to_string());
        self.save_and_recompile(&mut inner)
    }

    fn remove_filter(&self, text: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let before = inner.state.user_filters.len();
        inner.state.user_filters.retain(|f| f != text);
        if inner.state.user_filters.len() == before {
            return Ok(());
        }
        self.save_and_recompile(&mut inner)
    }

    fn set_pref(&self, name: &str, value: PrefValue) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.state.prefs.insert(name.to_string(), value);
        let json = serde_json::to_string_pretty(&inner.state)?;
        fs::write(self.data_dir.join(STATE_FILE), json)?;
        Ok(())
    }

    fn get_pref(&self, name: &str) -> Result<Option<PrefValue>> {
        let inner = self.inner.lock();
        Ok(inner.state.prefs.get(name).cloned())
    }

    fn check_for_updates(&self, callback_token: i32) -> Result<()> {
        // Out-of-band completion: the report goes to the log, tagged with
        // the caller's token, not into the RPC response.
        info!(
            callback_token,
            version = env!("CARGO_PKG_VERSION"),
            "Update check requested; engine is up to date"
        );
        Ok(())
    }

    fn is_first_run_action_needed(&self) -> Result<bool> {
        let mut inner = self.inner.lock();
        if inner.first_run && !inner.first_run_reported {
            inner.first_run_reported = true;
            return Ok(true);
        }
        Ok(false)
    }

    fn documentation_link(&self) -> Result<String> {
        let inner = self.inner.lock();
        Ok(inner
            .state
            .prefs
            .get("documentation_link")
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_DOCUMENTATION_LINK.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_with_filters(lists: &[(&str, &str)]) -> (tempfile::TempDir, AdblockBackend) {
        let dir = tempfile::tempdir().expect("tempdir");
        let filters_dir = dir.path().join("filters");
        fs::create_dir_all(&filters_dir).expect("filters dir");
        for (name, content) in lists {
            fs::write(filters_dir.join(name), content).expect("write list");
        }
        let backend =
            AdblockBackend::new(dir.path().join("data"), filters_dir).expect("backend");
        (dir, backend)
    }

    #[test]
    fn test_blocks_matching_url() {
        let (_dir, backend) = backend_with_filters(&[("ads.txt", "||ads.example^\n")]);
        assert!(backend
            .matches(
                "http://ads.example/banner.png",
                ContentType::Image,
                "http://example.com"
            )
            .unwrap());
        assert!(!backend
            .matches(
                "http://example.com/logo.png",
                ContentType::Image,
                "http://example.com"
            )
            .unwrap());
    }

    #[test]
    fn test_exception_rule_overrides_block() {
        let (_dir, backend) = backend_with_filters(&[(
            "ads.txt",
            "||ads.example^\n@@||ads.example/banner.png\n",
        )]);
        assert!(!backend
            .matches(
                "http://ads.example/banner.png",
                ContentType::Image,
                "http://example.com"
            )
            .unwrap());
    }

    #[test]
    fn test_unparseable_url_is_not_blocked() {
        let (_dir, backend) = backend_with_filters(&[("ads.txt", "||ads.example^\n")]);
        assert!(!backend
            .matches("data:text/plain,hello", ContentType::Other, "")
            .unwrap());
    }

    #[test]
    fn test_add_filter_takes_effect_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let filters_dir = dir.path().join("filters");
        fs::create_dir_all(&filters_dir).unwrap();
        let data_dir = dir.path().join("data");

        {
            let backend = AdblockBackend::new(&data_dir, &filters_dir).expect("backend");
            assert!(!backend
                .matches("http://ads.example/x.js", ContentType::Script, "http://example.com")
                .unwrap());
            backend.add_filter("||ads.example^").unwrap();
            assert!(backend
                .matches("http://ads.example/x.js", ContentType::Script, "http://example.com")
                .unwrap());
        }

        // A fresh backend over the same data dir sees the filter.
        let backend = AdblockBackend::new(&data_dir, &filters_dir).expect("backend");
        assert!(backend
            .matches("http://ads.example/x.js", ContentType::Script, "http://example.com")
            .unwrap());
    }

    #[test]
    fn test_remove_filter() {
        let (_dir, backend) = backend_with_filters(&[]);
        backend.add_filter("||ads.example^").unwrap();
        backend.remove_filter("||ads.example^").unwrap();
        assert!(!backend
            .matches("http://ads.example/x.js", ContentType::Script, "http://example.com")
            .unwrap());
    }

    #[test]
    fn test_subscription_listing_and_selection() {
        let (_dir, backend) = backend_with_filters(&[
            ("easylist.txt", "||ads.example^\n"),
            ("easyprivacy.txt", "||tracker.example^\n"),
        ]);

        let available = backend.available_subscriptions().unwrap();
        assert_eq!(available.len(), 2);
        assert!(available.iter().all(|s| s.listed));

        let easylist_url = available
            .iter()
            .find(|s| s.title == "easylist")
            .unwrap()
            .url
            .clone();
        backend.set_subscription(&easylist_url).unwrap();

        let listed = backend.listed_subscriptions().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "easylist");

        // The deselected list no longer blocks.
        assert!(!backend
            .matches(
                "http://tracker.example/pixel.gif",
                ContentType::Image,
                "http://example.com"
            )
            .unwrap());
    }

    #[test]
    fn test_set_unknown_subscription_fails() {
        let (_dir, backend) = backend_with_filters(&[]);
        assert!(backend.set_subscription("file:///nope.txt").is_err());
    }

    #[test]
    fn test_exception_domains_extraction() {
        let (_dir, backend) = backend_with_filters(&[]);
        backend.add_filter("@@||example.com^$document").unwrap();
        backend.add_filter("||ads.example^").unwrap();
        assert_eq!(backend.exception_domains().unwrap(), vec!["example.com"]);
    }

    #[test]
    fn test_whitelisted_url() {
        let (_dir, backend) = backend_with_filters(&[]);
        backend.add_filter("@@||example.com^$document").unwrap();
        assert!(backend.is_whitelisted_url("http://example.com/").unwrap());
        assert!(!backend.is_whitelisted_url("http://other.example/").unwrap());
    }

    #[test]
    fn test_prefs_round_trip_and_default() {
        let (_dir, backend) = backend_with_filters(&[]);
        assert_eq!(backend.get_pref("nonexistent_key").unwrap(), None);

        backend
            .set_pref("patternsbackups", PrefValue::Int32(5))
            .unwrap();
        assert_eq!(
            backend.get_pref("patternsbackups").unwrap(),
            Some(PrefValue::Int32(5))
        );
    }

    #[test]
    fn test_first_run_reported_once() {
        let (_dir, backend) = backend_with_filters(&[]);
        assert!(backend.is_first_run_action_needed().unwrap());
        assert!(!backend.is_first_run_action_needed().unwrap());
    }

    #[test]
    fn test_not_first_run_with_existing_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let filters_dir = dir.path().join("filters");
        fs::create_dir_all(&filters_dir).unwrap();
        let data_dir = dir.path().join("data");

        {
            let backend = AdblockBackend::new(&data_dir, &filters_dir).expect("backend");
            backend.set_pref("seen", PrefValue::Bool(true)).unwrap();
        }

        let backend = AdblockBackend::new(&data_dir, &filters_dir).expect("backend");
        assert!(!backend.is_first_run_action_needed().unwrap());
    }

    #[test]
    fn test_documentation_link_pref_override() {
        let (_dir, backend) = backend_with_filters(&[]);
        assert_eq!(
            backend.documentation_link().unwrap(),
            DEFAULT_DOCUMENTATION_LINK
        );

        backend
            .set_pref("documentation_link", PrefValue::from("https://docs.example"))
            .unwrap();
        assert_eq!(backend.documentation_link().unwrap(), "https://docs.example");
    }

    #[test]
    fn test_element_hiding_selectors() {
        let (_dir, backend) = backend_with_filters(&[(
            "cosmetic.txt",
            "example.com###ad-banner\nexample.com##.sponsored\n",
        )]);
        let selectors = backend.element_hiding_selectors("example.com").unwrap();
        assert!(selectors.contains(&"#ad-banner".to_string()));
        assert!(selectors.contains(&".sponsored".to_string()));
    }
}

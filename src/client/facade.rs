//! Lazy-connecting RPC facade with spawn-on-demand and fail-soft wrappers.
//!
//! All RPC flows through one logical connection guarded by an async lock,
//! which gives the strict one-request-in-flight ordering the protocol
//! assumes. When no engine is listening, the facade can launch the engine
//! executable and retry until it answers.
//!
//! Two API layers:
//!   - `try_*` methods return `Result` and surface every failure.
//!   - Plain wrappers log failures and return documented defaults; ad
//!     blocking degrades to "allow everything" rather than breaking the
//!     host.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{ContentType, PrefValue, Request, Subscription};
use crate::transport::{endpoint_path, PipeConnection};
use crate::wire::InputBuffer;

use super::cache::{DecisionCache, DEFAULT_CACHE_CAPACITY};

// ============================================================================
// Constants
// ============================================================================

/// Default budget for getting a connection, spawn included.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between connect attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Default cap on one request/response exchange.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Builder
// ============================================================================

/// Configures and builds a [`FilterClient`].
///
/// # Example
///
/// ```no_run
/// use adblock_ipc::client::FilterClientBuilder;
///
/// let client = FilterClientBuilder::new()
///     .engine_program("/usr/libexec/adblock-engine")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct FilterClientBuilder {
    endpoint: Option<PathBuf>,
    engine_program: Option<PathBuf>,
    engine_args: Vec<String>,
    connect_timeout: Duration,
    retry_interval: Duration,
    call_timeout: Duration,
    cache_capacity: usize,
}

impl FilterClientBuilder {
    /// Starts from the defaults: user-scoped endpoint, no spawn program.
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: None,
            engine_program: None,
            engine_args: Vec::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Overrides the endpoint path.
    #[must_use]
    pub fn endpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.endpoint = Some(path.into());
        self
    }

    /// Engine executable launched when no engine is listening.
    #[must_use]
    pub fn engine_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.engine_program = Some(program.into());
        self
    }

    /// Arguments passed to the engine executable.
    #[must_use]
    pub fn engine_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engine_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Total budget for establishing a connection.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Pause between connect attempts.
    #[must_use]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Cap on one request/response exchange.
    #[must_use]
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Decision cache capacity.
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Builds the client. No connection is made yet.
    #[must_use]
    pub fn build(self) -> FilterClient {
        FilterClient {
            inner: Arc::new(Inner {
                endpoint: self.endpoint.unwrap_or_else(endpoint_path),
                engine_program: self.engine_program,
                engine_args: self.engine_args,
                connect_timeout: self.connect_timeout,
                retry_interval: self.retry_interval,
                call_timeout: self.call_timeout,
                connection: AsyncMutex::new(None),
                evaluation: AsyncMutex::new(()),
                cache: DecisionCache::new(self.cache_capacity),
            }),
        }
    }
}

impl Default for FilterClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// FilterClient
// ============================================================================

struct Inner {
    endpoint: PathBuf,
    engine_program: Option<PathBuf>,
    engine_args: Vec<String>,
    connect_timeout: Duration,
    retry_interval: Duration,
    call_timeout: Duration,
    /// The one logical connection; `None` until the first call or after a
    /// transport failure. Held across the await points of an exchange.
    connection: AsyncMutex<Option<PipeConnection>>,
    /// Serializes cache-miss evaluations in `should_block`.
    evaluation: AsyncMutex<()>,
    cache: DecisionCache,
}

/// RPC facade for the engine process. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct FilterClient {
    inner: Arc<Inner>,
}

impl FilterClient {
    /// Builder with defaults.
    #[must_use]
    pub fn builder() -> FilterClientBuilder {
        FilterClientBuilder::new()
    }

    /// Endpoint the client talks to.
    #[must_use]
    pub fn endpoint(&self) -> &Path {
        &self.inner.endpoint
    }

    // ------------------------------------------------------------------------
    // Call path
    // ------------------------------------------------------------------------

    /// Performs one request/response exchange.
    ///
    /// Transport errors invalidate the cached connection so the next call
    /// reconnects from scratch.
    async fn call(&self, request: &Request) -> Result<InputBuffer> {
        let mut slot = self.inner.connection.lock().await;
        if slot.is_none() {
            *slot = Some(self.obtain_connection().await?);
        }
        let Some(connection) = slot.as_mut() else {
            return Err(Error::connection("connection slot empty after connect"));
        };

        let exchange = async {
            connection.write_message(&request.encode()).await?;
            connection.read_message().await
        };

        match timeout(self.inner.call_timeout, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                *slot = None;
                Err(e)
            }
            Err(_) => {
                *slot = None;
                Err(Error::request_timeout(
                    self.inner.call_timeout.as_millis() as u64
                ))
            }
        }
    }

    /// Connects, launching the engine once if nothing is listening.
    async fn obtain_connection(&self) -> Result<PipeConnection> {
        let deadline = Instant::now() + self.inner.connect_timeout;
        let mut spawned = false;

        loop {
            match PipeConnection::connect(&self.inner.endpoint).await {
                Ok(connection) => return Ok(connection),
                Err(e) if e.is_transport_error() => {
                    if !spawned {
                        spawned = true;
                        if let Some(program) = &self.inner.engine_program {
                            self.spawn_engine(program)?;
                        }
                    }
                    if Instant::now() + self.inner.retry_interval > deadline {
                        debug!(endpoint = %self.inner.endpoint.display(), error = %e, "Engine never became reachable");
                        return Err(Error::engine_unavailable(
                            self.inner.connect_timeout.as_millis() as u64,
                        ));
                    }
                    sleep(self.inner.retry_interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Launches the engine executable, detached.
    fn spawn_engine(&self, program: &Path) -> Result<()> {
        debug!(program = %program.display(), "Launching engine process");
        let child = Command::new(program)
            .args(&self.inner.engine_args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(Error::spawn_failed)?;
        // The engine outlives us or exits on idle; dropping the handle
        // detaches it and the runtime reaps it in the background.
        drop(child);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Fallible wrappers
    // ------------------------------------------------------------------------

    /// Asks the engine whether a request should be blocked. Uncached.
    ///
    /// # Errors
    ///
    /// Transport, timeout, or decode errors.
    pub async fn try_matches(
        &self,
        url: &str,
        content_type: ContentType,
        document_url: &str,
    ) -> Result<bool> {
        let mut response = self
            .call(&Request::Matches {
                url: url.to_string(),
                content_type,
                document_url: document_url.to_string(),
            })
            .await?;
        response.read_bool()
    }

    /// Element-hiding selectors for a domain.
    pub async fn try_element_hiding_selectors(&self, domain: &str) -> Result<Vec<String>> {
        let mut response = self
            .call(&Request::GetElemhideSelectors {
                domain: domain.to_string(),
            })
            .await?;
        response.read_strings()
    }

    /// All subscriptions the engine knows about.
    pub async fn try_available_subscriptions(&self) -> Result<Vec<Subscription>> {
        let mut response = self.call(&Request::AvailableSubscriptions).await?;
        crate::protocol::read_subscriptions(&mut response)
    }

    /// Currently enabled subscriptions.
    pub async fn try_listed_subscriptions(&self) -> Result<Vec<Subscription>> {
        let mut response = self.call(&Request::ListedSubscriptions).await?;
        crate::protocol::read_subscriptions(&mut response)
    }

    /// Makes `url` the single enabled subscription.
    pub async fn try_set_subscription(&self, url: &str) -> Result<()> {
        self.call(&Request::SetSubscription {
            url: url.to_string(),
        })
        .await?;
        self.inner.cache.clear();
        Ok(())
    }

    /// Recompiles every enabled subscription from its current source.
    pub async fn try_update_all_subscriptions(&self) -> Result<()> {
        self.call(&Request::UpdateAllSubscriptions).await?;
        self.inner.cache.clear();
        Ok(())
    }

    /// Domains the user whitelisted via `$document` exception filters.
    pub async fn try_exception_domains(&self) -> Result<Vec<String>> {
        let mut response = self.call(&Request::GetExceptionDomains).await?;
        response.read_strings()
    }

    /// Whether a whole page is exempt from blocking.
    pub async fn try_is_whitelisted_url(&self, url: &str) -> Result<bool> {
        let mut response = self
            .call(&Request::IsWhitelistedUrl {
                url: url.to_string(),
            })
            .await?;
        response.read_bool()
    }

    /// Adds a user filter rule.
    pub async fn try_add_filter(&self, text: &str) -> Result<()> {
        self.call(&Request::AddFilter {
            text: text.to_string(),
        })
        .await?;
        self.inner.cache.clear();
        Ok(())
    }

    /// Removes a user filter rule.
    pub async fn try_remove_filter(&self, text: &str) -> Result<()> {
        self.call(&Request::RemoveFilter {
            text: text.to_string(),
        })
        .await?;
        self.inner.cache.clear();
        Ok(())
    }

    /// Stores a preference.
    pub async fn try_set_pref(&self, name: &str, value: impl Into<PrefValue>) -> Result<()> {
        self.call(&Request::SetPref {
            name: name.to_string(),
            value: value.into(),
        })
        .await?;
        self.inner.cache.clear();
        Ok(())
    }

    /// Reads a preference; `None` when unset.
    pub async fn try_get_pref(&self, name: &str) -> Result<Option<PrefValue>> {
        let mut response = self
            .call(&Request::GetPref {
                name: name.to_string(),
            })
            .await?;
        if response.read_bool()? {
            Ok(Some(PrefValue::read_from(&mut response)?))
        } else {
            Ok(None)
        }
    }

    /// Asks the engine to check for updates; completion is out-of-band.
    pub async fn try_check_for_updates(&self, callback_token: i32) -> Result<()> {
        self.call(&Request::CheckForUpdates { callback_token })
            .await?;
        Ok(())
    }

    /// Whether first-run setup still needs to happen. Consuming.
    pub async fn try_is_first_run_action_needed(&self) -> Result<bool> {
        let mut response = self.call(&Request::IsFirstRunActionNeeded).await?;
        response.read_bool()
    }

    /// Documentation URL to show the user.
    pub async fn try_documentation_link(&self) -> Result<String> {
        let mut response = self.call(&Request::GetDocumentationLink).await?;
        response.read_wide_str()
    }

    // ------------------------------------------------------------------------
    // Fail-soft wrappers
    // ------------------------------------------------------------------------

    /// Cached block decision. Returns `false` (allow) on any failure.
    ///
    /// Decisions are cached per normalized URL, but only when the content
    /// type is specific; `ContentType::Other` answers may differ between
    /// contexts and always go to the engine.
    pub async fn should_block(
        &self,
        url: &str,
        content_type: ContentType,
        document_url: &str,
    ) -> bool {
        let key = normalize_cache_key(url);
        if let Some(blocked) = self.inner.cache.get(&key) {
            return blocked;
        }

        // One miss evaluated at a time; re-check after the lock in case a
        // racing caller filled the entry.
        let _guard = self.inner.evaluation.lock().await;
        if let Some(blocked) = self.inner.cache.get(&key) {
            return blocked;
        }

        match self.try_matches(url, content_type, document_url).await {
            Ok(blocked) => {
                if content_type.is_defined() {
                    self.inner.cache.insert(&key, blocked);
                }
                blocked
            }
            Err(e) => {
                warn!(url, error = %e, "Block check failed; allowing request");
                false
            }
        }
    }

    /// Selectors for a domain, empty on failure.
    pub async fn element_hiding_selectors(&self, domain: &str) -> Vec<String> {
        self.try_element_hiding_selectors(domain)
            .await
            .unwrap_or_else(|e| {
                warn!(domain, error = %e, "Selector fetch failed");
                Vec::new()
            })
    }

    /// Whitelist check, `false` on failure.
    pub async fn is_whitelisted_url(&self, url: &str) -> bool {
        self.try_is_whitelisted_url(url).await.unwrap_or_else(|e| {
            warn!(url, error = %e, "Whitelist check failed");
            false
        })
    }

    /// Exception domains, empty on failure.
    pub async fn exception_domains(&self) -> Vec<String> {
        self.try_exception_domains().await.unwrap_or_else(|e| {
            warn!(error = %e, "Exception domain fetch failed");
            Vec::new()
        })
    }

    /// Preference value, or the supplied default when unset or unreachable.
    pub async fn get_pref_or(&self, name: &str, default: PrefValue) -> PrefValue {
        match self.try_get_pref(name).await {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                warn!(name, error = %e, "Pref read failed");
                default
            }
        }
    }

    /// Documentation link, empty on failure.
    pub async fn documentation_link(&self) -> String {
        self.try_documentation_link().await.unwrap_or_else(|e| {
            warn!(error = %e, "Documentation link fetch failed");
            String::new()
        })
    }

    /// Number of cached block decisions.
    #[must_use]
    pub fn cached_decisions(&self) -> usize {
        self.inner.cache.len()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Cache key for a URL: the fragment never reaches the server, so two
/// URLs differing only there share one decision.
fn normalize_cache_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

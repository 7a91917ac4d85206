//! Endpoint naming and the listening side of the pipe transport.
//!
//! The endpoint name is derived deterministically from the current user
//! identity, so one engine serves one user session and simultaneous users
//! get independent engines — the Unix rendition of the legacy
//! `\\.\pipe\adblockplusengine_<username>` name.

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::path::{Path, PathBuf};

use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::PipeConnection;

// ============================================================================
// Endpoint Naming
// ============================================================================

/// Returns the default user-scoped endpoint path.
///
/// `$XDG_RUNTIME_DIR/adblock-engine-{user}.sock`, falling back to the
/// system temp directory when no runtime dir is set. `{user}` comes from
/// `$USER`/`$LOGNAME`.
#[must_use]
pub fn endpoint_path() -> PathBuf {
    let dir = env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir);

    let user = env::var("USER")
        .or_else(|_| env::var("LOGNAME"))
        .unwrap_or_else(|_| "default".to_string());

    dir.join(format!("adblock-engine-{user}.sock"))
}

// ============================================================================
// PipeListener
// ============================================================================

/// Listening endpoint owned by the engine process (MODE_CREATE).
///
/// Binding claims the endpoint for this process: if another engine is
/// already serving it, binding fails with
/// [`Error::AlreadyRunning`](crate::Error::AlreadyRunning); a stale socket
/// file left by a crashed engine is removed and re-bound.
#[derive(Debug)]
pub struct PipeListener {
    /// Underlying Unix socket listener.
    listener: UnixListener,
    /// Bound endpoint path, removed on drop.
    path: PathBuf,
}

impl PipeListener {
    /// Claims the endpoint and starts listening.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyRunning`](crate::Error::AlreadyRunning) if a live
    ///   engine already serves this endpoint
    /// - [`Error::Pipe`](crate::Error::Pipe) if the endpoint cannot be
    ///   created
    pub async fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            // Live peer means another engine owns the endpoint; a stale
            // file from a crashed engine is safe to reclaim.
            match UnixStream::connect(&path).await {
                Ok(_) => return Err(Error::already_running(path)),
                Err(probe) => {
                    debug!(path = %path.display(), error = %probe, "Removing stale endpoint");
                    std::fs::remove_file(&path)
                        .map_err(|e| Error::pipe(format!("cannot remove stale endpoint: {e}")))?;
                }
            }
        }

        let listener = UnixListener::bind(&path)
            .map_err(|e| Error::pipe(format!("cannot create endpoint {}: {e}", path.display())))?;

        debug!(path = %path.display(), "Endpoint bound");

        Ok(Self { listener, path })
    }

    /// Returns the bound endpoint path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocks until one peer connects and returns its channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pipe`](crate::Error::Pipe) if the accept fails.
    pub async fn accept(&self) -> Result<PipeConnection> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .map_err(|e| Error::pipe(format!("accept failed: {e}")))?;

        debug!(path = %self.path.display(), "Peer connected");
        Ok(PipeConnection::from_stream(stream))
    }
}

impl Drop for PipeListener {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove endpoint file");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Accept loop and per-connection workers for the engine process.
//!
//! Each accepted pipe connection gets its own task running a strict
//! request/response loop. The server tracks how many connections are
//! live; once the count stays at zero for the configured grace period
//! the accept loop returns and the process can exit.

// ============================================================================
// Imports
// ============================================================================

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::transport::{endpoint_path, PipeConnection, PipeListener};

use super::backend::FilterBackend;
use super::dispatch::handle_message;

// ============================================================================
// EngineServer
// ============================================================================

/// Serves [`FilterBackend`] calls over the user-scoped pipe endpoint.
pub struct EngineServer {
    listener: PipeListener,
    backend: Arc<dyn FilterBackend>,
    /// How long the server lingers with zero connections before exiting.
    /// `None` keeps it running until killed.
    idle_shutdown: Option<Duration>,
}

impl EngineServer {
    /// Binds the default user-scoped endpoint.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyRunning`](crate::Error::AlreadyRunning) when another
    /// live engine owns the endpoint, otherwise transport errors.
    pub async fn bind(
        backend: Arc<dyn FilterBackend>,
        idle_shutdown: Option<Duration>,
    ) -> Result<Self> {
        Self::bind_at(endpoint_path(), backend, idle_shutdown).await
    }

    /// Binds an explicit endpoint path. Tests use this to avoid the
    /// shared per-user endpoint.
    pub async fn bind_at(
        path: impl AsRef<Path>,
        backend: Arc<dyn FilterBackend>,
        idle_shutdown: Option<Duration>,
    ) -> Result<Self> {
        let listener = PipeListener::bind(path).await?;
        Ok(Self {
            listener,
            backend,
            idle_shutdown,
        })
    }

    /// Returns the endpoint path the server is bound to.
    #[must_use]
    pub fn local_path(&self) -> &Path {
        self.listener.path()
    }

    /// Runs the accept loop until idle shutdown fires.
    ///
    /// # Errors
    ///
    /// Returns an error when `accept` fails; per-connection errors only
    /// end that connection.
    pub async fn run(self) -> Result<()> {
        let active = Arc::new(AtomicUsize::new(0));
        // Workers tick this channel when they finish so the loop
        // re-evaluates the idle state.
        let (done_tx, mut done_rx) = mpsc::channel::<()>(64);

        info!(endpoint = %self.listener.path().display(), "Engine serving");

        loop {
            let idle = active.load(Ordering::Acquire) == 0;
            match (idle, self.idle_shutdown) {
                (true, Some(grace)) => {
                    tokio::select! {
                        accepted = self.listener.accept() => {
                            self.spawn_worker(accepted?, &active, &done_tx);
                        }
                        _ = sleep(grace) => {
                            info!(grace_ms = grace.as_millis() as u64, "Idle grace elapsed; shutting down");
                            return Ok(());
                        }
                    }
                }
                _ => {
                    tokio::select! {
                        accepted = self.listener.accept() => {
                            self.spawn_worker(accepted?, &active, &done_tx);
                        }
                        _ = done_rx.recv() => {}
                    }
                }
            }
        }
    }

    fn spawn_worker(
        &self,
        connection: PipeConnection,
        active: &Arc<AtomicUsize>,
        done_tx: &mpsc::Sender<()>,
    ) {
        active.fetch_add(1, Ordering::AcqRel);
        let backend = Arc::clone(&self.backend);
        let active = Arc::clone(active);
        let done_tx = done_tx.clone();

        tokio::spawn(async move {
            serve_connection(connection, backend.as_ref()).await;
            active.fetch_sub(1, Ordering::AcqRel);
            let _ = done_tx.send(()).await;
        });
    }
}

/// Request/response loop for one client connection.
async fn serve_connection(mut connection: PipeConnection, backend: &dyn FilterBackend) {
    debug!("Connection opened");
    loop {
        let mut message = match connection.read_message().await {
            Ok(message) => message,
            Err(e) if e.is_disconnect() => {
                debug!("Connection closed by peer");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Connection read failed");
                return;
            }
        };

        let response = match handle_message(backend, &mut message) {
            Ok(response) => response,
            Err(e) => {
                // A malformed or failing request poisons the framing;
                // drop the connection instead of guessing.
                warn!(error = %e, "Request failed; closing connection");
                return;
            }
        };

        if let Err(e) = connection.write_message(&response).await {
            warn!(error = %e, "Connection write failed");
            return;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Error types for the adblock IPC layer.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use adblock_ipc::{Result, Error};
//!
//! async fn example(client: &FilterClient) -> Result<()> {
//!     let blocked = client.try_matches("http://ads.example/a.js", ContentType::Script, "http://example.com").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Decode | [`Error::UnexpectedType`], [`Error::UnexpectedEof`], [`Error::Decode`] |
//! | Transport | [`Error::Connection`], [`Error::Disconnected`], [`Error::Pipe`] |
//! | Protocol | [`Error::UnknownProcedure`], [`Error::Protocol`] |
//! | Lifecycle | [`Error::AlreadyRunning`], [`Error::EngineUnavailable`], [`Error::SpawnFailed`] |
//! | Execution | [`Error::RequestTimeout`], [`Error::Backend`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::wire::ValueKind;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Decode Errors
    // ========================================================================
    /// A field was read with a different type than it was written with.
    ///
    /// Raised when the tagged type of the next field does not match the
    /// type the caller asked for — a schema-order violation.
    #[error("Unexpected type in buffer: expected {expected:?}, found {found:?}")]
    UnexpectedType {
        /// Type the caller asked for.
        expected: ValueKind,
        /// Type actually present in the buffer.
        found: ValueKind,
    },

    /// The buffer ended before the requested field was complete.
    #[error("Unexpected end of input buffer")]
    UnexpectedEof,

    /// Malformed field payload.
    ///
    /// Returned for invalid UTF-8/UTF-16 data, bool bytes other than 0/1,
    /// or unknown type tags.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the malformed payload.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Connecting to the engine endpoint failed.
    ///
    /// Returned when no engine is listening on the endpoint. The transport
    /// never retries internally; retry policy lives in the client facade.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// The peer closed the channel.
    ///
    /// Distinguished from other I/O errors so read loops can terminate
    /// quietly on a clean disconnect.
    #[error("Peer disconnected")]
    Disconnected,

    /// Generic pipe I/O failure (partial write, reset mid-frame, ...).
    #[error("Pipe error: {message}")]
    Pipe {
        /// Description of the I/O failure.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Unknown procedure identifier in a request.
    #[error("Unknown procedure identifier: {id}")]
    UnknownProcedure {
        /// The unrecognized identifier.
        id: i32,
    },

    /// Protocol violation (oversized frame, malformed request, ...).
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Another engine instance already serves this endpoint.
    #[error("Another engine instance is already running on {endpoint}")]
    AlreadyRunning {
        /// The contested endpoint path.
        endpoint: PathBuf,
    },

    /// The connect/spawn retry loop exhausted its timeout.
    #[error("Engine unavailable after {timeout_ms}ms")]
    EngineUnavailable {
        /// Milliseconds spent retrying before giving up.
        timeout_ms: u64,
    },

    /// Spawning the engine process failed.
    #[error("Failed to spawn engine process: {message}")]
    SpawnFailed {
        /// Description of the spawn failure.
        message: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// An in-flight RPC exchange exceeded the per-call timeout.
    #[error("Request timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The filter backend reported a failure.
    #[error("Backend error: {message}")]
    Backend {
        /// Error message from the filter backend.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error (persisted engine state).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a pipe I/O error.
    #[inline]
    pub fn pipe(message: impl Into<String>) -> Self {
        Self::Pipe {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an already-running error.
    #[inline]
    pub fn already_running(endpoint: impl Into<PathBuf>) -> Self {
        Self::AlreadyRunning {
            endpoint: endpoint.into(),
        }
    }

    /// Creates an engine-unavailable error.
    #[inline]
    pub fn engine_unavailable(timeout_ms: u64) -> Self {
        Self::EngineUnavailable { timeout_ms }
    }

    /// Creates a spawn-failed error.
    #[inline]
    pub fn spawn_failed(err: IoError) -> Self {
        Self::SpawnFailed {
            message: err.to_string(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(timeout_ms: u64) -> Self {
        Self::RequestTimeout { timeout_ms }
    }

    /// Creates a backend error.
    #[inline]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a decode error.
    #[inline]
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedType { .. } | Self::UnexpectedEof | Self::Decode { .. }
        )
    }

    /// Returns `true` if this is a clean peer disconnect.
    #[inline]
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Returns `true` if this is a transport-level error.
    ///
    /// Transport errors invalidate the current connection; the client
    /// facade drops it and reconnects on the next call.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::Disconnected
                | Self::Pipe { .. }
                | Self::RequestTimeout { .. }
                | Self::Io(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::EngineUnavailable { .. } | Self::RequestTimeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("no listener on endpoint");
        assert_eq!(err.to_string(), "Connection failed: no listener on endpoint");
    }

    #[test]
    fn test_unknown_procedure_display() {
        let err = Error::UnknownProcedure { id: 99 };
        assert_eq!(err.to_string(), "Unknown procedure identifier: 99");
    }

    #[test]
    fn test_is_decode_error() {
        assert!(Error::UnexpectedEof.is_decode_error());
        assert!(Error::decode("bad bool byte").is_decode_error());
        assert!(!Error::connection("test").is_decode_error());
    }

    #[test]
    fn test_is_disconnect() {
        assert!(Error::Disconnected.is_disconnect());
        assert!(!Error::pipe("reset").is_disconnect());
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::connection("test").is_transport_error());
        assert!(Error::Disconnected.is_transport_error());
        assert!(Error::request_timeout(1000).is_transport_error());
        assert!(!Error::UnexpectedEof.is_transport_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::engine_unavailable(10_000).is_recoverable());
        assert!(!Error::UnknownProcedure { id: 3 }.is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::BrokenPipe, "broken pipe");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}

//! Framed pipe transport.
//!
//! This module carries whole wire messages between the client facade and
//! the engine process over a local, user-scoped channel (a Unix domain
//! socket standing in for the legacy named pipe).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                           ┌──────────────────┐
//! │  Browser process │                           │  Engine process  │
//! │                  │   [u32 len][payload]      │                  │
//! │  PipeConnection  │◄─────────────────────────►│  PipeListener    │
//! │  (MODE_CONNECT)  │  adblock-engine-$USER     │  (MODE_CREATE)   │
//! └──────────────────┘         .sock             └──────────────────┘
//! ```
//!
//! # Framing Invariant
//!
//! Every message on the wire is self-delimiting: a 4-byte little-endian
//! payload length followed by the payload. A reader never needs
//! out-of-band knowledge of message boundaries.
//!
//! # Roles
//!
//! - [`PipeListener::bind`] — engine side; claims the endpoint, accepts one
//!   [`PipeConnection`] per peer.
//! - [`PipeConnection::connect`] — client side; fails fast with
//!   [`Error::Connection`](crate::Error::Connection) when no engine is
//!   listening. Retry policy lives in the client facade, not here.

// ============================================================================
// Submodules
// ============================================================================

/// Endpoint naming and the listening side.
pub mod endpoint;

/// Connected channel with message framing.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::PipeConnection;
pub use endpoint::{PipeListener, endpoint_path};

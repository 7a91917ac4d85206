//! Out-of-process ad-blocking filter engine with an IPC client facade.
//!
//! The filter engine (pattern matching over large filter lists) runs in its
//! own per-user process; host applications talk to it over a local pipe
//! endpoint using a compact framed binary protocol.
//!
//! # Architecture
//!
//! The crate follows a client-server model:
//!
//! - **Client (host process)**: [`FilterClient`] connects lazily, launches
//!   the engine on demand, and caches block decisions per URL
//! - **Engine (`adblock-engine` binary)**: single instance per user, serves
//!   every host process, exits on its own once idle
//!
//! Key design principles:
//!
//! - One shared [`Request`] schema encodes and decodes on both sides
//! - Strict request/response ordering per connection (no correlation IDs)
//! - Blocking is best-effort: the facade degrades to "allow" on any failure
//! - Filter evaluation sits behind the [`FilterBackend`] trait
//!
//! # Quick Start
//!
//! ```no_run
//! use adblock_ipc::{ContentType, FilterClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Build a client that starts the engine when needed
//!     let client = FilterClient::builder()
//!         .engine_program("/usr/libexec/adblock-engine")
//!         .build();
//!
//!     let blocked = client
//!         .should_block(
//!             "http://ads.example/banner.js",
//!             ContentType::Script,
//!             "http://example.com/",
//!         )
//!         .await;
//!     println!("blocked: {blocked}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Host-side facade: [`FilterClient`], decision cache |
//! | [`engine`] | Engine-side server, dispatch, filter backend |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Procedure table and [`Request`] schema |
//! | [`transport`] | Pipe endpoint, framed connections |
//! | [`wire`] | Type-tagged binary field codec |

// ============================================================================
// Modules
// ============================================================================

/// Host-side facade.
///
/// Use [`FilterClient::builder()`] to create a configured client instance.
pub mod client;

/// Engine-side server and filter backend.
///
/// - [`FilterBackend`] - seam between the RPC layer and the matcher
/// - [`AdblockBackend`] - backend over the brave `adblock` crate
/// - [`EngineServer`] - accept loop with idle shutdown
pub mod engine;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// RPC procedure table and request schema.
///
/// The shared [`Request`] enum keeps both peers on one wire schema.
pub mod protocol;

/// Pipe transport layer.
///
/// Endpoint naming, listener with single-instance semantics, framed
/// connections.
pub mod transport;

/// Type-tagged binary field codec.
///
/// [`OutputBuffer`] writes, [`InputBuffer`] reads; field order is the
/// schema.
pub mod wire;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{DecisionCache, FilterClient, FilterClientBuilder};

// Engine types
pub use engine::{AdblockBackend, EngineServer, FilterBackend};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{ContentType, PrefValue, Procedure, Request, Subscription, PROTOCOL_VERSION};

// Transport types
pub use transport::{endpoint_path, PipeConnection, PipeListener};

// Wire types
pub use wire::{InputBuffer, OutputBuffer, ValueKind};

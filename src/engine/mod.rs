//! Engine process internals.
//!
//! The engine owns the real filter engine and serves RPC requests from
//! browser processes over the pipe transport.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────── engine process ─────────────────────────┐
//! │                                                                       │
//! │  EngineServer ──accept──► worker task ──► dispatch ──► FilterBackend  │
//! │       │                   (one per        (shared      (AdblockBackend│
//! │       │                    connection)     schema)      over brave    │
//! │       └── idle shutdown when the active-connection      adblock crate)│
//! │           gauge stays at zero for the grace period                    │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A worker failure (bad request, transport error) terminates only that
//! worker's loop; the server keeps serving other connections.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `backend` | [`FilterBackend`] collaborator seam |
//! | `adblock` | Backend over the brave `adblock` crate |
//! | `dispatch` | Request decoding and per-procedure handling |
//! | `server` | Accept loop, workers, lifecycle policy |

// ============================================================================
// Submodules
// ============================================================================

/// Filter backend collaborator seam.
pub mod backend;

/// Filter backend built on the brave `adblock` crate.
pub mod adblock;

/// Request dispatch.
pub mod dispatch;

/// Engine server and lifecycle.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use adblock::AdblockBackend;
pub use backend::FilterBackend;
pub use dispatch::handle_message;
pub use server::EngineServer;

//! RPC dispatch protocol.
//!
//! A closed table of procedures layered on the wire codec. The argument
//! and result schemas live in one shared [`Request`] definition used by
//! both the client facade (encode-on-call) and the engine (decode-on-
//! handle), so a schema drift between the two sides is a compile error
//! rather than a silent wire mismatch.
//!
//! # Message Shape
//!
//! - Request payload: tagged i32 procedure identifier, then the argument
//!   fields in schema order.
//! - Response payload: the result fields only — no leading identifier, the
//!   caller already knows the expected schema from the request it sent.
//!   Every request receives exactly one response, possibly zero-length.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `procedure` | Stable procedure identifiers |
//! | `request` | Shared request schema (encode/decode) |
//! | `types` | Content types, subscriptions, pref values |

// ============================================================================
// Submodules
// ============================================================================

/// Stable procedure identifiers.
pub mod procedure;

/// Shared request schema.
pub mod request;

/// Protocol value types.
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use procedure::Procedure;
pub use request::Request;
pub use types::{ContentType, PrefValue, Subscription, read_subscriptions, write_subscriptions};

// ============================================================================
// Constants
// ============================================================================

/// Revision of the procedure table.
///
/// Bump whenever a procedure is added, removed, or its schema changes.
/// Client and engine ship in one binary contract; there is no runtime
/// negotiation.
pub const PROTOCOL_VERSION: u32 = 1;

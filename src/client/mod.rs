//! Host-process facade over the engine RPC.
//!
//! # Components
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`FilterClient`] | Lazy-connecting RPC facade with spawn-on-demand |
//! | [`FilterClientBuilder`] | Configuration surface for the facade |
//! | [`DecisionCache`] | URL-keyed cache of block decisions |
//!
//! The facade is an explicitly constructed service object: create one,
//! clone it wherever blocking decisions are needed. Clones share the
//! connection, the cache, and the spawn policy.

mod cache;
mod facade;

pub use cache::{DecisionCache, DEFAULT_CACHE_CAPACITY};
pub use facade::{FilterClient, FilterClientBuilder};

//! Persistent key-value storage contracts and implementations.
//!
//! # Responsibility
//! - Define the get/set-by-key contract the event service persists through.
//! - Keep SQL details behind that contract.
//!
//! # Invariants
//! - Values are opaque text; this layer never interprets stored JSON.

pub mod kv_repo;

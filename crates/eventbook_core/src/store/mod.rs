//! In-memory event collection operations.
//!
//! # Responsibility
//! - Decode/encode the persisted collection text.
//! - Provide copy-on-write collection transforms (upsert, remove, import).
//!
//! # Invariants
//! - No function here touches storage; callers persist after mutating.
//! - Every record entering a collection passes through `normalize`.

pub mod event_store;

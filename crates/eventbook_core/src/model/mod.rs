//! Event bookkeeping domain model.
//!
//! # Responsibility
//! - Define the canonical current-shape records persisted by the store.
//! - Derive read-only summaries (totals, per-register revenue) from a record.
//!
//! # Invariants
//! - Every stored record is current-shape; legacy shapes only exist as raw
//!   JSON before normalization.
//! - List fields keep insertion order; nothing here sorts them.
//!
//! # See also
//! - crate::normalize

pub mod event;

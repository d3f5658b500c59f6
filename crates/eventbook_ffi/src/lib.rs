//! Flutter-facing bindings for Eventbook core.

pub mod api;

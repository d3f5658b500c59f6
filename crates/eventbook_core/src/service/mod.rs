//! Core use-case services.
//!
//! # Responsibility
//! - Combine the in-memory collection with a storage backend.
//! - Give presentation/FFI layers one entry point per user action.

pub mod event_service;

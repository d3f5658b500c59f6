//! Core domain logic for Eventbook.
//! Event records, legacy migration, collection store and local persistence.

pub mod db;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::event::{
    CashRegister, EventData, EventSummary, Expense, RegisterSummary, StartEntry, Violation,
    CURRENT_SCHEMA_VERSION,
};
pub use normalize::normalize;
pub use repo::kv_repo::{KvStore, RepoError, RepoResult, SqliteKvStore, EVENTS_STORAGE_KEY};
pub use service::event_service::{
    EditorTarget, EventService, ImportReport, ServiceError, ServiceResult,
};
pub use store::event_store::{ImportError, MergeOutcome, StoreError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

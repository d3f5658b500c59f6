//! Event bookkeeping use-case service.
//!
//! # Responsibility
//! - Load the persisted collection once and keep it in memory.
//! - Apply create/save/delete/import through copy-on-write store transforms.
//! - Persist the whole collection after every mutation.
//!
//! # Invariants
//! - Malformed persisted text never fails `open`; it yields an empty collection.
//! - The in-memory collection only changes after the new one was persisted.
//! - Import never overwrites an existing record.
//! - Mutations take `&mut self`; multi-threaded hosts must serialize access.

use crate::model::event::{EventData, EventSummary, RegisterSummary, Violation};
use crate::repo::kv_repo::{KvStore, RepoError, EVENTS_STORAGE_KEY};
use crate::store::event_store::{self, ImportError, StoreError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for event use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Storage read/write failure.
    Repo(RepoError),
    /// Collection could not be encoded.
    Store(StoreError),
    /// Import input was unusable; nothing was merged.
    Import(ImportError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Import(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Import(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ImportError> for ServiceError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

/// What the editor should show for a selection.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorTarget {
    /// Selected id exists; edit a copy of the stored record.
    Existing(EventData),
    /// No selection or unknown id; start a fresh draft.
    New(EventData),
}

impl EditorTarget {
    pub fn record(&self) -> &EventData {
        match self {
            Self::Existing(record) | Self::New(record) => record,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

/// Counts reported back to the user after an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Elements in the import file, including skipped duplicates.
    pub seen: usize,
    /// Records actually appended.
    pub merged: usize,
}

/// Stateful façade over the event collection and its storage.
pub struct EventService<S: KvStore> {
    storage: S,
    events: Vec<EventData>,
}

impl<S: KvStore> EventService<S> {
    /// Loads the persisted collection from `storage`.
    ///
    /// Missing or malformed persisted text yields an empty collection; the
    /// parse failure is logged, not returned.
    ///
    /// # Errors
    /// - Returns `ServiceError::Repo` when storage cannot be read.
    pub fn open(storage: S) -> ServiceResult<Self> {
        let events = match storage.get(EVENTS_STORAGE_KEY)? {
            None => Vec::new(),
            Some(text) => match event_store::load(&text) {
                Ok(events) => events,
                Err(err) => {
                    error!(
                        "event=events_load module=service status=error error_code=malformed_persisted_state error={}",
                        err
                    );
                    Vec::new()
                }
            },
        };

        info!(
            "event=events_load module=service status=ok count={}",
            events.len()
        );
        Ok(Self { storage, events })
    }

    /// Current collection in display order.
    pub fn events(&self) -> &[EventData] {
        &self.events
    }

    pub fn find_event(&self, id: &str) -> Option<&EventData> {
        event_store::find(&self.events, id)
    }

    /// Resolves an editor selection. Unknown ids fall back to a new draft.
    pub fn select_event(&self, id: Option<&str>) -> EditorTarget {
        match id.and_then(|id| self.find_event(id)) {
            Some(record) => EditorTarget::Existing(record.clone()),
            None => {
                if let Some(id) = id {
                    warn!(
                        "event=event_select module=service status=fallback reason=unknown_id id={}",
                        id
                    );
                }
                EditorTarget::New(self.new_event())
            }
        }
    }

    /// Creates an unsaved draft with a fresh id.
    pub fn new_event(&self) -> EventData {
        EventData::new()
    }

    /// Replaces the record with the same id, or appends it, then persists.
    ///
    /// Soft-reference violations are logged but never block the save.
    pub fn save_event(&mut self, record: EventData) -> ServiceResult<()> {
        for violation in record.validate() {
            warn!(
                "event=event_save module=service status=warning violation=\"{}\"",
                violation
            );
        }
        let next = event_store::upsert(&self.events, record);
        self.replace_collection(next)
    }

    /// Removes the record `id` and persists. Unknown ids are a no-op.
    ///
    /// Returns whether a record was removed.
    pub fn delete_event(&mut self, id: &str) -> ServiceResult<bool> {
        let next = event_store::remove(&self.events, id);
        if next.len() == self.events.len() {
            return Ok(false);
        }
        self.replace_collection(next)?;
        Ok(true)
    }

    /// Merges an import file's text into the collection and persists.
    ///
    /// # Errors
    /// - Returns `ServiceError::Import` for invalid JSON or a non-array value.
    pub fn import_json(&mut self, text: &str) -> ServiceResult<ImportReport> {
        let result = event_store::parse_import(text)
            .and_then(|raw| event_store::merge_import(&self.events, raw));
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    "event=events_import module=service status=error error={}",
                    err
                );
                return Err(err.into());
            }
        };

        let report = ImportReport {
            seen: outcome.seen,
            merged: outcome.merged,
        };
        if report.merged > 0 {
            self.replace_collection(outcome.events)?;
        }
        info!(
            "event=events_import module=service status=ok seen={} merged={}",
            report.seen, report.merged
        );
        Ok(report)
    }

    /// Reads an import file to completion and merges it.
    ///
    /// # Errors
    /// - Returns `ImportError::Unreadable` (wrapped) when the file cannot be
    ///   read as UTF-8 text.
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> ServiceResult<ImportReport> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|err| {
            error!(
                "event=events_import module=service status=error error_code=unreadable error={}",
                err
            );
            ImportError::Unreadable(err)
        })?;
        self.import_json(&text)
    }

    /// Serializes the collection as indented JSON suitable for re-import.
    pub fn export_json(&self) -> ServiceResult<String> {
        Ok(event_store::export(&self.events)?)
    }

    pub fn summary(&self, id: &str) -> Option<EventSummary> {
        self.find_event(id).map(EventData::summary)
    }

    pub fn register_summaries(&self, id: &str) -> Option<Vec<RegisterSummary>> {
        self.find_event(id).map(EventData::register_summaries)
    }

    /// Soft consistency report over the whole collection.
    pub fn violations(&self) -> Vec<Violation> {
        event_store::validate_collection(&self.events)
    }

    fn replace_collection(&mut self, next: Vec<EventData>) -> ServiceResult<()> {
        let text = event_store::save(&next)?;
        if let Err(err) = self.storage.set(EVENTS_STORAGE_KEY, &text) {
            error!(
                "event=events_persist module=service status=error error={}",
                err
            );
            return Err(err.into());
        }
        self.events = next;
        Ok(())
    }
}

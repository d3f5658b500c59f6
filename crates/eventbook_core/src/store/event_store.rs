//! Event collection transforms and (de)serialization.
//!
//! # Responsibility
//! - Load a persisted collection, normalizing every element.
//! - Replace/append/remove records by id without mutating the input slice.
//! - Merge imported records by id, never overwriting existing ones.
//!
//! # Invariants
//! - `upsert` keeps the position of a replaced record.
//! - `remove` of an unknown id is a no-op.
//! - `merge_import` appends only ids not already present (including ids seen
//!   earlier in the same import batch).
//! - Imported records without an id are assigned a fresh one, so the
//!   collection never holds an empty id from an import.

use crate::model::event::{EventData, Violation};
use crate::normalize::coerce::coerce_string;
use crate::normalize::normalize;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persisted collection could not be decoded or encoded.
#[derive(Debug)]
pub enum StoreError {
    /// Stored text is not valid JSON.
    Parse(serde_json::Error),
    /// Collection could not be serialized.
    Serialize(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "malformed persisted events: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize events: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) | Self::Serialize(err) => Some(err),
        }
    }
}

/// Import input was unusable. Nothing is merged when this is returned.
#[derive(Debug)]
pub enum ImportError {
    /// Import source could not be read as text.
    Unreadable(std::io::Error),
    /// Import text is not valid JSON.
    Parse(serde_json::Error),
    /// Import JSON is valid but not an array.
    NotAnArray,
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable(err) => write!(f, "import source unreadable: {err}"),
            Self::Parse(err) => write!(f, "import file is not valid JSON: {err}"),
            Self::NotAnArray => write!(f, "import file must contain a JSON array"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unreadable(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::NotAnArray => None,
        }
    }
}

/// Result of merging an import batch into a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Collection after the merge.
    pub events: Vec<EventData>,
    /// Number of elements in the raw import array, including skipped ones.
    pub seen: usize,
    /// Number of records actually appended.
    pub merged: usize,
}

/// Decodes a persisted collection.
///
/// Valid JSON that is not an array yields an empty collection.
///
/// # Errors
/// - Returns `StoreError::Parse` when `text` is not valid JSON.
pub fn load(text: &str) -> StoreResult<Vec<EventData>> {
    let parsed: Value = serde_json::from_str(text).map_err(StoreError::Parse)?;
    match parsed {
        Value::Array(items) => Ok(items.into_iter().map(normalize).collect()),
        _ => Ok(Vec::new()),
    }
}

/// Encodes a collection for persistence. Ids are not checked for uniqueness.
pub fn save(events: &[EventData]) -> StoreResult<String> {
    serde_json::to_string(events).map_err(StoreError::Serialize)
}

/// Encodes a collection as indented JSON for export files.
pub fn export(events: &[EventData]) -> StoreResult<String> {
    serde_json::to_string_pretty(events).map_err(StoreError::Serialize)
}

/// Replaces the record with the same id in place, or appends it.
pub fn upsert(events: &[EventData], record: EventData) -> Vec<EventData> {
    let mut next = events.to_vec();
    match next.iter().position(|event| event.id == record.id) {
        Some(index) => next[index] = record,
        None => next.push(record),
    }
    next
}

/// Returns the collection without the record `id`.
pub fn remove(events: &[EventData], id: &str) -> Vec<EventData> {
    events
        .iter()
        .filter(|event| event.id != id)
        .cloned()
        .collect()
}

/// Looks up a record by id. Unknown ids yield `None`.
pub fn find<'a>(events: &'a [EventData], id: &str) -> Option<&'a EventData> {
    events.iter().find(|event| event.id == id)
}

/// Parses import text into a raw JSON value.
///
/// # Errors
/// - Returns `ImportError::Parse` when `text` is not valid JSON.
pub fn parse_import(text: &str) -> Result<Value, ImportError> {
    serde_json::from_str(text).map_err(ImportError::Parse)
}

/// Merges raw imported records into `events`.
///
/// Elements whose id already exists are skipped; existing records are never
/// overwritten. New elements are normalized and appended in import order.
/// Elements without an id get a fresh UUID and are always appended.
///
/// # Errors
/// - Returns `ImportError::NotAnArray` when `imported` is not an array.
pub fn merge_import(events: &[EventData], imported: Value) -> Result<MergeOutcome, ImportError> {
    let Value::Array(items) = imported else {
        return Err(ImportError::NotAnArray);
    };

    let seen = items.len();
    let mut known_ids = events
        .iter()
        .map(|event| event.id.clone())
        .collect::<HashSet<_>>();
    let mut next = events.to_vec();

    for item in items {
        let id = item
            .get("id")
            .map_or_else(String::new, |id| coerce_string(id, ""));
        if id.is_empty() {
            let mut record = normalize(item);
            record.id = Uuid::new_v4().to_string();
            known_ids.insert(record.id.clone());
            next.push(record);
            continue;
        }
        if !known_ids.insert(id) {
            continue;
        }
        next.push(normalize(item));
    }

    let merged = next.len() - events.len();
    Ok(MergeOutcome {
        events: next,
        seen,
        merged,
    })
}

/// Validates a whole collection: duplicate event ids plus every record's own
/// soft-reference checks.
pub fn validate_collection(events: &[EventData]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut ids = HashSet::new();

    for event in events {
        if !ids.insert(event.id.as_str()) {
            violations.push(Violation::DuplicateEventId {
                event_id: event.id.clone(),
            });
        }
        violations.extend(event.validate());
    }

    violations
}

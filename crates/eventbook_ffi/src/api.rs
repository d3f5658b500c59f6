//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose one sync function per dashboard/editor action.
//! - Convert every core error into a response envelope with a UI message.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - All store access is serialized through one process-wide lock, so each
//!   call sees and replaces the whole collection atomically.

use eventbook_core::db::open_db;
use eventbook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, normalize,
    ping as ping_inner, EditorTarget, EventData, EventService, ImportReport, ServiceError,
    SqliteKvStore,
};
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

const DB_FILE_NAME: &str = "eventbook_events.sqlite3";
const DB_PATH_ENV: &str = "EVENTBOOK_DB_PATH";
const IMPORT_FAILED_MESSAGE: &str = "Fehler beim Importieren der Datei.";

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory for rolling log files.
/// - Idempotent for the same `level + log_dir`.
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the database file used by all later calls.
///
/// # FFI contract
/// - Must be called before the first store call to take effect.
/// - Calling again with the same path is a no-op.
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_db_path(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "database already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Dashboard row for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventListItem {
    pub id: String,
    pub name: String,
    pub date: String,
    pub net_profit: f64,
}

/// Dashboard listing envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct EventListResponse {
    pub ok: bool,
    /// Events in stored display order.
    pub items: Vec<EventListItem>,
    pub message: String,
}

/// Editor payload envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEditorResponse {
    pub ok: bool,
    /// `true` when the editor should treat the record as a new draft.
    pub is_new: bool,
    /// Current-shape record as JSON.
    pub event_json: String,
    pub message: String,
}

/// Generic action envelope for save/delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventActionResponse {
    pub ok: bool,
    pub event_id: Option<String>,
    pub message: String,
}

impl EventActionResponse {
    fn success(message: impl Into<String>, event_id: String) -> Self {
        Self {
            ok: true,
            event_id: Some(event_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            event_id: None,
            message: message.into(),
        }
    }
}

/// Import result envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResponse {
    pub ok: bool,
    /// Elements found in the file, including skipped duplicates.
    pub seen: u32,
    /// Records actually added.
    pub merged: u32,
    pub message: String,
}

/// Export result envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    pub json: String,
    pub message: String,
}

/// Derived totals envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSummaryResponse {
    pub ok: bool,
    pub total_start: f64,
    pub total_end: f64,
    pub cash_revenue: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    pub message: String,
}

/// Lists all events for the dashboard.
#[flutter_rust_bridge::frb(sync)]
pub fn events_list() -> EventListResponse {
    let result = with_event_service(|service| {
        Ok(service
            .events()
            .iter()
            .map(to_list_item)
            .collect::<Vec<_>>())
    });
    match result {
        Ok(items) => {
            let message = format!("{} event(s).", items.len());
            EventListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => EventListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("events_list failed: {err}"),
        },
    }
}

/// Resolves the editor record for `id`.
///
/// # FFI contract
/// - `None` or an unknown id returns a fresh draft with `is_new = true`.
#[flutter_rust_bridge::frb(sync)]
pub fn event_get(id: Option<String>) -> EventEditorResponse {
    let result = with_event_service(|service| Ok(service.select_event(id.as_deref())));
    let target = match result {
        Ok(target) => target,
        Err(err) => {
            return EventEditorResponse {
                ok: false,
                is_new: true,
                event_json: String::new(),
                message: format!("event_get failed: {err}"),
            };
        }
    };

    let is_new = target.is_new();
    let record = match target {
        EditorTarget::Existing(record) | EditorTarget::New(record) => record,
    };
    match serde_json::to_string(&record) {
        Ok(event_json) => EventEditorResponse {
            ok: true,
            is_new,
            event_json,
            message: if is_new {
                "New event.".to_string()
            } else {
                "Event loaded.".to_string()
            },
        },
        Err(err) => EventEditorResponse {
            ok: false,
            is_new,
            event_json: String::new(),
            message: format!("event_get failed: {err}"),
        },
    }
}

/// Saves the editor's record, replacing any record with the same id.
///
/// # FFI contract
/// - `event_json` may be current- or legacy-shaped; it is normalized first.
/// - Returns the saved record id.
#[flutter_rust_bridge::frb(sync)]
pub fn event_save(event_json: String) -> EventActionResponse {
    let raw = match serde_json::from_str::<serde_json::Value>(&event_json) {
        Ok(raw) => raw,
        Err(err) => return EventActionResponse::failure(format!("event_save failed: {err}")),
    };
    let record = normalize(raw);
    if record.id.trim().is_empty() {
        return EventActionResponse::failure("event_save failed: event id cannot be empty");
    }

    let event_id = record.id.clone();
    match with_event_service(|service| service.save_event(record)) {
        Ok(()) => EventActionResponse::success("Event saved.", event_id),
        Err(err) => EventActionResponse::failure(format!("event_save failed: {err}")),
    }
}

/// Deletes an event. Unknown ids succeed without changes.
#[flutter_rust_bridge::frb(sync)]
pub fn event_delete(id: String) -> EventActionResponse {
    match with_event_service(|service| service.delete_event(&id)) {
        Ok(true) => EventActionResponse::success("Event deleted.", id),
        Ok(false) => EventActionResponse::success("Event not found; nothing deleted.", id),
        Err(err) => EventActionResponse::failure(format!("event_delete failed: {err}")),
    }
}

/// Imports events from JSON text already read by the host.
///
/// # FFI contract
/// - Existing ids are never overwritten.
/// - Success message reports the number of elements checked.
#[flutter_rust_bridge::frb(sync)]
pub fn events_import(text: String) -> ImportResponse {
    to_import_response(with_event_service(|service| service.import_json(&text)))
}

/// Reads an import file to completion and imports it.
#[flutter_rust_bridge::frb(sync)]
pub fn events_import_file(path: String) -> ImportResponse {
    let path = Path::new(path.trim()).to_path_buf();
    to_import_response(with_event_service(|service| service.import_file(&path)))
}

/// Exports the whole collection as indented JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn events_export() -> ExportResponse {
    match with_event_service(|service| service.export_json()) {
        Ok(json) => ExportResponse {
            ok: true,
            json,
            message: "Export ready.".to_string(),
        },
        Err(err) => ExportResponse {
            ok: false,
            json: String::new(),
            message: format!("events_export failed: {err}"),
        },
    }
}

/// Computes totals for one event.
#[flutter_rust_bridge::frb(sync)]
pub fn event_summary(id: String) -> EventSummaryResponse {
    let failure = |message: String| EventSummaryResponse {
        ok: false,
        total_start: 0.0,
        total_end: 0.0,
        cash_revenue: 0.0,
        total_expenses: 0.0,
        net_profit: 0.0,
        message,
    };

    match with_event_service(|service| Ok(service.summary(&id))) {
        Ok(Some(summary)) => EventSummaryResponse {
            ok: true,
            total_start: summary.total_start,
            total_end: summary.total_end,
            cash_revenue: summary.cash_revenue,
            total_expenses: summary.total_expenses,
            net_profit: summary.net_profit,
            message: "Summary computed.".to_string(),
        },
        Ok(None) => failure(format!("event not found: {id}")),
        Err(err) => failure(format!("event_summary failed: {err}")),
    }
}

fn to_import_response(result: Result<ImportReport, String>) -> ImportResponse {
    match result {
        Ok(report) => ImportResponse {
            ok: true,
            seen: saturating_u32(report.seen),
            merged: saturating_u32(report.merged),
            message: format!("{} Datensätze geprüft, Import erfolgreich.", report.seen),
        },
        Err(err) => {
            warn!("event=ffi_import module=ffi status=error error={err}");
            ImportResponse {
                ok: false,
                seen: 0,
                merged: 0,
                message: IMPORT_FAILED_MESSAGE.to_string(),
            }
        }
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn to_list_item(event: &EventData) -> EventListItem {
    EventListItem {
        id: event.id.clone(),
        name: event.name.clone(),
        date: event.date.clone(),
        net_profit: event.summary().net_profit,
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_event_service<T>(
    f: impl FnOnce(&mut EventService<SqliteKvStore<'_>>) -> Result<T, ServiceError>,
) -> Result<T, String> {
    let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let conn = open_db(resolve_db_path()).map_err(|err| format!("event DB open failed: {err}"))?;
    let mut service = EventService::open(SqliteKvStore::new(&conn))
        .map_err(|err| format!("event store load failed: {err}"))?;
    f(&mut service).map_err(|err| err.to_string())
}

use eventbook_core::db::{open_db, open_db_in_memory};
use eventbook_core::{
    EventData, EventService, ImportError, KvStore, ServiceError, SqliteKvStore, StartEntry,
    EVENTS_STORAGE_KEY,
};
use serde_json::json;
use std::io::Write;

fn named(id: &str, name: &str) -> EventData {
    let mut event = EventData::with_id(id);
    event.name = name.to_string();
    event
}

#[test]
fn open_empty_storage_yields_empty_collection() {
    let conn = open_db_in_memory().unwrap();
    let service = EventService::open(SqliteKvStore::new(&conn)).unwrap();

    assert!(service.events().is_empty());
}

#[test]
fn open_recovers_from_malformed_persisted_state() {
    let conn = open_db_in_memory().unwrap();
    SqliteKvStore::new(&conn)
        .set(EVENTS_STORAGE_KEY, "{not valid")
        .unwrap();

    let service = EventService::open(SqliteKvStore::new(&conn)).unwrap();

    assert!(service.events().is_empty());
}

#[test]
fn open_migrates_legacy_persisted_records() {
    let conn = open_db_in_memory().unwrap();
    let legacy = json!([{
        "id": "old",
        "name": "Erntedank",
        "endCashRegister1": 300,
        "endCashRegister2": "120",
        "startEntries": [{"id": "s", "amount": 50, "source": "Bank", "register": 2}]
    }]);
    SqliteKvStore::new(&conn)
        .set(EVENTS_STORAGE_KEY, &legacy.to_string())
        .unwrap();

    let service = EventService::open(SqliteKvStore::new(&conn)).unwrap();

    let event = service.find_event("old").unwrap();
    assert_eq!(event.registers.len(), 2);
    assert_eq!(event.start_entries[0].register_id, "2");
    let summary = service.summary("old").unwrap();
    assert_eq!(summary.total_end, 420.0);
    assert_eq!(summary.cash_revenue, 370.0);
}

#[test]
fn save_event_persists_whole_collection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.db");

    {
        let conn = open_db(&path).unwrap();
        let mut service = EventService::open(SqliteKvStore::new(&conn)).unwrap();
        service.save_event(named("1", "Maifest")).unwrap();
        service.save_event(named("2", "Kirmes")).unwrap();
        service.save_event(named("1", "Maifest 2025")).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let service = EventService::open(SqliteKvStore::new(&conn)).unwrap();
    let names = service
        .events()
        .iter()
        .map(|event| event.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Maifest 2025", "Kirmes"]);
}

#[test]
fn save_event_tolerates_dangling_register_refs() {
    let conn = open_db_in_memory().unwrap();
    let mut service = EventService::open(SqliteKvStore::new(&conn)).unwrap();
    let mut event = named("1", "Maifest");
    event.start_entries.push(StartEntry::new(10.0, "Bank", "missing"));

    service.save_event(event).unwrap();

    assert_eq!(service.events().len(), 1);
    assert_eq!(service.violations().len(), 1);
}

#[test]
fn delete_event_removes_and_persists() {
    let conn = open_db_in_memory().unwrap();
    let mut service = EventService::open(SqliteKvStore::new(&conn)).unwrap();
    service.save_event(named("1", "A")).unwrap();
    service.save_event(named("2", "B")).unwrap();

    assert!(service.delete_event("1").unwrap());
    assert!(!service.delete_event("1").unwrap());

    let reopened = EventService::open(SqliteKvStore::new(&conn)).unwrap();
    assert_eq!(reopened.events().len(), 1);
    assert_eq!(reopened.events()[0].id, "2");
}

#[test]
fn select_event_falls_back_to_new_draft() {
    let conn = open_db_in_memory().unwrap();
    let mut service = EventService::open(SqliteKvStore::new(&conn)).unwrap();
    service.save_event(named("1", "A")).unwrap();

    let existing = service.select_event(Some("1"));
    assert!(!existing.is_new());
    assert_eq!(existing.record().name, "A");

    let unknown = service.select_event(Some("does-not-exist"));
    assert!(unknown.is_new());
    assert_ne!(unknown.record().id, "does-not-exist");

    assert!(service.select_event(None).is_new());
}

#[test]
fn import_json_merges_and_reports_both_counts() {
    let conn = open_db_in_memory().unwrap();
    let mut service = EventService::open(SqliteKvStore::new(&conn)).unwrap();
    service.save_event(named("1", "A")).unwrap();

    let text = json!([
        {"id": "1", "name": "A from file"},
        {"id": "3", "name": "C", "endCashRegister1": "80"}
    ])
    .to_string();
    let report = service.import_json(&text).unwrap();

    assert_eq!(report.seen, 2);
    assert_eq!(report.merged, 1);
    assert_eq!(service.find_event("1").unwrap().name, "A");

    let reopened = EventService::open(SqliteKvStore::new(&conn)).unwrap();
    assert_eq!(reopened.events().len(), 2);
    assert_eq!(reopened.events()[1].registers[0].end_amount, 80.0);
}

#[test]
fn import_json_failures_leave_collection_untouched() {
    let conn = open_db_in_memory().unwrap();
    let mut service = EventService::open(SqliteKvStore::new(&conn)).unwrap();
    service.save_event(named("1", "A")).unwrap();

    let not_json = service.import_json("[{").unwrap_err();
    assert!(matches!(not_json, ServiceError::Import(ImportError::Parse(_))));

    let not_array = service.import_json(r#"{"id": "2"}"#).unwrap_err();
    assert!(matches!(
        not_array,
        ServiceError::Import(ImportError::NotAnArray)
    ));

    assert_eq!(service.events().len(), 1);
}

#[test]
fn import_file_reads_text_and_reports_unreadable_sources() {
    let conn = open_db_in_memory().unwrap();
    let mut service = EventService::open(SqliteKvStore::new(&conn)).unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", json!([{"id": "9", "name": "Import"}])).unwrap();
    let report = service.import_file(file.path()).unwrap();
    assert_eq!(report.merged, 1);

    let dir = tempfile::tempdir().unwrap();
    let err = service.import_file(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ServiceError::Import(ImportError::Unreadable(_))));
}

#[test]
fn export_then_import_into_fresh_store_roundtrips() {
    let source_conn = open_db_in_memory().unwrap();
    let mut source = EventService::open(SqliteKvStore::new(&source_conn)).unwrap();
    let mut event = named("1", "Maifest");
    event.start_entries.push(StartEntry::new(42.0, "Bank", "2"));
    source.save_event(event).unwrap();
    source.save_event(named("2", "Kirmes")).unwrap();
    let exported = source.export_json().unwrap();

    let target_conn = open_db_in_memory().unwrap();
    let mut target = EventService::open(SqliteKvStore::new(&target_conn)).unwrap();
    let report = target.import_json(&exported).unwrap();

    assert_eq!(report.merged, 2);
    assert_eq!(target.events(), source.events());
}

#[test]
fn register_summaries_for_unknown_event_is_none() {
    let conn = open_db_in_memory().unwrap();
    let service = EventService::open(SqliteKvStore::new(&conn)).unwrap();

    assert!(service.summary("nope").is_none());
    assert!(service.register_summaries("nope").is_none());
}

use eventbook_core::store::event_store::{
    export, find, load, merge_import, parse_import, remove, save, upsert, validate_collection,
};
use eventbook_core::{EventData, ImportError, StartEntry, StoreError, Violation};
use serde_json::json;

fn event(id: &str, name: &str) -> EventData {
    let mut event = EventData::with_id(id);
    event.name = name.to_string();
    event
}

fn ids(events: &[EventData]) -> Vec<&str> {
    events.iter().map(|event| event.id.as_str()).collect()
}

#[test]
fn load_malformed_json_is_parse_error() {
    let err = load("{not valid").unwrap_err();
    assert!(matches!(err, StoreError::Parse(_)));
}

#[test]
fn load_non_array_json_yields_empty_collection() {
    assert!(load(r#"{"a":1}"#).unwrap().is_empty());
    assert!(load("null").unwrap().is_empty());
    assert!(load("42").unwrap().is_empty());
}

#[test]
fn load_normalizes_every_element() {
    let text = json!([
        {"id": "old", "endCashRegister1": 50},
        {"id": "new", "registers": [{"id": "r", "name": "Bar", "endAmount": 1}], "startEntries": [], "expenses": []}
    ])
    .to_string();

    let events = load(&text).unwrap();

    assert_eq!(ids(&events), vec!["old", "new"]);
    assert_eq!(events[0].registers[0].end_amount, 50.0);
    assert_eq!(events[1].registers[0].name, "Bar");
}

#[test]
fn save_then_load_preserves_collection() {
    let mut first = event("1", "Maifest");
    first.start_entries.push(StartEntry::new(100.0, "Bank", "1"));
    first.extra.insert("color".to_string(), json!("green"));
    let events = vec![first, event("2", "Kirmes")];

    let text = save(&events).unwrap();
    let loaded = load(&text).unwrap();

    assert_eq!(loaded, events);
}

#[test]
fn export_is_valid_reimportable_json() {
    let events = vec![event("1", "Maifest")];
    let text = export(&events).unwrap();

    assert!(text.contains('\n'));
    let outcome = merge_import(&[], parse_import(&text).unwrap()).unwrap();
    assert_eq!(outcome.events, events);
}

#[test]
fn upsert_replaces_in_place() {
    let events = vec![event("1", "A"), event("2", "B")];
    let modified = event("1", "A modified");

    let next = upsert(&events, modified.clone());

    assert_eq!(next, vec![modified, event("2", "B")]);
    assert_eq!(events[0].name, "A", "input collection must stay untouched");
}

#[test]
fn upsert_appends_unknown_id() {
    let events = vec![event("1", "A")];

    let next = upsert(&events, event("3", "C"));

    assert_eq!(ids(&next), vec!["1", "3"]);
    assert_eq!(events.len(), 1);
}

#[test]
fn remove_drops_matching_record() {
    let events = vec![event("1", "A"), event("2", "B"), event("3", "C")];

    let next = remove(&events, "2");

    assert_eq!(ids(&next), vec!["1", "3"]);
}

#[test]
fn remove_unknown_id_is_noop() {
    let events = vec![event("1", "A"), event("2", "B")];

    assert_eq!(remove(&events, "nonexistent-id"), events);
}

#[test]
fn find_unknown_id_returns_none() {
    let events = vec![event("1", "A")];

    assert_eq!(find(&events, "1").map(|found| found.name.as_str()), Some("A"));
    assert!(find(&events, "missing").is_none());
}

#[test]
fn merge_import_never_overwrites_existing_records() {
    let existing = vec![event("1", "A")];
    let imported = json!([
        {"id": "1", "name": "A prime", "registers": [], "startEntries": [], "expenses": []},
        {"id": "3", "name": "C", "endCashRegister1": 10}
    ]);

    let outcome = merge_import(&existing, imported).unwrap();

    assert_eq!(ids(&outcome.events), vec!["1", "3"]);
    assert_eq!(outcome.events[0].name, "A");
    assert_eq!(outcome.events[1].registers[0].end_amount, 10.0);
    assert_eq!(outcome.seen, 2);
    assert_eq!(outcome.merged, 1);
}

#[test]
fn merge_import_skips_duplicates_within_batch() {
    let imported = json!([
        {"id": "5", "name": "first"},
        {"id": "5", "name": "second"},
        {"id": 6, "name": "numeric id"}
    ]);

    let outcome = merge_import(&[], imported).unwrap();

    assert_eq!(ids(&outcome.events), vec!["5", "6"]);
    assert_eq!(outcome.events[0].name, "first");
    assert_eq!(outcome.seen, 3);
    assert_eq!(outcome.merged, 2);
}

#[test]
fn merge_import_assigns_ids_to_records_without_one() {
    let existing = vec![event("1", "A")];
    let imported = json!([{"name": "a"}, {"name": "b", "id": ""}, {"name": "c", "id": null}]);

    let outcome = merge_import(&existing, imported).unwrap();

    assert_eq!(outcome.seen, 3);
    assert_eq!(outcome.merged, 3);
    let names = outcome.events.iter().map(|event| event.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["A", "a", "b", "c"]);
    assert!(outcome.events.iter().all(|event| !event.id.is_empty()));
    assert!(validate_collection(&outcome.events).is_empty());
}

#[test]
fn merge_import_rejects_non_array() {
    let existing = vec![event("1", "A")];

    let err = merge_import(&existing, json!({"id": "2"})).unwrap_err();

    assert!(matches!(err, ImportError::NotAnArray));
}

#[test]
fn parse_import_rejects_invalid_json() {
    assert!(matches!(
        parse_import("[{").unwrap_err(),
        ImportError::Parse(_)
    ));
}

#[test]
fn validate_collection_reports_soft_violations() {
    let mut broken = event("1", "A");
    broken.start_entries.push(StartEntry::new(5.0, "Bank", "9"));
    let entry_id = broken.start_entries[0].id.clone();
    let events = vec![broken, event("1", "duplicate"), event("2", "B")];

    let violations = validate_collection(&events);

    assert_eq!(
        violations,
        vec![
            Violation::DanglingRegisterRef {
                event_id: "1".to_string(),
                entry_id,
                register_id: "9".to_string(),
            },
            Violation::DuplicateEventId {
                event_id: "1".to_string(),
            },
        ]
    );
}

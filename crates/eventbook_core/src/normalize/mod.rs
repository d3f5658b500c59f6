//! Record normalization: untrusted JSON in, current-shape `EventData` out.
//!
//! # Responsibility
//! - Migrate legacy-shaped records (two fixed registers) to the current shape.
//! - Decode the migrated object leniently, substituting defaults for missing or
//!   malformed fields.
//!
//! # Invariants
//! - `normalize` is total: it never fails and never panics.
//! - `normalize` is idempotent over its own serialized output.
//! - Fields unknown to the model are preserved in each record's `extra` map.
//!
//! # See also
//! - crate::normalize::migrations

pub mod coerce;
pub mod migrations;

use crate::model::event::{CashRegister, EventData, Expense, StartEntry};
use crate::normalize::coerce::{coerce_number, coerce_string};
use crate::normalize::migrations::{migrate, SCHEMA_VERSION_FIELD};
use serde_json::{Map, Value};

/// Normalizes one raw record into the current schema.
///
/// Non-object input is treated as an empty legacy record.
pub fn normalize(raw: Value) -> EventData {
    let object = into_object(raw);
    let (mut object, schema_version) = migrate(object);
    object.remove(SCHEMA_VERSION_FIELD);

    EventData {
        id: take_string(&mut object, "id"),
        name: take_string(&mut object, "name"),
        date: take_string(&mut object, "date"),
        notes: take_string(&mut object, "notes"),
        registers: take_list(&mut object, "registers", decode_register),
        start_entries: take_list(&mut object, "startEntries", decode_start_entry),
        expenses: take_list(&mut object, "expenses", decode_expense),
        ai_summary: take_optional_string(&mut object, "aiSummary"),
        schema_version,
        extra: object,
    }
}

fn decode_register(raw: Value) -> CashRegister {
    let mut object = into_object(raw);
    CashRegister {
        id: take_string(&mut object, "id"),
        name: take_string(&mut object, "name"),
        end_amount: take_number(&mut object, "endAmount"),
        extra: object,
    }
}

fn decode_start_entry(raw: Value) -> StartEntry {
    let mut object = into_object(raw);
    StartEntry {
        id: take_string(&mut object, "id"),
        amount: take_number(&mut object, "amount"),
        source: take_string(&mut object, "source"),
        register_id: take_string(&mut object, "registerId"),
        extra: object,
    }
}

fn decode_expense(raw: Value) -> Expense {
    let mut object = into_object(raw);
    Expense {
        id: take_string(&mut object, "id"),
        amount: take_number(&mut object, "amount"),
        description: take_string(&mut object, "description"),
        category: take_string(&mut object, "category"),
        extra: object,
    }
}

fn into_object(raw: Value) -> Map<String, Value> {
    match raw {
        Value::Object(object) => object,
        _ => Map::new(),
    }
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> String {
    match object.remove(key) {
        Some(Value::String(text)) => text,
        Some(other) => coerce_string(&other, ""),
        None => String::new(),
    }
}

fn take_optional_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    match object.remove(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(coerce_string(&other, "")),
    }
}

fn take_number(object: &mut Map<String, Value>, key: &str) -> f64 {
    object.remove(key).map_or(0.0, |value| coerce_number(&value))
}

fn take_list<T>(
    object: &mut Map<String, Value>,
    key: &str,
    decode: impl Fn(Value) -> T,
) -> Vec<T> {
    match object.remove(key) {
        Some(Value::Array(items)) => items.into_iter().map(decode).collect(),
        _ => Vec::new(),
    }
}

//! Record shape migration registry and executor.
//!
//! # Responsibility
//! - Register record migrations in strictly increasing version order.
//! - Detect the version of an untrusted record and migrate it step by step.
//!
//! # Invariants
//! - Each step is a pure function from version `n` to version `n + 1`.
//! - Untagged records are version 0 unless they carry a `registers` array.
//! - A record with a `registers` array is never migrated from version 0.
//! - Records newer than the latest known version pass through untouched.

use crate::model::event::DEFAULT_REGISTER_NAMES;
use crate::normalize::coerce::{coerce_number, coerce_string, is_truthy};
use log::warn;
use serde_json::{Map, Value};

pub(crate) const SCHEMA_VERSION_FIELD: &str = "schemaVersion";

type RecordObject = Map<String, Value>;

#[derive(Clone, Copy)]
struct Migration {
    /// Version produced by this step.
    version: u32,
    apply: fn(RecordObject) -> RecordObject,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    apply: split_fixed_registers,
}];

/// Returns the latest record version this binary can produce.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Detects the schema version of a raw record object.
///
/// The shape sets a floor: a `registers` array means at least version 1. An
/// explicit non-negative integer `schemaVersion` can only raise it.
pub fn detect_version(object: &RecordObject) -> u32 {
    let shape_version = match object.get("registers") {
        Some(Value::Array(_)) => 1,
        _ => 0,
    };
    let tagged = object
        .get(SCHEMA_VERSION_FIELD)
        .and_then(Value::as_u64)
        .map_or(0, |tagged| u32::try_from(tagged).unwrap_or(u32::MAX));

    shape_version.max(tagged)
}

/// Applies every pending migration to `object`.
///
/// Returns the migrated object and its resulting version.
pub(crate) fn migrate(mut object: RecordObject) -> (RecordObject, u32) {
    let current = detect_version(&object);
    let latest = latest_version();

    if current > latest {
        warn!(
            "event=record_migrate module=normalize status=skipped reason=newer_version record_version={} latest_supported={}",
            current, latest
        );
        return (object, current);
    }

    for migration in MIGRATIONS {
        if migration.version <= current {
            continue;
        }
        object = (migration.apply)(object);
    }

    (object, latest)
}

/// Version 0 -> 1: two fixed registers become a register list and start
/// entries reference a register by id instead of by index.
fn split_fixed_registers(mut object: RecordObject) -> RecordObject {
    let legacy_amounts = [
        object.get("endCashRegister1").map_or(0.0, coerce_number),
        object.get("endCashRegister2").map_or(0.0, coerce_number),
    ];
    let registers = DEFAULT_REGISTER_NAMES
        .iter()
        .zip(legacy_amounts)
        .map(|((id, name), end_amount)| {
            let mut register = Map::new();
            register.insert("id".to_string(), Value::from(*id));
            register.insert("name".to_string(), Value::from(*name));
            register.insert("endAmount".to_string(), Value::from(end_amount));
            Value::Object(register)
        })
        .collect::<Vec<_>>();

    let start_entries = match object.remove("startEntries") {
        Some(Value::Array(entries)) => entries.into_iter().map(link_start_entry).collect(),
        _ => Vec::new(),
    };

    let expenses = match object.remove("expenses") {
        Some(value) if is_truthy(&value) => value,
        _ => Value::Array(Vec::new()),
    };

    object.insert("registers".to_string(), Value::Array(registers));
    object.insert("startEntries".to_string(), Value::Array(start_entries));
    object.insert("expenses".to_string(), expenses);
    object
}

fn link_start_entry(entry: Value) -> Value {
    let mut fields = match entry {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    let register_id = fields
        .get("register")
        .map_or_else(|| "1".to_string(), |register| coerce_string(register, "1"));
    fields.insert("registerId".to_string(), Value::from(register_id));
    Value::Object(fields)
}

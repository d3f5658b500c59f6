//! Event record model.
//!
//! # Responsibility
//! - Define `EventData` and its nested register/entry/expense records.
//! - Compute derived `EventSummary` / `RegisterSummary` projections.
//! - Report soft cross-reference violations without enforcing them.
//!
//! # Invariants
//! - Wire field names are camelCase (`endAmount`, `registerId`, ...).
//! - Unknown JSON fields survive a decode/encode cycle through `extra`.
//! - `registers`, `start_entries` and `expenses` preserve insertion order.
//! - Register ids are expected to be unique per event; dangling
//!   `register_id` references are tolerated and only reported.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Latest record schema version written by this crate.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Display names used for the two registers every new or migrated event
/// starts with.
pub const DEFAULT_REGISTER_NAMES: [(&str, &str); 2] = [("1", "Kasse 1"), ("2", "Kasse 2")];

/// One physical till and its closing balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashRegister {
    /// Unique within the owning event only.
    pub id: String,
    pub name: String,
    /// Closing amount. Expected to be >= 0, not enforced.
    pub end_amount: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CashRegister {
    pub fn new(id: impl Into<String>, name: impl Into<String>, end_amount: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            end_amount,
            extra: Map::new(),
        }
    }
}

/// Cash placed into a register before the event starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartEntry {
    pub id: String,
    pub amount: f64,
    /// Where the money came from, e.g. "Bank".
    pub source: String,
    /// Soft reference to `CashRegister::id` in the same event.
    pub register_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StartEntry {
    /// Creates an entry with a generated id.
    pub fn new(amount: f64, source: impl Into<String>, register_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            amount,
            source: source.into(),
            register_id: register_id.into(),
            extra: Map::new(),
        }
    }
}

/// Standalone expense; not tied to a register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    pub description: String,
    pub category: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Expense {
    /// Creates an expense with a generated id.
    pub fn new(amount: f64, description: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            amount,
            description: description.into(),
            category: category.into(),
            extra: Map::new(),
        }
    }
}

/// Top-level unit of storage and identity.
///
/// Records are replaced wholesale on save; callers never patch single fields
/// of a stored record in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    /// Unique within the store's collection.
    pub id: String,
    pub name: String,
    /// Free-form date text as entered by the user.
    pub date: String,
    pub notes: String,
    pub registers: Vec<CashRegister>,
    pub start_entries: Vec<StartEntry>,
    pub expenses: Vec<Expense>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub schema_version: u32,
    /// Fields unknown to this version (legacy columns, newer front-ends).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventData {
    /// Creates an empty draft with a generated id and the two default
    /// registers.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Creates an empty draft with a caller-provided id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            date: String::new(),
            notes: String::new(),
            registers: DEFAULT_REGISTER_NAMES
                .iter()
                .map(|(id, name)| CashRegister::new(*id, *name, 0.0))
                .collect(),
            start_entries: Vec::new(),
            expenses: Vec::new(),
            ai_summary: None,
            schema_version: CURRENT_SCHEMA_VERSION,
            extra: Map::new(),
        }
    }

    /// Looks up a register by id.
    pub fn register(&self, register_id: &str) -> Option<&CashRegister> {
        self.registers.iter().find(|register| register.id == register_id)
    }

    /// Computes event totals.
    pub fn summary(&self) -> EventSummary {
        let total_start = self.start_entries.iter().map(|entry| entry.amount).sum::<f64>();
        let total_end = self
            .registers
            .iter()
            .map(|register| register.end_amount)
            .sum::<f64>();
        let total_expenses = self.expenses.iter().map(|expense| expense.amount).sum::<f64>();
        let cash_revenue = total_end - total_start;

        EventSummary {
            total_start,
            total_end,
            cash_revenue,
            total_expenses,
            net_profit: cash_revenue - total_expenses,
        }
    }

    /// Computes per-register totals in register order.
    ///
    /// Start entries whose `register_id` matches no register are ignored here;
    /// they still count towards `EventSummary::total_start`.
    pub fn register_summaries(&self) -> Vec<RegisterSummary> {
        self.registers
            .iter()
            .map(|register| {
                let total_start = self
                    .start_entries
                    .iter()
                    .filter(|entry| entry.register_id == register.id)
                    .map(|entry| entry.amount)
                    .sum::<f64>();
                RegisterSummary {
                    register_id: register.id.clone(),
                    name: register.name.clone(),
                    total_start,
                    end_amount: register.end_amount,
                    revenue: register.end_amount - total_start,
                }
            })
            .collect()
    }

    /// Runs the soft foreign-key checks for this record.
    ///
    /// Returns an empty list for a consistent record. Never blocks callers;
    /// the result is informational.
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut seen = HashSet::new();

        for register in &self.registers {
            if !seen.insert(register.id.as_str()) {
                violations.push(Violation::DuplicateRegisterId {
                    event_id: self.id.clone(),
                    register_id: register.id.clone(),
                });
            }
        }

        for entry in &self.start_entries {
            if !seen.contains(entry.register_id.as_str()) {
                violations.push(Violation::DanglingRegisterRef {
                    event_id: self.id.clone(),
                    entry_id: entry.id.clone(),
                    register_id: entry.register_id.clone(),
                });
            }
        }

        violations
    }
}

impl Default for EventData {
    fn default() -> Self {
        Self::new()
    }
}

/// Derived event totals. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub total_start: f64,
    pub total_end: f64,
    /// `total_end - total_start`.
    pub cash_revenue: f64,
    pub total_expenses: f64,
    /// `cash_revenue - total_expenses`.
    pub net_profit: f64,
}

/// Derived totals for a single register. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSummary {
    pub register_id: String,
    pub name: String,
    pub total_start: f64,
    pub end_amount: f64,
    pub revenue: f64,
}

/// Soft consistency violation found by a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Two records in one collection share an id.
    DuplicateEventId { event_id: String },
    /// Two registers in one event share an id.
    DuplicateRegisterId {
        event_id: String,
        register_id: String,
    },
    /// A start entry points at a register id that does not exist.
    DanglingRegisterRef {
        event_id: String,
        entry_id: String,
        register_id: String,
    },
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEventId { event_id } => write!(f, "duplicate event id `{event_id}`"),
            Self::DuplicateRegisterId {
                event_id,
                register_id,
            } => write!(
                f,
                "event `{event_id}` has duplicate register id `{register_id}`"
            ),
            Self::DanglingRegisterRef {
                event_id,
                entry_id,
                register_id,
            } => write!(
                f,
                "start entry `{entry_id}` in event `{event_id}` references unknown register `{register_id}`"
            ),
        }
    }
}

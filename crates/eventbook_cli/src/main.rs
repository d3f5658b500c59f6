//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `eventbook_core` linkage with deterministic output.
//! - Optionally report how many events a database file holds.

use eventbook_core::db::open_db;
use eventbook_core::{EventService, SqliteKvStore};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("eventbook_core ping={}", eventbook_core::ping());
    println!("eventbook_core version={}", eventbook_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let conn = match open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("eventbook_core db_open failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    match EventService::open(SqliteKvStore::new(&conn)) {
        Ok(service) => {
            println!("eventbook_core events={}", service.events().len());
            println!("eventbook_core violations={}", service.violations().len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("eventbook_core events_load failed: {err}");
            ExitCode::FAILURE
        }
    }
}

//! Connection bootstrap utilities for SQLite.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - `OpenedDb::created` is true only when the schema started at version 0.

use super::migrations::apply_migrations;
use super::{DbError, DbResult, OpenedDb};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens (or creates) a SQLite database file and applies pending migrations.
///
/// Emits `db_open` events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<OpenedDb> {
    bootstrap("file", || Connection::open(path))
}

/// Opens an in-memory SQLite database. Always reports `created = true`.
pub fn open_db_in_memory() -> DbResult<OpenedDb> {
    bootstrap("memory", Connection::open_in_memory)
}

fn bootstrap(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<OpenedDb> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let result = connect()
        .map_err(DbError::from)
        .and_then(|mut conn| configure(&mut conn).map(|previous| (conn, previous)));

    match result {
        Ok((conn, previous_version)) => {
            let created = previous_version == 0;
            info!(
                "event=db_open module=db status=ok mode={} created={} duration_ms={}",
                mode,
                created,
                started_at.elapsed().as_millis()
            );
            Ok(OpenedDb { conn, created })
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn configure(conn: &mut Connection) -> DbResult<u32> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)
}

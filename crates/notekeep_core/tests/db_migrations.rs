use notekeep_core::db::migrations::latest_version;
use notekeep_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let opened = open_db_in_memory().unwrap();

    assert!(opened.created);
    assert_eq!(schema_version(&opened.conn), latest_version());
    assert_table_exists(&opened.conn, "notes");
    assert_table_exists(&opened.conn, "schedules");
}

#[test]
fn reopening_file_reports_existing_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notekeep.sqlite3");

    let first = open_db(&path).unwrap();
    assert!(first.created);
    drop(first);

    let second = open_db(&path).unwrap();
    assert!(!second.created);
    assert_eq!(schema_version(&second.conn), latest_version());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

fn open_version_one_database(path: &std::path::Path, with_note: bool) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            text TEXT NOT NULL,
            type TEXT NOT NULL,
            state TEXT NOT NULL,
            creation_date INTEGER NOT NULL
        );
        CREATE TABLE schedules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL,
            date INTEGER NOT NULL
        );
        PRAGMA user_version = 1;",
    )
    .unwrap();
    if with_note {
        conn.execute_batch(
            "INSERT INTO notes (title, text, type, state, creation_date)
             VALUES ('t', 'b', 'TODO', 'DONE', 1);",
        )
        .unwrap();
    }
}

fn seeded_marker_count(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM store_meta WHERE key = 'seeded';",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn upgrade_marks_databases_that_already_held_notes_as_seeded() {
    let dir = tempfile::tempdir().unwrap();
    let used = dir.path().join("used.sqlite3");
    let blank = dir.path().join("blank.sqlite3");
    open_version_one_database(&used, true);
    open_version_one_database(&blank, false);

    let used = open_db(&used).unwrap();
    assert!(!used.created);
    assert_eq!(schema_version(&used.conn), latest_version());
    assert_eq!(seeded_marker_count(&used.conn), 1);

    let blank = open_db(&blank).unwrap();
    assert_table_exists(&blank.conn, "store_meta");
    assert_eq!(seeded_marker_count(&blank.conn), 0);
}

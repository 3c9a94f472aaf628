use rusqlite::Connection;
use taskpad_core::db::migrations::latest_version;
use taskpad_core::db::{open_db, open_db_in_memory, DbError};
use taskpad_core::{KvRepository, SqliteKvRepository};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn reopening_file_database_keeps_schema_and_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskpad.sqlite3");

    let repo = SqliteKvRepository::new(open_db(&path).unwrap());
    repo.put("tasks", r#"{"schema_version":1,"tasks":[]}"#).unwrap();
    drop(repo);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let repo = SqliteKvRepository::new(conn);
    assert_eq!(
        repo.get("tasks").unwrap().as_deref(),
        Some(r#"{"schema_version":1,"tasks":[]}"#)
    );
}

#[test]
fn sqlite_kv_put_overwrites_single_row() {
    let repo = SqliteKvRepository::new(open_db_in_memory().unwrap());

    repo.put("tasks", "first").unwrap();
    repo.put("tasks", "second").unwrap();
    repo.put("other", "x").unwrap();
    assert_eq!(repo.get("tasks").unwrap().as_deref(), Some("second"));

    repo.remove("tasks").unwrap();
    assert_eq!(repo.get("tasks").unwrap(), None);
    assert_eq!(repo.get("other").unwrap().as_deref(), Some("x"));
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
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

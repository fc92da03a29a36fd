use eventdesk_core::db::migrations::{current_user_version, latest_version};
use eventdesk_core::db::{open_db, open_db_in_memory, DbError};
use eventdesk_core::{RepoError, SqliteEventRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["events", "participants", "tags", "event_participants", "event_tags"] {
        assert_table_exists(&conn, table);
    }
    assert_index_exists(&conn, "idx_event_participants_participant");
    assert_index_exists(&conn, "idx_event_tags_tag");
}

#[test]
fn returned_connection_enforces_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn reopening_file_database_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eventdesk.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO tags (name, color) VALUES ('Sports', '#FF5733');",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let count: i64 = second
        .query_row("SELECT COUNT(*) FROM tags;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

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

#[test]
fn repositories_reject_unmigrated_connections() {
    let raw = Connection::open_in_memory().unwrap();
    let err = SqliteEventRepository::try_new(&raw).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn repositories_reject_connections_without_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    let err = SqliteEventRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::ForeignKeysDisabled));
}

fn schema_version(conn: &Connection) -> u32 {
    current_user_version(conn).unwrap()
}

fn assert_table_exists(conn: &Connection, name: &str) {
    assert!(
        sqlite_object_exists(conn, "table", name),
        "table {name} does not exist"
    );
}

fn assert_index_exists(conn: &Connection, name: &str) {
    assert!(
        sqlite_object_exists(conn, "index", name),
        "index {name} does not exist"
    );
}

fn sqlite_object_exists(conn: &Connection, kind: &str, name: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    exists == 1
}

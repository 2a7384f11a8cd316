use entity_store_core::db::catalog::stored_version;
use entity_store_core::db::{open_db, open_db_in_memory, DbError, DEFAULT_BUSY_TIMEOUT};
use entity_store_core::SchemaCatalog;
use rusqlite::Connection;
use std::time::Duration;

const INVENTORY_JSON: &str = r#"{
    "name": "Inventory",
    "version": 4,
    "entities": [
        {
            "name": "Item",
            "identifier": "sku",
            "fields": [
                { "name": "sku", "type": "text" },
                { "name": "quantity", "type": "integer" }
            ]
        },
        {
            "name": "Shelf",
            "fields": [
                { "name": "id", "type": "uuid" },
                { "name": "label", "type": "text", "optional": true }
            ]
        }
    ]
}"#;

fn inventory() -> SchemaCatalog {
    SchemaCatalog::from_json_str(INVENTORY_JSON).unwrap()
}

#[test]
fn open_db_in_memory_creates_every_kind_table() {
    let conn = open_db_in_memory(&inventory(), DEFAULT_BUSY_TIMEOUT).unwrap();

    assert_eq!(stored_version(&conn).unwrap(), 4);
    assert_table_exists(&conn, "Item");
    assert_table_exists(&conn, "Shelf");
}

#[test]
fn open_db_applies_requested_busy_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(
        dir.path().join("inventory.sqlite3"),
        &inventory(),
        Duration::from_millis(250),
    )
    .unwrap();

    let busy_timeout: i64 = conn
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(busy_timeout, 250);
}

#[test]
fn opening_same_store_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.sqlite3");

    let first = open_db(&path, &inventory(), DEFAULT_BUSY_TIMEOUT).unwrap();
    first
        .execute("INSERT INTO \"Item\" (sku, quantity) VALUES ('a-1', 3);", [])
        .unwrap();
    drop(first);

    let second = open_db(&path, &inventory(), DEFAULT_BUSY_TIMEOUT).unwrap();
    assert_eq!(stored_version(&second).unwrap(), 4);
    let quantity: i64 = second
        .query_row("SELECT quantity FROM \"Item\" WHERE sku = 'a-1';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(quantity, 3);
}

#[test]
fn identifier_column_is_unique() {
    let conn = open_db_in_memory(&inventory(), DEFAULT_BUSY_TIMEOUT).unwrap();
    conn.execute("INSERT INTO \"Item\" (sku, quantity) VALUES ('a', 1);", [])
        .unwrap();

    let duplicate = conn.execute("INSERT INTO \"Item\" (sku, quantity) VALUES ('a', 2);", []);
    assert!(duplicate.is_err());
}

#[test]
fn opening_store_with_other_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path, &inventory(), DEFAULT_BUSY_TIMEOUT).unwrap_err();
    match err {
        DbError::SchemaVersionMismatch { stored, declared } => {
            assert_eq!(stored, 999);
            assert_eq!(declared, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
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

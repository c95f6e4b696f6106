use contactbook_core::db::migrations::latest_version;
use contactbook_core::db::{open_db, open_db_in_memory, DbError};
use contactbook_core::{Record, RepoError, SnapshotStore, SqliteSnapshotStore};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "contacts");
    assert_table_exists(&conn, "contact_phones");
}

#[test]
fn opening_snapshot_with_newer_schema_version_returns_error() {
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

#[test]
fn load_missing_snapshot_returns_none_without_creating_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("address_book.sqlite3");
    let store = SqliteSnapshotStore::new(&path);

    assert!(store.load().unwrap().is_none());
    assert!(!path.exists());
}

#[test]
fn save_and_load_preserves_order_birthdays_and_phones() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteSnapshotStore::new(dir.path().join("address_book.sqlite3"));

    let mut zed = Record::new("Zed");
    zed.set_birthday("1985-12-31").unwrap();
    zed.add_phone("+380991234567").unwrap();
    zed.add_phone("+380501112233").unwrap();
    zed.add_phone("+380991234567").unwrap();
    let ann = Record::new("Ann");
    let mut bob = Record::new("bob");
    bob.add_phone("0441234567").unwrap();

    let records = vec![zed, ann, bob];
    store.save(&records).unwrap();

    assert_eq!(store.load().unwrap(), Some(records));
}

#[test]
fn save_overwrites_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteSnapshotStore::new(dir.path().join("address_book.sqlite3"));

    store.save(&[Record::new("Ann"), Record::new("Bob")]).unwrap();
    store.save(&[Record::new("Cid")]).unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded, vec![Record::new("Cid")]);

    store.save(&[]).unwrap();
    assert_eq!(store.load().unwrap(), Some(Vec::new()));
}

#[test]
fn save_replaces_file_that_is_not_a_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("address_book.sqlite3");
    std::fs::write(&path, b"legacy pickle bytes, not sqlite").unwrap();
    let store = SqliteSnapshotStore::new(&path);

    let mut ann = Record::new("Ann");
    ann.add_phone("+380991234567").unwrap();
    store.save(std::slice::from_ref(&ann)).unwrap();

    assert_eq!(store.load().unwrap(), Some(vec![ann]));
}

#[test]
fn save_replaces_snapshot_with_newer_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("address_book.sqlite3");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let store = SqliteSnapshotStore::new(&path);
    store.save(&[Record::new("Ann")]).unwrap();

    assert_eq!(store.load().unwrap(), Some(vec![Record::new("Ann")]));
}

#[test]
fn load_rejects_invalid_persisted_phone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("address_book.sqlite3");
    let store = SqliteSnapshotStore::new(&path);
    store.save(&[Record::new("Ann")]).unwrap();

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO contact_phones (contact_name, position, phone) VALUES ('Ann', 0, 'call me');",
        [],
    )
    .unwrap();
    drop(conn);

    let err = store.load().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(ref message) if message.contains("phone")));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "expected table `{table_name}` to exist");
}

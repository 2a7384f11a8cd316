mod common;

use common::{note, notes_options, open_storage, Note, FIXTURES_DIR};
use entity_store_core::db::DbError;
use entity_store_core::{
    EntityFetcher, EntityStorage, EntityStore, OpenError, PersistenceStore, SchemaError,
    SchemaSource, StoreOptions,
};
use std::time::Duration;

const NOTES_V2_JSON: &str = r#"{
    "name": "Notes",
    "version": 2,
    "entities": [
        {
            "name": "Note",
            "fields": [
                { "name": "id", "type": "text" },
                { "name": "text", "type": "text" },
                { "name": "date", "type": "timestamp", "optional": true }
            ]
        }
    ]
}"#;

#[test]
fn second_setup_is_a_no_op() {
    let mut storage = open_storage();
    storage.create::<Note, _>(note("kept", "first handle")).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let other = notes_options().with_store_path(dir.path().join("other.sqlite3"));
    storage.setup(&other);

    assert!(storage.is_setup());
    assert!(storage.store().unwrap().store_path().is_none());
    assert!(storage.fetch_one_by_id::<Note>("kept").unwrap().is_some());
    assert!(!dir.path().join("other.sqlite3").exists());
}

#[test]
fn file_store_is_durable_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let options = notes_options().with_store_path(dir.path().join("notes.sqlite3"));

    {
        let mut storage = EntityStorage::new();
        storage.setup(&options);
        storage.create::<Note, _>(note("a", "persisted")).unwrap();
        storage.create::<Note, _>(note("b", "deleted")).unwrap();
        let doomed: Note = storage.fetch_one_by_id("b").unwrap().unwrap();
        storage.delete(&doomed).unwrap();
    }

    let mut reopened = EntityStorage::new();
    reopened.setup(&options);
    let notes = reopened.fetch_all::<Note>().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].text, "persisted");
}

#[test]
fn storage_accepts_an_explicitly_opened_handle() {
    let store = PersistenceStore::open(&notes_options()).unwrap();
    assert_eq!(store.catalog().name, "Notes");
    assert!(!store.context().has_changes());

    let mut storage = EntityStorage::with_store(store);
    storage.create::<Note, _>(note("x", "injected")).unwrap();
    assert_eq!(storage.fetch_all::<Note>().unwrap().len(), 1);
}

#[test]
fn store_keeps_options_and_applies_busy_timeout() {
    let options = notes_options().with_busy_timeout(Duration::from_millis(1_500));
    let store = PersistenceStore::open(&options).unwrap();

    assert_eq!(store.options(), &options);
    assert!(store.options().is_in_memory());
    let busy_timeout: i64 = store
        .connection()
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(busy_timeout, 1_500);
}

#[test]
fn embedded_schema_source_opens_store() {
    let options = StoreOptions::new("Notes", SchemaSource::Embedded(NOTES_V2_JSON));
    let store = PersistenceStore::open(&options).unwrap();

    assert_eq!(store.catalog().version, 2);
    assert_eq!(store.catalog().kinds().collect::<Vec<_>>(), vec!["Note"]);
}

#[test]
fn open_reports_missing_and_corrupt_schemas() {
    let missing = StoreOptions::new("Absent", SchemaSource::directory(FIXTURES_DIR));
    assert!(matches!(
        PersistenceStore::open(&missing),
        Err(OpenError::Schema(SchemaError::NotFound(_)))
    ));

    let corrupt = StoreOptions::new("Broken", SchemaSource::directory(FIXTURES_DIR));
    assert!(matches!(
        PersistenceStore::open(&corrupt),
        Err(OpenError::Schema(SchemaError::Parse(_)))
    ));

    let invalid = StoreOptions::new("Orphan", SchemaSource::directory(FIXTURES_DIR));
    assert!(matches!(
        PersistenceStore::open(&invalid),
        Err(OpenError::Schema(SchemaError::Invalid(_)))
    ));
}

#[test]
fn store_written_by_other_catalog_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.sqlite3");

    drop(PersistenceStore::open(&notes_options().with_store_path(&path)).unwrap());

    let newer = StoreOptions::new("Notes", SchemaSource::Embedded(NOTES_V2_JSON)).with_store_path(&path);
    match PersistenceStore::open(&newer) {
        Err(OpenError::Db(DbError::SchemaVersionMismatch { stored, declared })) => {
            assert_eq!(stored, 1);
            assert_eq!(declared, 2);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected schema version mismatch"),
    }
}

#[test]
#[should_panic(expected = "failed to load persistent store `Absent`")]
fn setup_with_missing_schema_is_fatal() {
    let mut storage = EntityStorage::new();
    storage.setup(&StoreOptions::new(
        "Absent",
        SchemaSource::directory(FIXTURES_DIR),
    ));
}

#[test]
#[should_panic(expected = "failed to parse schema")]
fn setup_with_corrupt_schema_is_fatal() {
    let mut storage = EntityStorage::new();
    storage.setup(&StoreOptions::new(
        "Broken",
        SchemaSource::directory(FIXTURES_DIR),
    ));
}

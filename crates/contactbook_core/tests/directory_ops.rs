use contactbook_core::{
    Directory, DirectoryError, Record, RepoError, RepoResult, RestoreOutcome, SnapshotStore,
};
use std::cell::{Cell, RefCell};

/// In-memory store that can be told to fail writes.
#[derive(Default)]
struct MemoryStore {
    saved: RefCell<Option<Vec<Record>>>,
    saves: Cell<usize>,
    fail_saves: Cell<bool>,
}

impl SnapshotStore for MemoryStore {
    fn save(&self, records: &[Record]) -> RepoResult<()> {
        if self.fail_saves.get() {
            return Err(RepoError::InvalidData("disk full".to_string()));
        }
        self.saves.set(self.saves.get() + 1);
        *self.saved.borrow_mut() = Some(records.to_vec());
        Ok(())
    }

    fn load(&self) -> RepoResult<Option<Vec<Record>>> {
        Ok(self.saved.borrow().clone())
    }
}

fn record(name: &str, phones: &[&str]) -> Record {
    let mut record = Record::new(name);
    for phone in phones {
        record.add_phone(*phone).unwrap();
    }
    record
}

#[test]
fn add_record_merges_phones_for_same_name() {
    let mut directory = Directory::new(MemoryStore::default());

    let mut first = record("Ann", &["+380991234567"]);
    first.set_birthday("2000-01-01").unwrap();
    directory.add_record(first).unwrap();

    let mut second = record("Ann", &["+380501112233"]);
    second.set_birthday("1999-09-09").unwrap();
    directory.add_record(second).unwrap();

    assert_eq!(directory.len(), 1);
    let ann = directory.get("Ann").unwrap();
    assert_eq!(
        ann.phone_values().collect::<Vec<_>>(),
        vec!["+380991234567", "+380501112233"]
    );
    assert_eq!(ann.birthday().get(), Some("2000-01-01"));
}

#[test]
fn names_are_case_sensitive_keys() {
    let mut directory = Directory::new(MemoryStore::default());
    directory.add_record(record("ann", &[])).unwrap();
    directory.add_record(record("Ann", &[])).unwrap();

    assert_eq!(directory.len(), 2);
    assert!(directory.get("ANN").is_none());
}

#[test]
fn every_mutation_persists_full_snapshot() {
    let mut directory = Directory::new(MemoryStore::default());
    directory.add_record(record("Ann", &["0991234567"])).unwrap();
    directory.add_record(record("Bob", &["0501112233"])).unwrap();
    assert_eq!(directory.store().saves.get(), 2);

    directory.delete_record("Ann").unwrap();
    assert_eq!(directory.store().saves.get(), 3);

    let saved = directory.store().saved.borrow().clone().unwrap();
    assert_eq!(saved, directory.records().to_vec());
}

#[test]
fn delete_record_reports_missing_name() {
    let mut directory = Directory::new(MemoryStore::default());
    let err = directory.delete_record("Nobody").unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound(ref name) if name == "Nobody"));
    assert_eq!(directory.store().saves.get(), 0);
}

#[test]
fn deleted_record_is_not_found_by_name_search() {
    let mut directory = Directory::new(MemoryStore::default());
    directory.add_record(record("Ann", &[])).unwrap();
    directory.add_record(record("Annabel", &[])).unwrap();

    let removed = directory.delete_record("Ann").unwrap();
    assert_eq!(removed.name(), "Ann");

    let hits = directory.search_by_name("Ann");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name(), "Annabel");
}

#[test]
fn search_by_name_is_case_insensitive_in_insertion_order() {
    let mut directory = Directory::new(MemoryStore::default());
    for name in ["Zoe Ann", "bob", "ANNA", "Joanna"] {
        directory.add_record(record(name, &[])).unwrap();
    }

    let names = directory
        .search_by_name("anN")
        .into_iter()
        .map(Record::name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Zoe Ann", "ANNA", "Joanna"]);
}

#[test]
fn search_by_phone_returns_each_record_once() {
    let mut directory = Directory::new(MemoryStore::default());
    directory
        .add_record(record("Ann", &["+380991234567", "+380991234500"]))
        .unwrap();
    directory.add_record(record("Bob", &["+380501112233"])).unwrap();

    let hits = directory.search_by_phone("099123");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name(), "Ann");

    let exact = directory.search_by_phone("0991234567");
    assert_eq!(exact.len(), 1);

    assert!(directory.search_by_phone("777").is_empty());
}

#[test]
fn summaries_are_one_shot_and_restartable_via_new_sequence() {
    let mut directory = Directory::new(MemoryStore::default());
    directory.add_record(record("Ann", &["0991234567"])).unwrap();
    directory.add_record(record("Bob", &[])).unwrap();

    let mut summaries = directory.summaries();
    assert_eq!(
        summaries.next().as_deref(),
        Some("Name: Ann\nPhones:\n- 0991234567\n")
    );
    assert_eq!(summaries.next().as_deref(), Some("Name: Bob\n"));
    assert_eq!(summaries.next(), None);

    assert_eq!(directory.summaries().count(), 2);
}

#[test]
fn failed_save_rolls_back_add_merge_delete_and_edit() {
    let mut directory = Directory::new(MemoryStore::default());
    directory.add_record(record("Ann", &["0991234567"])).unwrap();
    let before = directory.records().to_vec();

    directory.store().fail_saves.set(true);

    let err = directory.add_record(record("Bob", &[])).unwrap_err();
    assert!(matches!(err, DirectoryError::Storage(_)));
    assert!(directory.add_record(record("Ann", &["0501112233"])).is_err());
    assert!(directory.delete_record("Ann").is_err());
    assert!(directory.edit_phone("Ann", "4567", "0670000000").is_err());

    assert_eq!(directory.records(), before.as_slice());
}

#[test]
fn edit_phone_replaces_matches_and_skips_save_when_nothing_matches() {
    let mut directory = Directory::new(MemoryStore::default());
    directory
        .add_record(record("Ann", &["+380991234567", "+380501112233"]))
        .unwrap();
    let saves = directory.store().saves.get();

    assert_eq!(directory.edit_phone("Ann", "000000", "+380670000000").unwrap(), 0);
    assert_eq!(directory.store().saves.get(), saves);

    assert_eq!(directory.edit_phone("Ann", "2233", "+380670000000").unwrap(), 1);
    assert_eq!(directory.store().saves.get(), saves + 1);
    assert_eq!(
        directory.get("Ann").unwrap().phone_values().collect::<Vec<_>>(),
        vec!["+380991234567", "+380670000000"]
    );

    let err = directory.edit_phone("Ann", "4567", "bad").unwrap_err();
    assert!(matches!(err, DirectoryError::Validation(_)));
}

#[test]
fn restore_reports_missing_snapshot_and_keeps_records() {
    let mut directory = Directory::new(MemoryStore::default());
    assert_eq!(directory.restore().unwrap(), RestoreOutcome::NoExistingData);
    assert!(directory.is_empty());
}

#[test]
fn persist_then_restore_into_fresh_directory_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("address_book.sqlite3");

    let mut original = Directory::with_snapshot_file(&path);
    let mut ann = record("Ann", &["+380991234567", "+380501112233"]);
    ann.set_birthday("2000-01-01").unwrap();
    original.add_record(ann).unwrap();
    original.add_record(record("Bob", &[])).unwrap();

    let copy_path = dir.path().join("copy.sqlite3");
    original.persist_to(&copy_path).unwrap();

    let mut restored = Directory::with_snapshot_file(dir.path().join("unused.sqlite3"));
    assert_eq!(
        restored.restore_from(&copy_path).unwrap(),
        RestoreOutcome::Restored { records: 2 }
    );
    assert_eq!(restored.records(), original.records());

    let mut reopened = Directory::with_snapshot_file(&path);
    reopened.restore().unwrap();
    assert_eq!(reopened.records(), original.records());
}

#[test]
fn persist_to_overwrites_non_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.sqlite3");
    std::fs::write(&path, b"\x80\x04garbage").unwrap();

    let mut directory = Directory::new(MemoryStore::default());
    directory.add_record(record("Ann", &["0991234567"])).unwrap();
    directory.persist_to(&path).unwrap();

    let mut restored = Directory::new(MemoryStore::default());
    restored.restore_from(&path).unwrap();
    assert_eq!(restored.records(), directory.records());
}

#[test]
fn restore_from_missing_file_leaves_records_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut directory = Directory::new(MemoryStore::default());
    directory.add_record(record("Ann", &[])).unwrap();

    let outcome = directory
        .restore_from(dir.path().join("missing.sqlite3"))
        .unwrap();
    assert_eq!(outcome, RestoreOutcome::NoExistingData);
    assert_eq!(directory.len(), 1);
}

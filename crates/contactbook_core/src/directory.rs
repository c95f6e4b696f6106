//! Name-keyed contact directory with write-through persistence.
//!
//! # Responsibility
//! - Own every `Record`, keyed by exact name, in insertion order.
//! - Persist the full snapshot after each mutation.
//! - Answer name/phone substring searches.
//!
//! # Invariants
//! - At most one record per name; re-adding a name merges phone lists.
//! - After a mutation returns `Ok`, memory and snapshot agree.
//! - A failed snapshot write rolls the in-memory mutation back.

use crate::model::field::FieldValidationError;
use crate::model::record::Record;
use crate::repo::snapshot_repo::{RepoError, RepoResult, SnapshotStore, SqliteSnapshotStore};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[derive(Debug)]
pub enum DirectoryError {
    /// No record with this exact name.
    NotFound(String),
    Validation(FieldValidationError),
    /// Snapshot write failed; the mutation was rolled back.
    Storage(RepoError),
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "Contact '{name}' does not exist."),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "failed to save contacts: {err}"),
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<FieldValidationError> for DirectoryError {
    fn from(value: FieldValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for DirectoryError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Result of loading a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Snapshot found; the in-memory records were replaced.
    Restored { records: usize },
    /// No snapshot yet; the in-memory records were left as they were.
    NoExistingData,
}

/// Contact directory backed by a snapshot store.
#[derive(Debug)]
pub struct Directory<S: SnapshotStore = SqliteSnapshotStore> {
    records: Vec<Record>,
    store: S,
}

impl Directory<SqliteSnapshotStore> {
    /// Empty directory persisting to the SQLite snapshot at `path`.
    pub fn with_snapshot_file(path: impl AsRef<Path>) -> Self {
        Self::new(SqliteSnapshotStore::new(path.as_ref()))
    }
}

impl<S: SnapshotStore> Directory<S> {
    /// Creates an empty directory. Nothing is loaded or written.
    pub fn new(store: S) -> Self {
        Self {
            records: Vec::new(),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Record> {
        self.position(name).map(|index| &self.records[index])
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Inserts `record`, or merges its phones into the same-named record.
    ///
    /// The existing record's birthday is kept on merge.
    ///
    /// # Errors
    /// - `Storage` when the snapshot write fails; nothing is changed then.
    pub fn add_record(&mut self, record: Record) -> DirectoryResult<()> {
        match self.position(record.name()) {
            Some(index) => {
                let previous_len = self.records[index].phones().len();
                let added = record.phones().len();
                self.records[index].append_phones(record.into_phones());
                if let Err(err) = self.persist() {
                    self.records[index].truncate_phones(previous_len);
                    return Err(err.into());
                }
                info!(
                    "event=contact_add module=directory status=ok merged=true phones_added={}",
                    added
                );
            }
            None => {
                self.records.push(record);
                if let Err(err) = self.persist() {
                    self.records.pop();
                    return Err(err.into());
                }
                info!(
                    "event=contact_add module=directory status=ok merged=false records={}",
                    self.records.len()
                );
            }
        }
        Ok(())
    }

    /// Removes the record named `name` and returns it.
    ///
    /// # Errors
    /// - `NotFound` when no record has this exact name.
    /// - `Storage` when the snapshot write fails; the record is put back.
    pub fn delete_record(&mut self, name: &str) -> DirectoryResult<Record> {
        let index = self
            .position(name)
            .ok_or_else(|| DirectoryError::NotFound(name.to_string()))?;
        let removed = self.records.remove(index);
        if let Err(err) = self.persist() {
            self.records.insert(index, removed);
            return Err(err.into());
        }
        info!(
            "event=contact_delete module=directory status=ok records={}",
            self.records.len()
        );
        Ok(removed)
    }

    /// Replaces phones containing `old_fragment` in the named record.
    ///
    /// Returns the number of replaced phones. Persists only when something
    /// changed.
    pub fn edit_phone(
        &mut self,
        name: &str,
        old_fragment: &str,
        new_phone: &str,
    ) -> DirectoryResult<usize> {
        let index = self
            .position(name)
            .ok_or_else(|| DirectoryError::NotFound(name.to_string()))?;
        let previous = self.records[index].clone();
        let replaced = self.records[index].edit_phone(old_fragment, new_phone)?;
        if replaced == 0 {
            return Ok(0);
        }
        if let Err(err) = self.persist() {
            self.records[index] = previous;
            return Err(err.into());
        }
        info!(
            "event=phone_edit module=directory status=ok replaced={}",
            replaced
        );
        Ok(replaced)
    }

    /// Case-insensitive name substring search, insertion order.
    pub fn search_by_name(&self, fragment: &str) -> Vec<&Record> {
        let needle = fragment.to_lowercase();
        self.records
            .iter()
            .filter(|record| record.name().to_lowercase().contains(needle.as_str()))
            .collect()
    }

    /// Records with at least one phone containing `fragment`, each once.
    pub fn search_by_phone(&self, fragment: &str) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|record| record.phone_values().any(|phone| phone.contains(fragment)))
            .collect()
    }

    /// One-shot sequence of record summaries in insertion order.
    pub fn summaries(&self) -> impl Iterator<Item = String> + '_ {
        self.records.iter().map(Record::to_string)
    }

    /// Writes the full snapshot to the configured store.
    pub fn persist(&self) -> RepoResult<()> {
        self.store.save(&self.records)
    }

    /// Replaces the records with the configured store's snapshot, if any.
    pub fn restore(&mut self) -> RepoResult<RestoreOutcome> {
        let loaded = self.store.load()?;
        Ok(self.apply_loaded(loaded))
    }

    /// Writes the full snapshot to the SQLite file at `path`.
    pub fn persist_to(&self, path: impl AsRef<Path>) -> RepoResult<()> {
        SqliteSnapshotStore::new(path.as_ref()).save(&self.records)
    }

    /// Replaces the records with the SQLite snapshot at `path`, if present.
    pub fn restore_from(&mut self, path: impl AsRef<Path>) -> RepoResult<RestoreOutcome> {
        let loaded = SqliteSnapshotStore::new(path.as_ref()).load()?;
        Ok(self.apply_loaded(loaded))
    }

    fn apply_loaded(&mut self, loaded: Option<Vec<Record>>) -> RestoreOutcome {
        match loaded {
            Some(records) => {
                self.records = records;
                info!(
                    "event=directory_restore module=directory status=ok records={}",
                    self.records.len()
                );
                RestoreOutcome::Restored {
                    records: self.records.len(),
                }
            }
            None => {
                warn!("event=directory_restore module=directory status=no_existing_data");
                RestoreOutcome::NoExistingData
            }
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|record| record.name() == name)
    }
}

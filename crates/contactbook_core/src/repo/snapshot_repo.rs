//! Snapshot store contract and SQLite implementation.
//!
//! # Responsibility
//! - Write the full ordered record list to one snapshot file.
//! - Read it back with name, birthday and phone order intact.
//!
//! # Invariants
//! - `save` writes a sibling staging file and renames it over the target,
//!   so whatever was at the path before (old snapshot, newer schema, or
//!   non-SQLite bytes) is replaced whole or left untouched.
//! - `load` never creates a missing snapshot file.

use crate::db::{open_db, DbError};
use crate::model::field::{BirthdayField, NameField, PhoneField};
use crate::model::record::Record;
use log::{debug, error};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

pub type RepoResult<T> = Result<T, RepoError>;

/// Snapshot persistence error.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Io(std::io::Error),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "snapshot file error: {err}"),
            Self::InvalidData(message) => write!(f, "invalid snapshot data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for full-directory snapshots.
pub trait SnapshotStore {
    /// Overwrites the stored snapshot with `records`, in order.
    fn save(&self, records: &[Record]) -> RepoResult<()>;
    /// Returns `None` when no snapshot exists yet.
    fn load(&self) -> RepoResult<Option<Vec<Record>>>;
}

/// SQLite file snapshot store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteSnapshotStore {
    path: PathBuf,
}

impl SqliteSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn staging_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn write_and_swap(&self, records: &[Record]) -> RepoResult<()> {
        let staging = NamedTempFile::new_in(self.staging_dir())?;
        {
            let mut conn = open_db(staging.path())?;
            write_snapshot(&mut conn, records)?;
        }
        staging
            .persist(&self.path)
            .map_err(|err| RepoError::Io(err.error))?;
        Ok(())
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn save(&self, records: &[Record]) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.write_and_swap(records);

        match &result {
            Ok(()) => debug!(
                "event=snapshot_save module=repo status=ok records={} duration_ms={}",
                records.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=snapshot_save module=repo status=error records={} duration_ms={} error={}",
                records.len(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn load(&self) -> RepoResult<Option<Vec<Record>>> {
        if !self.path.exists() {
            debug!("event=snapshot_load module=repo status=missing");
            return Ok(None);
        }

        let started_at = Instant::now();
        let conn = open_db(&self.path)?;
        let records = read_snapshot(&conn)?;
        debug!(
            "event=snapshot_load module=repo status=ok records={} duration_ms={}",
            records.len(),
            started_at.elapsed().as_millis()
        );
        Ok(Some(records))
    }
}

fn write_snapshot(conn: &mut Connection, records: &[Record]) -> RepoResult<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM contact_phones;", [])?;
    tx.execute("DELETE FROM contacts;", [])?;
    {
        let mut insert_contact = tx.prepare(
            "INSERT INTO contacts (name, position, birthday) VALUES (?1, ?2, ?3);",
        )?;
        let mut insert_phone = tx.prepare(
            "INSERT INTO contact_phones (contact_name, position, phone) VALUES (?1, ?2, ?3);",
        )?;

        for (position, record) in records.iter().enumerate() {
            insert_contact.execute(params![
                record.name(),
                to_position(position)?,
                record.birthday().get(),
            ])?;
            for (phone_position, phone) in record.phone_values().enumerate() {
                insert_phone.execute(params![
                    record.name(),
                    to_position(phone_position)?,
                    phone
                ])?;
            }
        }
    }
    tx.commit()?;
    Ok(())
}

fn read_snapshot(conn: &Connection) -> RepoResult<Vec<Record>> {
    let mut contacts_stmt =
        conn.prepare("SELECT name, birthday FROM contacts ORDER BY position ASC;")?;
    let mut phones_stmt = conn.prepare(
        "SELECT phone FROM contact_phones WHERE contact_name = ?1 ORDER BY position ASC;",
    )?;

    let mut records = Vec::new();
    let mut rows = contacts_stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get("name")?;
        let birthday_text: Option<String> = row.get("birthday")?;
        let birthday = BirthdayField::try_from(birthday_text).map_err(|err| {
            RepoError::InvalidData(format!("contacts.birthday: {err}"))
        })?;

        let mut phones = Vec::new();
        let mut phone_rows = phones_stmt.query([name.as_str()])?;
        while let Some(phone_row) = phone_rows.next()? {
            let phone_text: String = phone_row.get("phone")?;
            let phone = PhoneField::new(phone_text).map_err(|err| {
                RepoError::InvalidData(format!("contact_phones.phone: {err}"))
            })?;
            phones.push(phone);
        }

        records.push(Record::from_parts(NameField::text(name), birthday, phones));
    }

    Ok(records)
}

fn to_position(index: usize) -> RepoResult<i64> {
    i64::try_from(index)
        .map_err(|_| RepoError::InvalidData(format!("position {index} out of range")))
}

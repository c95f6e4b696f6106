//! Core logic for the contact book.
//! This crate is the single source of truth for contact invariants.

pub mod clock;
pub mod command;
pub mod db;
pub mod directory;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

use std::path::{Path, PathBuf};

pub use clock::{Clock, FixedClock, SystemClock};
pub use command::{Command, CommandApi};
pub use directory::{Directory, DirectoryError, DirectoryResult, RestoreOutcome};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::field::{
    BirthdayField, Field, FieldKind, FieldValidationError, NameField, PhoneField,
};
pub use model::record::Record;
pub use repo::snapshot_repo::{RepoError, RepoResult, SnapshotStore, SqliteSnapshotStore};
pub use service::contact_service::{
    AddedContact, ContactService, ContactServiceError, UpcomingBirthday,
};

/// Snapshot file name, resolved against the working directory.
pub const SNAPSHOT_FILE_NAME: &str = "address_book.sqlite3";

/// Snapshot location inside `base_dir`.
pub fn snapshot_path_in(base_dir: impl AsRef<Path>) -> PathBuf {
    base_dir.as_ref().join(SNAPSHOT_FILE_NAME)
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Contact use-case service.
//!
//! # Responsibility
//! - Normalize and check phone input against the `+380` format.
//! - Orchestrate directory calls for add/change/remove/lookup use-cases.
//! - Scan upcoming birthdays against an injected `Clock`.
//!
//! # Invariants
//! - A rejected add never leaves a partial record in the directory.
//! - Service APIs never bypass directory persistence.

use crate::clock::{Clock, SystemClock};
use crate::directory::{Directory, DirectoryError};
use crate::model::field::{occurrence_in_year, FieldValidationError};
use crate::model::record::Record;
use crate::repo::snapshot_repo::{RepoError, SnapshotStore, SqliteSnapshotStore};
use chrono::Datelike;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Required country prefix for accepted numbers.
pub const PHONE_PREFIX: &str = "+380";
/// Length of a normalized number, prefix included.
pub const PHONE_LENGTH: usize = 13;

/// Service error for contact use-cases.
#[derive(Debug)]
pub enum ContactServiceError {
    /// Phone failed the `+380` / 13-character / no-letters rule.
    PhoneFormat(String),
    /// Field predicate rejected a phone or birthday.
    Validation(FieldValidationError),
    /// No contact with this exact name.
    NotFound(String),
    /// Caller input outside the accepted range.
    InvalidInput(String),
    /// Snapshot write failed; the mutation was not applied.
    Storage(RepoError),
}

impl Display for ContactServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PhoneFormat(_) => write!(
                f,
                "You entered the wrong number! The number must start with '{PHONE_PREFIX}' and contain all digits!"
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(name) => write!(f, "Contact '{name}' does not exist."),
            Self::InvalidInput(message) => f.write_str(message),
            Self::Storage(err) => write!(f, "Failed to save contacts: {err}"),
        }
    }
}

impl Error for ContactServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FieldValidationError> for ContactServiceError {
    fn from(value: FieldValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DirectoryError> for ContactServiceError {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::NotFound(name) => Self::NotFound(name),
            DirectoryError::Validation(err) => Self::Validation(err),
            DirectoryError::Storage(err) => Self::Storage(err),
        }
    }
}

/// Accepted contact, echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedContact {
    pub name: String,
    /// Normalized phone as stored.
    pub phone: String,
    pub birthday: Option<String>,
}

/// One hit of an upcoming-birthday scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingBirthday {
    pub name: String,
    /// Birthday as stored (`YYYY-MM-DD`).
    pub birthday: String,
    pub days_until: i64,
}

/// Contact use-cases over an owned directory.
pub struct ContactService<S: SnapshotStore = SqliteSnapshotStore, C: Clock = SystemClock> {
    directory: Directory<S>,
    clock: C,
}

impl<S: SnapshotStore> ContactService<S, SystemClock> {
    pub fn new(directory: Directory<S>) -> Self {
        Self::with_clock(directory, SystemClock)
    }
}

impl<S: SnapshotStore, C: Clock> ContactService<S, C> {
    pub fn with_clock(directory: Directory<S>, clock: C) -> Self {
        Self { directory, clock }
    }

    pub fn directory(&self) -> &Directory<S> {
        &self.directory
    }

    /// Adds a contact, merging the phone into an existing same-named one.
    ///
    /// An empty `birthday` is treated as absent.
    ///
    /// # Errors
    /// - `PhoneFormat` / `Validation` for rejected input; nothing is added.
    /// - `Storage` when the snapshot write fails.
    pub fn add_contact(
        &mut self,
        name: &str,
        phone: &str,
        birthday: Option<&str>,
    ) -> Result<AddedContact, ContactServiceError> {
        let phone = checked_phone(phone)?;
        let birthday = birthday.filter(|value| !value.is_empty());

        let mut record = Record::new(name);
        record.add_phone(phone.as_str())?;
        if let Some(value) = birthday {
            record.set_birthday(value)?;
        }

        self.directory.add_record(record)?;
        Ok(AddedContact {
            name: name.to_string(),
            phone,
            birthday: birthday.map(str::to_string),
        })
    }

    /// Replaces phones of `name` containing `old_phone` with `new_phone`.
    ///
    /// Both numbers are normalized first. Returns the stored new number.
    pub fn change_phone(
        &mut self,
        name: &str,
        old_phone: &str,
        new_phone: &str,
    ) -> Result<String, ContactServiceError> {
        if !self.directory.contains(name) {
            return Err(ContactServiceError::NotFound(name.to_string()));
        }
        let old_phone = normalize_phone(old_phone);
        let new_phone = checked_phone(new_phone)?;
        self.directory
            .edit_phone(name, old_phone.as_str(), new_phone.as_str())?;
        Ok(new_phone)
    }

    pub fn remove_contact(&mut self, name: &str) -> Result<Record, ContactServiceError> {
        Ok(self.directory.delete_record(name)?)
    }

    pub fn phones(&self, name: &str) -> Result<Vec<String>, ContactServiceError> {
        let record = self.find(name)?;
        Ok(record.phone_values().map(str::to_string).collect())
    }

    /// Days until the contact's next birthday; `None` when none is set.
    pub fn days_to_next_birthday(&self, name: &str) -> Result<Option<i64>, ContactServiceError> {
        let record = self.find(name)?;
        Ok(record.days_to_next_birthday(self.clock.today()))
    }

    /// Contacts whose birthday falls within `within_days` from today.
    ///
    /// Results follow directory order. A birthday whose month/day is
    /// before today's month/day is counted towards next year.
    ///
    /// # Errors
    /// - `InvalidInput` when `within_days <= 0`.
    pub fn upcoming_birthdays(
        &self,
        within_days: i64,
    ) -> Result<Vec<UpcomingBirthday>, ContactServiceError> {
        if within_days <= 0 {
            return Err(ContactServiceError::InvalidInput(
                "The number of days must be greater than 0".to_string(),
            ));
        }

        let today = self.clock.today();
        let mut upcoming = Vec::new();
        for record in self.directory.records() {
            let (Some(date), Some(raw)) = (record.birthday().date(), record.birthday().get())
            else {
                continue;
            };

            let passed = date.month() < today.month()
                || (date.month() == today.month() && date.day() < today.day());
            let year = if passed { today.year() + 1 } else { today.year() };
            let days_until = (occurrence_in_year(date, year) - today).num_days();

            if days_until <= within_days {
                upcoming.push(UpcomingBirthday {
                    name: record.name().to_string(),
                    birthday: raw.to_string(),
                    days_until,
                });
            }
        }
        Ok(upcoming)
    }

    /// Searches phones for an all-digit query, names otherwise.
    pub fn search(&self, query: &str) -> Vec<&Record> {
        if !query.is_empty() && query.chars().all(|ch| ch.is_ascii_digit()) {
            self.directory.search_by_phone(query)
        } else {
            self.directory.search_by_name(query)
        }
    }

    fn find(&self, name: &str) -> Result<&Record, ContactServiceError> {
        self.directory
            .get(name)
            .ok_or_else(|| ContactServiceError::NotFound(name.to_string()))
    }
}

/// Strips hyphens and spaces.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|ch| *ch != '-' && *ch != ' ').collect()
}

/// Normalizes `raw` and checks the `+380` country format.
pub fn checked_phone(raw: &str) -> Result<String, ContactServiceError> {
    let phone = normalize_phone(raw);
    let well_formed = phone.chars().count() == PHONE_LENGTH
        && phone.starts_with(PHONE_PREFIX)
        && !phone.chars().skip(1).any(char::is_alphabetic);
    if well_formed {
        Ok(phone)
    } else {
        Err(ContactServiceError::PhoneFormat(phone))
    }
}

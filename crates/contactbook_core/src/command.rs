//! Command surface for line-oriented front-ends.
//!
//! # Responsibility
//! - Expose one function per user command, each returning display text.
//! - Map structured service errors to text in exactly one place.
//!
//! # Invariants
//! - No command panics or returns an error; every failure becomes text.
//! - Logged events carry command names and error kinds only, never contact
//!   names or numbers.

use crate::clock::{Clock, SystemClock};
use crate::model::record::Record;
use crate::repo::snapshot_repo::{SnapshotStore, SqliteSnapshotStore};
use crate::service::contact_service::{ContactService, ContactServiceError};
use log::{debug, warn};

/// One parsed user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        name: String,
        phone: String,
        birthday: Option<String>,
    },
    Change {
        name: String,
        old_phone: String,
        new_phone: String,
    },
    Remove {
        name: String,
    },
    Phone {
        name: String,
    },
    NextBirthday {
        name: String,
    },
    /// `days` is raw user text; parsing is part of the command.
    BirthdayList {
        days: String,
    },
    Search {
        query: String,
    },
    ShowAll,
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Change { .. } => "change",
            Self::Remove { .. } => "remove",
            Self::Phone { .. } => "phone",
            Self::NextBirthday { .. } => "next-birthday",
            Self::BirthdayList { .. } => "birthday-list",
            Self::Search { .. } => "search",
            Self::ShowAll => "show-all",
        }
    }
}

/// Text adapter over `ContactService`.
pub struct CommandApi<S: SnapshotStore = SqliteSnapshotStore, C: Clock = SystemClock> {
    service: ContactService<S, C>,
}

impl<S: SnapshotStore, C: Clock> CommandApi<S, C> {
    pub fn new(service: ContactService<S, C>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ContactService<S, C> {
        &self.service
    }

    /// Runs one command and renders its outcome.
    pub fn execute(&mut self, command: Command) -> String {
        let label = command.label();
        let outcome = match command {
            Command::Add {
                name,
                phone,
                birthday,
            } => self.add(&name, &phone, birthday.as_deref()),
            Command::Change {
                name,
                old_phone,
                new_phone,
            } => self.change(&name, &old_phone, &new_phone),
            Command::Remove { name } => self.remove(&name),
            Command::Phone { name } => self.phone(&name),
            Command::NextBirthday { name } => self.next_birthday(&name),
            Command::BirthdayList { days } => self.birthday_list(&days),
            Command::Search { query } => Ok(self.search(&query)),
            Command::ShowAll => Ok(self.show_all()),
        };

        match outcome {
            Ok(text) => {
                debug!("event=command module=command status=ok command={label}");
                text
            }
            Err(err) => {
                warn!(
                    "event=command module=command status=rejected command={label} error_kind={}",
                    error_kind(&err)
                );
                err.to_string()
            }
        }
    }

    fn add(
        &mut self,
        name: &str,
        phone: &str,
        birthday: Option<&str>,
    ) -> Result<String, ContactServiceError> {
        let added = self.service.add_contact(name, phone, birthday)?;
        Ok(match added.birthday {
            Some(birthday) => format!(
                "Contact '{}' with phone '{}' and birthday '{}' has been added.",
                added.name, added.phone, birthday
            ),
            None => format!(
                "Contact '{}' with phone '{}' has been added.",
                added.name, added.phone
            ),
        })
    }

    fn change(
        &mut self,
        name: &str,
        old_phone: &str,
        new_phone: &str,
    ) -> Result<String, ContactServiceError> {
        let stored = self.service.change_phone(name, old_phone, new_phone)?;
        Ok(format!(
            "The phone number for contact '{name}' has been changed to '{stored}'."
        ))
    }

    fn remove(&mut self, name: &str) -> Result<String, ContactServiceError> {
        self.service.remove_contact(name)?;
        Ok(format!("Contact '{name}' has been removed."))
    }

    fn phone(&self, name: &str) -> Result<String, ContactServiceError> {
        let phones = self.service.phones(name)?;
        Ok(format!(
            "The phone number(s) for contact '{name}' is/are: {}",
            phones.join(", ")
        ))
    }

    fn next_birthday(&self, name: &str) -> Result<String, ContactServiceError> {
        Ok(match self.service.days_to_next_birthday(name)? {
            Some(0) => format!("{name}'s birthday is today! Happy birthday!"),
            Some(days) => format!("The number of days until {name}'s next birthday: {days}"),
            None => format!("Contact '{name}' has no birthday set."),
        })
    }

    fn birthday_list(&self, days: &str) -> Result<String, ContactServiceError> {
        let days = days.trim().parse::<i64>().map_err(|_| {
            ContactServiceError::InvalidInput("The number of days must be an integer!".to_string())
        })?;
        let upcoming = self.service.upcoming_birthdays(days)?;
        if upcoming.is_empty() {
            return Ok(format!("No birthdays in the next {days} days."));
        }
        Ok(upcoming
            .iter()
            .map(|hit| {
                format!(
                    "{}:{}, {}'s birthday through {} days!",
                    hit.name, hit.birthday, hit.name, hit.days_until
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn search(&self, query: &str) -> String {
        render_records("Results:", &self.service.search(query))
            .unwrap_or_else(|| "No contacts found.".to_string())
    }

    fn show_all(&self) -> String {
        let records = self.service.directory().records().iter().collect::<Vec<_>>();
        render_records("Contacts:", &records)
            .unwrap_or_else(|| "The contact list is empty.".to_string())
    }
}

fn render_records(header: &str, records: &[&Record]) -> Option<String> {
    if records.is_empty() {
        return None;
    }
    let mut text = format!("{header}\n");
    for record in records {
        text.push_str(&record.to_string());
        text.push('\n');
    }
    Some(text)
}

fn error_kind(err: &ContactServiceError) -> &'static str {
    match err {
        ContactServiceError::PhoneFormat(_) => "phone_format",
        ContactServiceError::Validation(_) => "validation",
        ContactServiceError::NotFound(_) => "not_found",
        ContactServiceError::InvalidInput(_) => "invalid_input",
        ContactServiceError::Storage(_) => "storage",
    }
}

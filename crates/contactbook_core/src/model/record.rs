//! Contact record aggregate.
//!
//! # Responsibility
//! - Own one contact's name, optional birthday and ordered phone list.
//! - Apply field validation on every phone/birthday mutation.
//!
//! # Invariants
//! - `name` is fixed at construction and serves as the directory key.
//! - Phone order is insertion order; duplicates are kept.

use crate::model::field::{
    occurrence_in_year, BirthdayField, FieldValidationError, NameField, PhoneField,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One contact entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    name: NameField,
    #[serde(default)]
    birthday: BirthdayField,
    #[serde(default)]
    phones: Vec<PhoneField>,
}

impl Record {
    /// Creates a record with no birthday and no phones.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: NameField::text(name),
            birthday: BirthdayField::empty(),
            phones: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.get().unwrap_or_default()
    }

    pub fn birthday(&self) -> &BirthdayField {
        &self.birthday
    }

    pub fn phones(&self) -> &[PhoneField] {
        &self.phones
    }

    /// Phone values in stored order.
    pub fn phone_values(&self) -> impl Iterator<Item = &str> + '_ {
        self.phones.iter().filter_map(PhoneField::get)
    }

    /// Sets the birthday, keeping the previous one on rejection.
    pub fn set_birthday(&mut self, raw: impl Into<String>) -> Result<(), FieldValidationError> {
        self.birthday.set(raw)
    }

    /// Validates `raw` as a phone and appends it.
    pub fn add_phone(&mut self, raw: impl Into<String>) -> Result<(), FieldValidationError> {
        self.phones.push(PhoneField::new(raw)?);
        Ok(())
    }

    /// Removes every phone equal to `raw`. Returns how many were removed.
    pub fn remove_phone(&mut self, raw: &str) -> usize {
        let before = self.phones.len();
        self.phones.retain(|phone| phone.get() != Some(raw));
        before - self.phones.len()
    }

    /// Replaces every phone containing `old_fragment` with `new_raw`.
    ///
    /// Returns the number of replaced phones. `new_raw` is validated before
    /// anything is touched, so a rejection leaves the phone list unchanged.
    pub fn edit_phone(
        &mut self,
        old_fragment: &str,
        new_raw: &str,
    ) -> Result<usize, FieldValidationError> {
        let replacement = PhoneField::new(new_raw)?;
        let mut replaced = 0;
        for phone in &mut self.phones {
            if phone.get().is_some_and(|value| value.contains(old_fragment)) {
                *phone = replacement.clone();
                replaced += 1;
            }
        }
        Ok(replaced)
    }

    /// Days from `today` until the next birthday occurrence; today is 0.
    ///
    /// Returns `None` when no birthday is set.
    pub fn days_to_next_birthday(&self, today: NaiveDate) -> Option<i64> {
        let birthday = self.birthday.date()?;
        let mut next = occurrence_in_year(birthday, today.year());
        if next < today {
            next = occurrence_in_year(birthday, today.year() + 1);
        }
        Some((next - today).num_days())
    }

    pub(crate) fn append_phones(&mut self, phones: Vec<PhoneField>) {
        self.phones.extend(phones);
    }

    pub(crate) fn into_phones(self) -> Vec<PhoneField> {
        self.phones
    }

    pub(crate) fn truncate_phones(&mut self, len: usize) {
        self.phones.truncate(len);
    }

    pub(crate) fn from_parts(
        name: NameField,
        birthday: BirthdayField,
        phones: Vec<PhoneField>,
    ) -> Self {
        Self {
            name,
            birthday,
            phones,
        }
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        if let Some(birthday) = self.birthday.get() {
            writeln!(f, "Birthday: {birthday}")?;
        }
        if !self.phones.is_empty() {
            writeln!(f, "Phones:")?;
            for phone in &self.phones {
                writeln!(f, "- {phone}")?;
            }
        }
        Ok(())
    }
}

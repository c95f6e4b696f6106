//! Validated single-value fields.
//!
//! # Responsibility
//! - Hold one contact value (name, phone, birthday) behind a kind marker.
//! - Run the kind's validation predicate on every assignment.
//!
//! # Invariants
//! - A non-empty field value always satisfies its kind's predicate.
//! - A rejected assignment leaves the previous value untouched.
//! - Deserialization runs the same predicate as `set`.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;

/// Accepted birthday text format.
pub const BIRTHDAY_FORMAT: &str = "%Y-%m-%d";

static PHONE_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]+$").expect("valid phone regex"));

/// Rejection produced by a field kind predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValidationError {
    /// Phone contains something other than digits (after an optional `+`).
    InvalidPhone(String),
    /// Birthday is not a `YYYY-MM-DD` calendar date.
    InvalidBirthday(String),
}

impl Display for FieldValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPhone(value) => write!(
                f,
                "Invalid phone number `{value}`. Phone number must be numeric."
            ),
            Self::InvalidBirthday(value) => write!(
                f,
                "Invalid birthday `{value}`. Birthday must be in the format YYYY-MM-DD."
            ),
        }
    }
}

impl Error for FieldValidationError {}

/// Validation predicate for one field kind.
pub trait FieldKind: Debug + Clone + Copy + PartialEq + Eq {
    fn validate(raw: &str) -> Result<(), FieldValidationError>;
}

/// Free text. Accepts anything, including the empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Text;

/// Phone digits with an optional leading `+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhoneNumber;

/// Calendar date in `YYYY-MM-DD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDate;

impl FieldKind for Text {
    fn validate(_raw: &str) -> Result<(), FieldValidationError> {
        Ok(())
    }
}

impl FieldKind for PhoneNumber {
    fn validate(raw: &str) -> Result<(), FieldValidationError> {
        if PHONE_DIGITS_RE.is_match(raw) {
            Ok(())
        } else {
            Err(FieldValidationError::InvalidPhone(raw.to_string()))
        }
    }
}

impl FieldKind for CalendarDate {
    fn validate(raw: &str) -> Result<(), FieldValidationError> {
        parse_birthday(raw).map(|_| ())
    }
}

/// Typed value holder. Empty until a valid value is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "Option<String>",
    into = "Option<String>",
    bound = "K: FieldKind"
)]
pub struct Field<K: FieldKind> {
    value: Option<String>,
    kind: PhantomData<K>,
}

pub type NameField = Field<Text>;
pub type PhoneField = Field<PhoneNumber>;
pub type BirthdayField = Field<CalendarDate>;

impl<K: FieldKind> Field<K> {
    /// Creates an empty field.
    pub fn empty() -> Self {
        Self {
            value: None,
            kind: PhantomData,
        }
    }

    /// Creates a field holding `raw`, or returns the kind's rejection.
    pub fn new(raw: impl Into<String>) -> Result<Self, FieldValidationError> {
        let mut field = Self::empty();
        field.set(raw)?;
        Ok(field)
    }

    /// Assigns `raw` when it passes validation.
    ///
    /// # Errors
    /// - Returns the kind's rejection; the current value is kept.
    pub fn set(&mut self, raw: impl Into<String>) -> Result<(), FieldValidationError> {
        let raw = raw.into();
        K::validate(raw.as_str())?;
        self.value = Some(raw);
        Ok(())
    }

    pub fn get(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

impl Field<Text> {
    /// Text never fails validation, so construction is infallible.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            kind: PhantomData,
        }
    }
}

impl Field<CalendarDate> {
    /// Parsed date, `None` when the field is empty.
    pub fn date(&self) -> Option<NaiveDate> {
        self.value
            .as_deref()
            .and_then(|value| parse_birthday(value).ok())
    }
}

impl<K: FieldKind> Default for Field<K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: FieldKind> Display for Field<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.value.as_deref().unwrap_or_default())
    }
}

impl<K: FieldKind> TryFrom<Option<String>> for Field<K> {
    type Error = FieldValidationError;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        match value {
            Some(raw) => Self::new(raw),
            None => Ok(Self::empty()),
        }
    }
}

impl<K: FieldKind> From<Field<K>> for Option<String> {
    fn from(field: Field<K>) -> Self {
        field.value
    }
}

/// Parses a birthday in `YYYY-MM-DD` form.
pub fn parse_birthday(raw: &str) -> Result<NaiveDate, FieldValidationError> {
    NaiveDate::parse_from_str(raw, BIRTHDAY_FORMAT)
        .map_err(|_| FieldValidationError::InvalidBirthday(raw.to_string()))
}

/// Returns the month/day of `birthday` placed in `year`.
///
/// Feb 29 falls back to Feb 28 in non-leap years.
pub fn occurrence_in_year(birthday: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, birthday.month(), 28))
        .unwrap_or(birthday)
}

#[cfg(test)]
mod tests {
    use super::{occurrence_in_year, parse_birthday};
    use chrono::NaiveDate;

    #[test]
    fn leap_day_falls_back_to_feb_28() {
        let birthday = parse_birthday("2000-02-29").unwrap();
        assert_eq!(
            occurrence_in_year(birthday, 2023),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
        assert_eq!(
            occurrence_in_year(birthday, 2024),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn parse_birthday_rejects_impossible_dates() {
        assert!(parse_birthday("2023-02-30").is_err());
        assert!(parse_birthday("31-12-2000").is_err());
        assert!(parse_birthday("").is_err());
    }
}

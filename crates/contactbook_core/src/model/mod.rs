//! Contact domain model.
//!
//! # Responsibility
//! - Define validated field types and the `Record` aggregate.
//! - Keep validation rules in one place for input, storage and wire paths.
//!
//! # Invariants
//! - A record is identified by its exact, case-sensitive name.
//! - Every stored phone/birthday passed its field predicate.

pub mod field;
pub mod record;

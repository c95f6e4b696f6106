//! Contact use-case services.
//!
//! # Responsibility
//! - Turn raw caller input into validated directory operations.
//! - Keep front-ends decoupled from storage and field details.

pub mod contact_service;

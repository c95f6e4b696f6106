//! Snapshot persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the save/load contract used by the directory.
//! - Isolate SQLite details from directory and service logic.
//!
//! # Invariants
//! - A save replaces the whole stored snapshot.
//! - Loads validate stored fields instead of masking bad rows.

pub mod snapshot_repo;

//! Repository layer over SQLite.
//!
//! # Responsibility
//! - Keep SQL inside the persistence boundary.
//! - Return semantic errors for unreadable rows alongside transport errors.

pub mod note_repo;

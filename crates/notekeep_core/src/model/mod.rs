//! Note domain model.
//!
//! # Responsibility
//! - Define the note/schedule records and their read-only join.
//! - Define the user-selectable list ordering and the list-row projection.
//! - Produce random sample notes.
//!
//! # Invariants
//! - A note id is assigned by storage at insertion and never reused.
//! - A note owns zero or one schedule.

pub mod generate;
pub mod note;
pub mod row;
pub mod sort_order;

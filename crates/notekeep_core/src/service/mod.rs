//! Core use-case services.
//!
//! # Responsibility
//! - Run note mutations off the presentation thread.
//! - Derive the sorted note list from the store and the persisted sort order.
//! - Offer one presentation-facing facade over both.

pub mod note_store;
pub mod sorted_view;
pub mod view_model;

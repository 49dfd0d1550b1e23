//! Persisted key/value preferences.
//!
//! # Responsibility
//! - Persist string preferences and broadcast which key changed.
//! - Expose one preference as an observable value with lazy activation.
//!
//! # Invariants
//! - Listeners learn about a change only after it is persisted.
//! - A stored value that cannot be decoded is reported, never replaced by the
//!   default.

pub mod observable;
pub mod store;

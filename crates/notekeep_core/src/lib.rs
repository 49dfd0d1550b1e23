//! Core of the notekeep note-taking application.
//!
//! Storage, the write queue, the persisted sort order and the observable
//! projections consumed by presentation layers live here.

pub mod app;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod observable;
pub mod prefs;
pub mod repo;
pub mod service;

pub use app::{AppContext, AppError};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteAndSchedule, NoteDraft, NoteId, NoteState, NoteType, Schedule};
pub use model::row::{NoteRow, ScheduleStatus};
pub use model::sort_order::{SortOrder, SortOrderParseError};
pub use observable::{Dispatcher, Immediate, MainLoop, Observable, Subscription};
pub use prefs::observable::{PreferenceError, PreferenceObservable, PreferenceValue};
pub use prefs::store::{PreferenceStore, PrefsError};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::note_store::{NoteStore, StoreError, StoreOptions};
pub use service::view_model::{NoteViewModel, SORT_ORDER_KEY};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

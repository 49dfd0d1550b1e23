//! Application wiring.
//!
//! # Responsibility
//! - Build the store, the preferences and the view-model from one config.
//! - Hand the assembled graph to the presentation explicitly; nothing here is
//!   global.

use crate::config::AppConfig;
use crate::observable::Dispatcher;
use crate::prefs::store::{PreferenceStore, PrefsError};
use crate::service::note_store::{NoteStore, StoreError, StoreOptions};
use crate::service::view_model::NoteViewModel;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub enum AppError {
    DataDir { path: PathBuf, source: std::io::Error },
    Store(StoreError),
    Prefs(PrefsError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataDir { path, source } => {
                write!(f, "cannot create data directory `{}`: {source}", path.display())
            }
            Self::Store(err) => write!(f, "{err}"),
            Self::Prefs(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DataDir { source, .. } => Some(source),
            Self::Store(err) => Some(err),
            Self::Prefs(err) => Some(err),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PrefsError> for AppError {
    fn from(value: PrefsError) -> Self {
        Self::Prefs(value)
    }
}

/// Fully wired application graph.
pub struct AppContext {
    pub store: Arc<NoteStore>,
    pub prefs: Arc<PreferenceStore>,
    pub view_model: NoteViewModel,
}

impl AppContext {
    /// Opens storage under `config.data_dir`, seeding a new database.
    pub fn open(config: &AppConfig, dispatcher: Arc<dyn Dispatcher>) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.data_dir).map_err(|source| AppError::DataDir {
            path: config.data_dir.clone(),
            source,
        })?;

        let options = StoreOptions {
            seed_note_count: config.seed_note_count,
            ..StoreOptions::default()
        };
        let store = Arc::new(NoteStore::open(
            config.db_path(),
            options,
            Arc::clone(&dispatcher),
        )?);
        let prefs = Arc::new(PreferenceStore::open(config.prefs_path())?);
        let view_model = NoteViewModel::new(Arc::clone(&store), Arc::clone(&prefs), dispatcher);

        info!(
            "event=app_open module=app status=ok data_dir={}",
            config.data_dir.display()
        );
        Ok(Self {
            store,
            prefs,
            view_model,
        })
    }
}

//! JSON-file preference store with change listeners.
//!
//! # Invariants
//! - Writes go to a temporary file that is renamed over the target.
//! - Writing the value a key already holds is a no-op and notifies nobody.
//! - Listeners run on the writing thread, after the store lock is released.

use log::{debug, error};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type PrefsResult<T> = Result<T, PrefsError>;

/// Callback receiving the key that changed.
pub type PreferenceListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle returned by [`PreferenceStore::register_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug)]
pub enum PrefsError {
    Io { path: PathBuf, source: std::io::Error },
    Json { path: PathBuf, source: serde_json::Error },
}

impl Display for PrefsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "preference file `{}`: {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "preference file `{}` is not valid: {source}", path.display())
            }
        }
    }
}

impl Error for PrefsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: BTreeMap<ListenerId, PreferenceListener>,
}

/// String preferences, optionally persisted to a JSON object file.
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: Mutex<BTreeMap<String, String>>,
    listeners: Mutex<Listeners>,
}

impl PreferenceStore {
    /// Opens the preference file, starting empty when it does not exist.
    pub fn open(path: impl AsRef<Path>) -> PrefsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = read_values(&path)?;
        debug!(
            "event=prefs_open module=prefs status=ok keys={} path={}",
            values.len(),
            path.display()
        );
        Ok(Self {
            path: Some(path),
            values: Mutex::new(values),
            listeners: Mutex::new(Listeners::default()),
        })
    }

    /// Store that never touches the file system.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(BTreeMap::new()),
            listeners: Mutex::new(Listeners::default()),
        }
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.values).contains_key(key)
    }

    /// Persists `value` under `key` and notifies listeners when it changed.
    pub fn put_string(&self, key: &str, value: &str) -> PrefsResult<()> {
        let changed = {
            let mut values = lock(&self.values);
            if values.get(key).map(String::as_str) == Some(value) {
                false
            } else {
                let previous = values.insert(key.to_string(), value.to_string());
                if let Err(err) = self.persist(&values) {
                    restore(&mut values, key, previous);
                    return Err(err);
                }
                true
            }
        };

        if changed {
            self.notify(key);
        }
        Ok(())
    }

    /// Removes `key` and notifies listeners when it was present.
    pub fn remove(&self, key: &str) -> PrefsResult<()> {
        let removed = {
            let mut values = lock(&self.values);
            match values.remove(key) {
                Some(previous) => {
                    if let Err(err) = self.persist(&values) {
                        values.insert(key.to_string(), previous);
                        return Err(err);
                    }
                    true
                }
                None => false,
            }
        };

        if removed {
            self.notify(key);
        }
        Ok(())
    }

    /// Re-reads the backing file and notifies every key whose value differs.
    ///
    /// Picks up edits made by another process. No-op for in-memory stores.
    pub fn reload(&self) -> PrefsResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let fresh = read_values(path)?;

        let changed_keys: Vec<String> = {
            let mut values = lock(&self.values);
            let changed = values
                .keys()
                .chain(fresh.keys())
                .filter(|key| values.get(*key) != fresh.get(*key))
                .cloned()
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect();
            *values = fresh;
            changed
        };

        for key in &changed_keys {
            self.notify(key);
        }
        Ok(())
    }

    pub fn register_listener(&self, listener: PreferenceListener) -> ListenerId {
        let mut listeners = lock(&self.listeners);
        let id = ListenerId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.insert(id, listener);
        id
    }

    /// Returns `false` when `id` was not registered.
    pub fn unregister_listener(&self, id: ListenerId) -> bool {
        lock(&self.listeners).entries.remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }

    fn notify(&self, key: &str) {
        let listeners: Vec<PreferenceListener> =
            lock(&self.listeners).entries.values().cloned().collect();
        for listener in listeners {
            listener(key);
        }
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> PrefsResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source: std::io::Error| PrefsError::Io {
            path: path.clone(),
            source,
        };

        let body = serde_json::to_vec_pretty(values).map_err(|source| PrefsError::Json {
            path: path.clone(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, body).map_err(io_err)?;
        fs::rename(&staging, path).map_err(|err| {
            error!(
                "event=prefs_write module=prefs status=error path={} error={}",
                path.display(),
                err
            );
            io_err(err)
        })
    }
}

fn restore(values: &mut BTreeMap<String, String>, key: &str, previous: Option<String>) {
    match previous {
        Some(previous) => {
            values.insert(key.to_string(), previous);
        }
        None => {
            values.remove(key);
        }
    }
}

fn read_values(path: &Path) -> PrefsResult<BTreeMap<String, String>> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| PrefsError::Json {
            path: path.to_path_buf(),
            source,
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(source) => Err(PrefsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn lock<S>(mutex: &Mutex<S>) -> MutexGuard<'_, S> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::PreferenceStore;
    use std::sync::{Arc, Mutex};

    fn key_log(store: &PreferenceStore) -> Arc<Mutex<Vec<String>>> {
        let keys = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&keys);
        store.register_listener(Arc::new(move |key: &str| {
            sink.lock().unwrap().push(key.to_string());
        }));
        keys
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let store = PreferenceStore::open(&path).unwrap();
        store.put_string("sort_order", "BY_ETA").unwrap();
        drop(store);

        let reopened = PreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.get_string("sort_order").as_deref(), Some("BY_ETA"));
    }

    #[test]
    fn listeners_hear_changed_keys_only() {
        let store = PreferenceStore::in_memory();
        let keys = key_log(&store);

        store.put_string("a", "1").unwrap();
        store.put_string("a", "1").unwrap();
        store.put_string("b", "2").unwrap();
        store.remove("a").unwrap();
        store.remove("missing").unwrap();

        assert_eq!(*keys.lock().unwrap(), vec!["a", "b", "a"]);
    }

    #[test]
    fn unregistered_listener_is_silent() {
        let store = PreferenceStore::in_memory();
        let calls = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&calls);
        let id = store.register_listener(Arc::new(move |_: &str| {
            *sink.lock().unwrap() += 1;
        }));

        assert!(store.unregister_listener(id));
        assert!(!store.unregister_listener(id));
        store.put_string("a", "1").unwrap();
        assert_eq!(*calls.lock().unwrap(), 0);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn reload_notifies_keys_edited_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let store = PreferenceStore::open(&path).unwrap();
        store.put_string("kept", "x").unwrap();
        store.put_string("edited", "old").unwrap();
        let keys = key_log(&store);

        std::fs::write(&path, r#"{"kept":"x","edited":"new","added":"y"}"#).unwrap();
        store.reload().unwrap();

        assert_eq!(*keys.lock().unwrap(), vec!["added", "edited"]);
        assert_eq!(store.get_string("edited").as_deref(), Some("new"));
    }

    #[test]
    fn malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(PreferenceStore::open(&path).is_err());
    }
}

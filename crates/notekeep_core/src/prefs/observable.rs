//! One preference exposed as an observable value.
//!
//! # Responsibility
//! - Decode the stored text into `T`, falling back to the default only when
//!   the key is absent.
//! - Route writes through the store so that the store's change feed is the
//!   only path that updates observers.
//!
//! # Invariants
//! - The store listener is registered only while the observable has observers.
//! - Activation reloads the backing file and then the value, so changes made
//!   while inactive, in or out of process, are seen by the first new observer.
//! - Changes to other keys are ignored.

use crate::model::sort_order::SortOrder;
use crate::observable::{Dispatcher, Observable, ObservableLifecycle, WeakObservable};
use crate::prefs::store::{ListenerId, PreferenceStore, PrefsResult};
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Text codec for values kept in a [`PreferenceStore`].
pub trait PreferenceValue: Clone + Send + Sync + 'static {
    fn to_pref_string(&self) -> String;
    /// Returns `None` when `value` is not a valid encoding.
    fn from_pref_string(value: &str) -> Option<Self>;
}

impl PreferenceValue for SortOrder {
    fn to_pref_string(&self) -> String {
        self.name().to_string()
    }

    fn from_pref_string(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

impl PreferenceValue for String {
    fn to_pref_string(&self) -> String {
        self.clone()
    }

    fn from_pref_string(value: &str) -> Option<Self> {
        Some(value.to_string())
    }
}

impl PreferenceValue for bool {
    fn to_pref_string(&self) -> String {
        self.to_string()
    }

    fn from_pref_string(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

impl PreferenceValue for i64 {
    fn to_pref_string(&self) -> String {
        self.to_string()
    }

    fn from_pref_string(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

/// Stored preference text that does not decode to a known value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceError {
    Corrupt { key: String, value: String },
}

impl Display for PreferenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Corrupt { key, value } => {
                write!(f, "stored preference `{key}` has unrecognized value `{value}`")
            }
        }
    }
}

impl Error for PreferenceError {}

/// Observable view of the preference stored under `key`.
pub struct PreferenceObservable<T: PreferenceValue> {
    store: Arc<PreferenceStore>,
    key: String,
    default: T,
    observable: Observable<T>,
}

impl<T: PreferenceValue> PreferenceObservable<T> {
    pub fn new(
        store: Arc<PreferenceStore>,
        key: impl Into<String>,
        default: T,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        let key = key.into();
        let binding = PreferenceBinding {
            store: Arc::downgrade(&store),
            key: key.clone(),
            default: default.clone(),
            listener: Mutex::new(None),
        };
        Self {
            observable: Observable::with_lifecycle(dispatcher, binding),
            store,
            key,
            default,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current value: cached while observed, read from the store otherwise.
    ///
    /// # Errors
    /// - `Corrupt` when the stored text does not decode.
    pub fn get(&self) -> Result<T, PreferenceError> {
        if self.observable.has_observers() {
            if let Some(value) = self.observable.value() {
                return Ok(value);
            }
        }
        load(&self.store, &self.key, &self.default)
    }

    /// Writes `value` to the store; observers are updated by its change feed.
    pub fn set(&self, value: &T) -> PrefsResult<()> {
        self.store.put_string(&self.key, &value.to_pref_string())
    }

    pub fn observe(&self) -> Observable<T> {
        self.observable.clone()
    }
}

struct PreferenceBinding<T> {
    store: Weak<PreferenceStore>,
    key: String,
    default: T,
    listener: Mutex<Option<ListenerId>>,
}

impl<T: PreferenceValue> ObservableLifecycle<T> for PreferenceBinding<T> {
    fn on_active(&self, target: &Observable<T>) {
        let Some(store) = self.store.upgrade() else {
            return;
        };

        // Before registering, so a changed file does not notify this binding twice.
        if let Err(err) = store.reload() {
            error!(
                "event=pref_reload module=prefs status=error key={} error={}",
                self.key, err
            );
        }

        let listener = {
            let store = Weak::clone(&self.store);
            let key = self.key.clone();
            let default = self.default.clone();
            let target = target.downgrade();
            store_listener(store, key, default, target)
        };
        let id = store.register_listener(listener);
        if let Some(stale) = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(id)
        {
            store.unregister_listener(stale);
        }
        debug!(
            "event=pref_observe module=prefs status=active key={}",
            self.key
        );

        refresh(&store, &self.key, &self.default, target);
    }

    fn on_inactive(&self, _target: &Observable<T>) {
        let id = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let (Some(id), Some(store)) = (id, self.store.upgrade()) {
            store.unregister_listener(id);
        }
        debug!(
            "event=pref_observe module=prefs status=inactive key={}",
            self.key
        );
    }
}

fn store_listener<T: PreferenceValue>(
    store: Weak<PreferenceStore>,
    key: String,
    default: T,
    target: WeakObservable<T>,
) -> Arc<dyn Fn(&str) + Send + Sync> {
    Arc::new(move |changed_key: &str| {
        if changed_key != key {
            return;
        }
        if let (Some(store), Some(target)) = (store.upgrade(), target.upgrade()) {
            refresh(&store, &key, &default, &target);
        }
    })
}

fn refresh<T: PreferenceValue>(
    store: &PreferenceStore,
    key: &str,
    default: &T,
    target: &Observable<T>,
) {
    match load(store, key, default) {
        Ok(value) => target.set_value(value),
        Err(err) => {
            target.clear_value();
            error!(
                "event=pref_load module=prefs status=error key={} error_code=corrupt_value error={}",
                key, err
            );
        }
    }
}

fn load<T: PreferenceValue>(
    store: &PreferenceStore,
    key: &str,
    default: &T,
) -> Result<T, PreferenceError> {
    match store.get_string(key) {
        None => Ok(default.clone()),
        Some(text) => T::from_pref_string(&text).ok_or(PreferenceError::Corrupt {
            key: key.to_string(),
            value: text,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{PreferenceError, PreferenceObservable, PreferenceValue};
    use crate::model::sort_order::SortOrder;
    use crate::observable::{Immediate, MainLoop};
    use crate::prefs::store::PreferenceStore;
    use std::sync::{Arc, Mutex};

    const KEY: &str = "sort_order";

    fn sort_pref(store: &Arc<PreferenceStore>) -> PreferenceObservable<SortOrder> {
        PreferenceObservable::new(
            Arc::clone(store),
            KEY,
            SortOrder::None,
            Arc::new(Immediate),
        )
    }

    #[test]
    fn absent_key_yields_default() {
        let store = Arc::new(PreferenceStore::in_memory());
        assert_eq!(sort_pref(&store).get().unwrap(), SortOrder::None);
    }

    #[test]
    fn set_persists_symbolic_name() {
        let store = Arc::new(PreferenceStore::in_memory());
        let pref = sort_pref(&store);
        pref.set(&SortOrder::ByCreationDate).unwrap();

        assert_eq!(store.get_string(KEY).as_deref(), Some("BY_CREATION_DATE"));
        assert_eq!(pref.get().unwrap(), SortOrder::ByCreationDate);
    }

    #[test]
    fn corrupt_value_fails_instead_of_defaulting() {
        let store = Arc::new(PreferenceStore::in_memory());
        store.put_string(KEY, "SIDEWAYS").unwrap();

        let err = sort_pref(&store).get().unwrap_err();
        assert_eq!(
            err,
            PreferenceError::Corrupt {
                key: KEY.to_string(),
                value: "SIDEWAYS".to_string()
            }
        );
    }

    #[test]
    fn corrupt_value_is_not_published() {
        let store = Arc::new(PreferenceStore::in_memory());
        let pref = sort_pref(&store);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = pref.observe().subscribe(move |order: &SortOrder| {
            sink.lock().unwrap().push(*order);
        });

        store.put_string(KEY, "SIDEWAYS").unwrap();
        pref.set(&SortOrder::ByEta).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![SortOrder::None, SortOrder::ByEta]);
    }

    #[test]
    fn listener_is_registered_only_while_observed() {
        let store = Arc::new(PreferenceStore::in_memory());
        let pref = sort_pref(&store);
        assert_eq!(store.listener_count(), 0);

        let subscription = pref.observe().subscribe(|_| {});
        assert_eq!(store.listener_count(), 1);

        drop(subscription);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn writes_reach_observers_through_store_feed() {
        let main = MainLoop::new();
        let store = Arc::new(PreferenceStore::in_memory());
        let pref = PreferenceObservable::new(
            Arc::clone(&store),
            KEY,
            SortOrder::None,
            main.dispatcher(),
        );
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = pref.observe().subscribe(move |order: &SortOrder| {
            sink.lock().unwrap().push(*order);
        });
        main.run_pending();

        for order in [SortOrder::ByEta, SortOrder::ByCreationDate] {
            pref.set(&order).unwrap();
            main.run_pending();
        }

        assert_eq!(
            *seen.lock().unwrap(),
            vec![SortOrder::None, SortOrder::ByEta, SortOrder::ByCreationDate]
        );
    }

    #[test]
    fn other_keys_do_not_trigger_emission() {
        let store = Arc::new(PreferenceStore::in_memory());
        let pref = sort_pref(&store);
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let _subscription = pref.observe().subscribe(move |_| {
            *sink.lock().unwrap() += 1;
        });

        store.put_string("theme", "dark").unwrap();
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn primitive_codecs_reject_garbage() {
        assert_eq!(bool::from_pref_string("true"), Some(true));
        assert_eq!(bool::from_pref_string("yes"), None);
        assert_eq!(i64::from_pref_string("-42"), Some(-42));
        assert_eq!(i64::from_pref_string("4x"), None);
        assert_eq!(
            String::from_pref_string("anything").as_deref(),
            Some("anything")
        );
    }
}

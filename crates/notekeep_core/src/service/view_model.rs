//! Presentation-facing facade.
//!
//! # Responsibility
//! - Expose the note list, the count and the sorted list as observables.
//! - Forward mutation and sort-order commands without blocking the caller.
//!
//! # Invariants
//! - Commands never return errors to the caller; failures are logged.
//! - The sort order is persisted under [`SORT_ORDER_KEY`].

use crate::model::note::NoteAndSchedule;
use crate::model::sort_order::SortOrder;
use crate::observable::{Dispatcher, Observable};
use crate::prefs::observable::{PreferenceError, PreferenceObservable};
use crate::prefs::store::PreferenceStore;
use crate::service::note_store::NoteStore;
use crate::service::sorted_view::SortedNoteView;
use log::{error, info};
use std::sync::Arc;

/// Preference key holding the sort order name.
pub const SORT_ORDER_KEY: &str = "sort_order";

pub struct NoteViewModel {
    store: Arc<NoteStore>,
    sort_order: PreferenceObservable<SortOrder>,
    sorted: SortedNoteView,
}

impl NoteViewModel {
    pub fn new(
        store: Arc<NoteStore>,
        prefs: Arc<PreferenceStore>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        let sort_order = PreferenceObservable::new(
            prefs,
            SORT_ORDER_KEY,
            SortOrder::default(),
            Arc::clone(&dispatcher),
        );
        let sorted = SortedNoteView::new(dispatcher, &store.observe_all(), &sort_order.observe());
        Self {
            store,
            sort_order,
            sorted,
        }
    }

    pub fn observe_all(&self) -> Observable<Vec<NoteAndSchedule>> {
        self.store.observe_all()
    }

    pub fn observe_count(&self) -> Observable<i64> {
        self.store.observe_count()
    }

    /// Note list ordered by the persisted sort order.
    pub fn observe_sorted(&self) -> Observable<Vec<NoteAndSchedule>> {
        self.sorted.observe()
    }

    pub fn observe_sort_order(&self) -> Observable<SortOrder> {
        self.sort_order.observe()
    }

    /// # Errors
    /// - `Corrupt` when the persisted name is unknown.
    pub fn sort_order(&self) -> Result<SortOrder, PreferenceError> {
        self.sort_order.get()
    }

    pub fn set_sort_order(&self, order: SortOrder) {
        match self.sort_order.set(&order) {
            Ok(()) => info!("event=sort_order_set module=view_model status=ok order={order}"),
            Err(err) => error!(
                "event=sort_order_set module=view_model status=error order={} error={}",
                order, err
            ),
        }
    }

    pub fn generate_note(&self) {
        self.store.generate_note();
    }

    pub fn delete_all_notes(&self) {
        self.store.delete_all_notes();
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }
}

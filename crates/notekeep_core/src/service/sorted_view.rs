//! Note list sorted by the active sort order.
//!
//! # Invariants
//! - Nothing is emitted until both the list and the sort order are known.
//! - Each emission is a permutation of the latest list.

use crate::model::note::NoteAndSchedule;
use crate::model::sort_order::SortOrder;
use crate::observable::{combine_latest, Dispatcher, Observable};
use std::sync::Arc;

/// Re-sorts the latest note list whenever it or the sort order changes.
pub struct SortedNoteView {
    output: Observable<Vec<NoteAndSchedule>>,
}

impl SortedNoteView {
    pub fn new(
        dispatcher: Arc<dyn Dispatcher>,
        notes: &Observable<Vec<NoteAndSchedule>>,
        sort_order: &Observable<SortOrder>,
    ) -> Self {
        Self {
            output: combine_latest(dispatcher, notes, sort_order, |notes, order| {
                order.sorted(notes)
            }),
        }
    }

    pub fn observe(&self) -> Observable<Vec<NoteAndSchedule>> {
        self.output.clone()
    }
}

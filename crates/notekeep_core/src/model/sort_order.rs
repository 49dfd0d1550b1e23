//! User-selectable ordering of the note list.
//!
//! # Invariants
//! - `None` never reorders its input.
//! - Every ordering is stable and a permutation of its input.
//! - The persisted form is the symbolic name (`BY_ETA`, `BY_CREATION_DATE`, `NONE`).

use crate::model::note::NoteAndSchedule;
use std::cmp::Reverse;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Scheduled notes first by ascending due date, unscheduled notes last.
    ByEta,
    /// Most recently created first.
    ByCreationDate,
    /// Storage order.
    #[default]
    None,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::ByEta, SortOrder::ByCreationDate, SortOrder::None];

    pub fn name(self) -> &'static str {
        match self {
            Self::ByEta => "BY_ETA",
            Self::ByCreationDate => "BY_CREATION_DATE",
            Self::None => "NONE",
        }
    }

    /// Returns `notes` reordered by this policy.
    pub fn sorted(self, notes: &[NoteAndSchedule]) -> Vec<NoteAndSchedule> {
        let mut sorted = notes.to_vec();
        match self {
            Self::ByEta => sorted.sort_by_key(|item| (item.schedule.is_none(), item.due_date())),
            Self::ByCreationDate => sorted.sort_by_key(|item| Reverse(item.note.creation_date)),
            Self::None => {}
        }
        sorted
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Text that names no known `SortOrder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrderParseError(pub String);

impl Display for SortOrderParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown sort order `{}`; expected BY_ETA|BY_CREATION_DATE|NONE",
            self.0
        )
    }
}

impl Error for SortOrderParseError {}

impl FromStr for SortOrder {
    type Err = SortOrderParseError;

    /// Parses the exact symbolic name.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.name() == value)
            .ok_or_else(|| SortOrderParseError(value.to_string()))
    }
}

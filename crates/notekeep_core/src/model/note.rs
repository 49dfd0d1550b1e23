//! Note and schedule records.

/// Storage-assigned note identifier.
pub type NoteId = i64;

/// Category of a note, used by the presentation for its icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteType {
    None,
    Todo,
    Shopping,
    Work,
    Family,
}

impl NoteType {
    pub const ALL: [NoteType; 5] = [
        NoteType::None,
        NoteType::Todo,
        NoteType::Shopping,
        NoteType::Work,
        NoteType::Family,
    ];
}

/// Progress of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteState {
    InProgress,
    Done,
}

impl NoteState {
    pub const ALL: [NoteState; 2] = [NoteState::InProgress, NoteState::Done];
}

/// Persisted note. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub text: String,
    /// Stored in the `type` column.
    pub kind: NoteType,
    pub state: NoteState,
    /// Unix epoch milliseconds.
    pub creation_date: i64,
}

/// Note content before storage assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub text: String,
    pub kind: NoteType,
    pub state: NoteState,
    pub creation_date: i64,
}

impl NoteDraft {
    /// Attaches the storage-assigned id.
    pub fn into_note(self, id: NoteId) -> Note {
        Note {
            id,
            title: self.title,
            text: self.text,
            kind: self.kind,
            state: self.state,
            creation_date: self.creation_date,
        }
    }
}

/// Due date attached to one note.
///
/// `owner_id` is not enforced by storage; a schedule may outlive its note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub id: i64,
    pub owner_id: NoteId,
    /// Unix epoch milliseconds.
    pub date: i64,
}

/// A note paired with its schedule, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteAndSchedule {
    pub note: Note,
    pub schedule: Option<Schedule>,
}

impl NoteAndSchedule {
    pub fn due_date(&self) -> Option<i64> {
        self.schedule.as_ref().map(|schedule| schedule.date)
    }
}

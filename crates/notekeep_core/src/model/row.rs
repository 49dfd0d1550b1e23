//! List-row projection used by presentation layers.

use crate::model::note::{Note, NoteAndSchedule, NoteState, Schedule};

/// Row layout for one list item, resolved once per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteRow<'a> {
    Plain(&'a Note),
    Scheduled {
        note: &'a Note,
        schedule: &'a Schedule,
    },
}

/// Due-date badge of a scheduled row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStatus {
    /// Due date passed and the note is not done.
    Late,
    /// Signed distance to the due date; negative when in the past.
    Relative { delta_ms: i64 },
}

impl<'a> From<&'a NoteAndSchedule> for NoteRow<'a> {
    fn from(item: &'a NoteAndSchedule) -> Self {
        match &item.schedule {
            Some(schedule) => Self::Scheduled {
                note: &item.note,
                schedule,
            },
            None => Self::Plain(&item.note),
        }
    }
}

impl<'a> NoteRow<'a> {
    pub fn note(&self) -> &'a Note {
        match self {
            Self::Plain(note) => note,
            Self::Scheduled { note, .. } => note,
        }
    }

    /// Returns `None` for plain rows.
    pub fn schedule_status(&self, now_ms: i64) -> Option<ScheduleStatus> {
        let Self::Scheduled { note, schedule } = self else {
            return None;
        };
        if schedule.date < now_ms && note.state != NoteState::Done {
            return Some(ScheduleStatus::Late);
        }
        Some(ScheduleStatus::Relative {
            delta_ms: schedule.date - now_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteRow, ScheduleStatus};
    use crate::model::note::{Note, NoteAndSchedule, NoteState, NoteType, Schedule};

    fn item(state: NoteState, due: Option<i64>) -> NoteAndSchedule {
        NoteAndSchedule {
            note: Note {
                id: 1,
                title: "t".into(),
                text: "b".into(),
                kind: NoteType::Work,
                state,
                creation_date: 0,
            },
            schedule: due.map(|date| Schedule {
                id: 1,
                owner_id: 1,
                date,
            }),
        }
    }

    #[test]
    fn unscheduled_item_is_plain_row() {
        let item = item(NoteState::InProgress, None);
        let row = NoteRow::from(&item);
        assert!(matches!(row, NoteRow::Plain(_)));
        assert_eq!(row.schedule_status(0), None);
    }

    #[test]
    fn overdue_in_progress_note_is_late() {
        let item = item(NoteState::InProgress, Some(100));
        let row = NoteRow::from(&item);
        assert_eq!(row.schedule_status(500), Some(ScheduleStatus::Late));
    }

    #[test]
    fn overdue_done_note_reports_relative_time() {
        let item = item(NoteState::Done, Some(100));
        let row = NoteRow::from(&item);
        assert_eq!(
            row.schedule_status(500),
            Some(ScheduleStatus::Relative { delta_ms: -400 })
        );
    }

    #[test]
    fn upcoming_note_reports_remaining_time() {
        let item = item(NoteState::InProgress, Some(900));
        let row = NoteRow::from(&item);
        assert_eq!(row.note().id, 1);
        assert_eq!(
            row.schedule_status(500),
            Some(ScheduleStatus::Relative { delta_ms: 400 })
        );
    }
}

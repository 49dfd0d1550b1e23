//! Note/schedule repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Insert notes and their optional schedule as one unit.
//! - Read the note list joined with schedules.
//! - Clear both tables.
//!
//! # Invariants
//! - `insert_generated` commits the note and its schedule in one transaction.
//! - `delete_all` clears notes then schedules in one transaction.
//! - `seed` writes every seed note and the seeded marker in one transaction.
//! - Read paths reject unknown enum text instead of masking it.

use crate::db::DbError;
use crate::model::generate::GeneratedNote;
use crate::model::note::{Note, NoteAndSchedule, NoteDraft, NoteId, NoteState, NoteType, Schedule};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_WITH_SCHEDULE_SQL: &str = "SELECT
    n.id AS note_id,
    n.title,
    n.text,
    n.type,
    n.state,
    n.creation_date,
    s.id AS schedule_id,
    s.owner_id,
    s.date
FROM notes n
LEFT JOIN schedules s ON s.id = (
    SELECT MIN(id) FROM schedules WHERE owner_id = n.id
)
ORDER BY n.id ASC";

const SEEDED_KEY: &str = "seeded";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Row counts removed by [`NoteRepository::delete_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteAllSummary {
    pub notes: usize,
    pub schedules: usize,
}

/// Repository interface for note/schedule storage.
pub trait NoteRepository {
    /// Inserts one note and returns the storage-assigned id.
    fn insert_note(&self, draft: &NoteDraft) -> RepoResult<NoteId>;
    /// Inserts one schedule owned by `owner_id` and returns its id.
    fn insert_schedule(&self, owner_id: NoteId, date: i64) -> RepoResult<i64>;
    /// Inserts a generated note and its optional schedule atomically.
    fn insert_generated(&mut self, generated: &GeneratedNote) -> RepoResult<NoteAndSchedule>;
    /// All notes ordered by id, each with its schedule if one exists.
    fn find_all(&self) -> RepoResult<Vec<NoteAndSchedule>>;
    fn count_notes(&self) -> RepoResult<i64>;
    fn count_schedules(&self) -> RepoResult<i64>;
    fn delete_notes(&self) -> RepoResult<usize>;
    /// Schedules are not cascaded; callers clear notes first.
    fn delete_schedules(&self) -> RepoResult<usize>;
    /// Clears notes then schedules in one transaction.
    fn delete_all(&mut self) -> RepoResult<DeleteAllSummary>;
    /// Whether initial sample notes were ever committed.
    fn is_seeded(&self) -> RepoResult<bool>;
    /// Inserts `notes` and marks the database seeded, all or nothing.
    fn seed(&mut self, notes: &[GeneratedNote]) -> RepoResult<usize>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        for table in ["notes", "schedules", "store_meta"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, draft: &NoteDraft) -> RepoResult<NoteId> {
        insert_note(self.conn, draft)
    }

    fn insert_schedule(&self, owner_id: NoteId, date: i64) -> RepoResult<i64> {
        insert_schedule(self.conn, owner_id, date)
    }

    fn insert_generated(&mut self, generated: &GeneratedNote) -> RepoResult<NoteAndSchedule> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let note_id = insert_note(&tx, &generated.draft)?;
        let schedule = match generated.schedule_date {
            Some(date) => Some(Schedule {
                id: insert_schedule(&tx, note_id, date)?,
                owner_id: note_id,
                date,
            }),
            None => None,
        };
        tx.commit()?;

        Ok(NoteAndSchedule {
            note: generated.draft.clone().into_note(note_id),
            schedule,
        })
    }

    fn find_all(&self) -> RepoResult<Vec<NoteAndSchedule>> {
        let mut stmt = self.conn.prepare(NOTE_WITH_SCHEDULE_SQL)?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_with_schedule(row)?);
        }
        Ok(notes)
    }

    fn count_notes(&self) -> RepoResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?)
    }

    fn count_schedules(&self) -> RepoResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM schedules;", [], |row| row.get(0))?)
    }

    fn delete_notes(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM notes;", [])?)
    }

    fn delete_schedules(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM schedules;", [])?)
    }

    fn delete_all(&mut self) -> RepoResult<DeleteAllSummary> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let notes = tx.execute("DELETE FROM notes;", [])?;
        let schedules = tx.execute("DELETE FROM schedules;", [])?;
        tx.commit()?;
        Ok(DeleteAllSummary { notes, schedules })
    }

    fn is_seeded(&self) -> RepoResult<bool> {
        let seeded: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM store_meta WHERE key = ?1);",
            [SEEDED_KEY],
            |row| row.get(0),
        )?;
        Ok(seeded == 1)
    }

    fn seed(&mut self, notes: &[GeneratedNote]) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for generated in notes {
            let note_id = insert_note(&tx, &generated.draft)?;
            if let Some(date) = generated.schedule_date {
                insert_schedule(&tx, note_id, date)?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO store_meta (key, value) VALUES (?1, '1');",
            [SEEDED_KEY],
        )?;
        tx.commit()?;
        Ok(notes.len())
    }
}

fn insert_note(conn: &Connection, draft: &NoteDraft) -> RepoResult<NoteId> {
    conn.execute(
        "INSERT INTO notes (title, text, type, state, creation_date)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            draft.title.as_str(),
            draft.text.as_str(),
            note_type_to_db(draft.kind),
            note_state_to_db(draft.state),
            draft.creation_date,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_schedule(conn: &Connection, owner_id: NoteId, date: i64) -> RepoResult<i64> {
    conn.execute(
        "INSERT INTO schedules (owner_id, date) VALUES (?1, ?2);",
        params![owner_id, date],
    )?;
    Ok(conn.last_insert_rowid())
}

fn parse_note_with_schedule(row: &Row<'_>) -> RepoResult<NoteAndSchedule> {
    let type_text: String = row.get("type")?;
    let kind = parse_note_type(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid note type `{type_text}` in notes.type"))
    })?;

    let state_text: String = row.get("state")?;
    let state = parse_note_state(&state_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid note state `{state_text}` in notes.state"))
    })?;

    let note = Note {
        id: row.get("note_id")?,
        title: row.get("title")?,
        text: row.get("text")?,
        kind,
        state,
        creation_date: row.get("creation_date")?,
    };

    let schedule = match row.get::<_, Option<i64>>("schedule_id")? {
        Some(id) => Some(Schedule {
            id,
            owner_id: row.get("owner_id")?,
            date: row.get("date")?,
        }),
        None => None,
    };

    Ok(NoteAndSchedule { note, schedule })
}

fn note_type_to_db(kind: NoteType) -> &'static str {
    match kind {
        NoteType::None => "NONE",
        NoteType::Todo => "TODO",
        NoteType::Shopping => "SHOPPING",
        NoteType::Work => "WORK",
        NoteType::Family => "FAMILY",
    }
}

fn parse_note_type(value: &str) -> Option<NoteType> {
    match value {
        "NONE" => Some(NoteType::None),
        "TODO" => Some(NoteType::Todo),
        "SHOPPING" => Some(NoteType::Shopping),
        "WORK" => Some(NoteType::Work),
        "FAMILY" => Some(NoteType::Family),
        _ => None,
    }
}

fn note_state_to_db(state: NoteState) -> &'static str {
    match state {
        NoteState::InProgress => "IN_PROGRESS",
        NoteState::Done => "DONE",
    }
}

fn parse_note_state(value: &str) -> Option<NoteState> {
    match value {
        "IN_PROGRESS" => Some(NoteState::InProgress),
        "DONE" => Some(NoteState::Done),
        _ => None,
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

use notekeep_core::db::open_db_in_memory;
use notekeep_core::model::generate::GeneratedNote;
use notekeep_core::{NoteDraft, NoteRepository, NoteState, NoteType, RepoError, SqliteNoteRepository};
use rusqlite::Connection;

fn draft(title: &str, creation_date: i64) -> NoteDraft {
    NoteDraft {
        title: title.to_string(),
        text: "body".to_string(),
        kind: NoteType::Shopping,
        state: NoteState::Done,
        creation_date,
    }
}

fn generated(title: &str, schedule_date: Option<i64>) -> GeneratedNote {
    GeneratedNote {
        draft: draft(title, 1_000),
        schedule_date,
    }
}

#[test]
fn insert_generated_pairs_schedule_with_new_note() {
    let mut conn = open_db_in_memory().unwrap().conn;
    let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    let plain = repo.insert_generated(&generated("plain", None)).unwrap();
    let scheduled = repo.insert_generated(&generated("dated", Some(5_000))).unwrap();

    assert!(plain.schedule.is_none());
    let schedule = scheduled.schedule.clone().unwrap();
    assert_eq!(schedule.owner_id, scheduled.note.id);
    assert_eq!(schedule.date, 5_000);

    let all = repo.find_all().unwrap();
    assert_eq!(all, vec![plain, scheduled]);
    assert_eq!(repo.count_notes().unwrap(), 2);
    assert_eq!(repo.count_schedules().unwrap(), 1);
}

#[test]
fn find_all_round_trips_note_fields() {
    let mut conn = open_db_in_memory().unwrap().conn;
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    let id = repo.insert_note(&draft("groceries", 42)).unwrap();
    let loaded = repo.find_all().unwrap().remove(0);

    assert_eq!(loaded.note.id, id);
    assert_eq!(loaded.note.title, "groceries");
    assert_eq!(loaded.note.kind, NoteType::Shopping);
    assert_eq!(loaded.note.state, NoteState::Done);
    assert_eq!(loaded.note.creation_date, 42);
}

#[test]
fn delete_all_clears_both_tables_and_ids_are_not_reused() {
    let mut conn = open_db_in_memory().unwrap().conn;
    let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    let first = repo.insert_generated(&generated("a", Some(1))).unwrap();
    repo.insert_generated(&generated("b", None)).unwrap();

    let summary = repo.delete_all().unwrap();
    assert_eq!(summary.notes, 2);
    assert_eq!(summary.schedules, 1);
    assert_eq!(repo.count_notes().unwrap(), 0);
    assert_eq!(repo.count_schedules().unwrap(), 0);

    let next = repo.insert_generated(&generated("c", None)).unwrap();
    assert!(next.note.id > first.note.id + 1);
}

#[test]
fn deleting_notes_only_leaves_orphan_schedules() {
    let mut conn = open_db_in_memory().unwrap().conn;
    let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    repo.insert_generated(&generated("a", Some(1))).unwrap();
    assert_eq!(repo.delete_notes().unwrap(), 1);
    assert_eq!(repo.count_schedules().unwrap(), 1);
    assert!(repo.find_all().unwrap().is_empty());

    assert_eq!(repo.delete_schedules().unwrap(), 1);
}

#[test]
fn dangling_schedule_is_not_attached_to_other_notes() {
    let mut conn = open_db_in_memory().unwrap().conn;
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    repo.insert_schedule(999, 7).unwrap();
    repo.insert_note(&draft("lonely", 1)).unwrap();

    let all = repo.find_all().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].schedule.is_none());
}

#[test]
fn unknown_enum_text_is_reported_as_invalid_data() {
    let mut conn = open_db_in_memory().unwrap().conn;
    conn.execute(
        "INSERT INTO notes (title, text, type, state, creation_date)
         VALUES ('x', 'y', 'HOBBY', 'DONE', 0);",
        [],
    )
    .unwrap();

    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let err = repo.find_all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("HOBBY")));
}

#[test]
fn unmigrated_connection_is_rejected() {
    let mut conn = Connection::open_in_memory().unwrap();
    let err = SqliteNoteRepository::try_new(&mut conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("notes")));
}

#[test]
fn seed_is_all_or_nothing() {
    let mut conn = open_db_in_memory().unwrap().conn;
    conn.execute_batch(
        "CREATE TRIGGER reject_schedules BEFORE INSERT ON schedules
         BEGIN SELECT RAISE(ABORT, 'schedules rejected'); END;",
    )
    .unwrap();
    let notes = vec![generated("a", None), generated("b", Some(9)), generated("c", None)];

    let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    assert!(!repo.is_seeded().unwrap());
    assert!(matches!(repo.seed(&notes), Err(RepoError::Db(_))));
    assert_eq!(repo.count_notes().unwrap(), 0);
    assert!(!repo.is_seeded().unwrap());
    drop(repo);

    conn.execute_batch("DROP TRIGGER reject_schedules;").unwrap();
    let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    assert_eq!(repo.seed(&notes).unwrap(), 3);
    assert!(repo.is_seeded().unwrap());
    assert_eq!(repo.count_notes().unwrap(), 3);
    assert_eq!(repo.count_schedules().unwrap(), 1);
}

//! Note store: observable note collections over a single write queue.
//!
//! # Responsibility
//! - Own the SQLite connection on a dedicated worker thread.
//! - Run mutations one at a time in submission order.
//! - Publish the joined note list and counts after every mutation.
//!
//! # Invariants
//! - Mutations are fire-and-forget; failures are logged and the queue
//!   proceeds with the next command.
//! - A generated note and its schedule become visible in the same list
//!   emission.
//! - Seed notes are written before the store is returned, in one transaction
//!   together with a marker, so a database is seeded exactly once.

use crate::db::{open_db, open_db_in_memory, DbError, OpenedDb};
use crate::model::generate::random_note;
use crate::model::note::NoteAndSchedule;
use crate::observable::{Dispatcher, Observable};
use crate::repo::note_repo::{NoteRepository, RepoError, SqliteNoteRepository};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Source of creation timestamps in epoch milliseconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Construction options for [`NoteStore`].
#[derive(Clone)]
pub struct StoreOptions {
    /// Notes generated when the database is created.
    pub seed_note_count: usize,
    /// Fixed seed for reproducible sample notes.
    pub rng_seed: Option<u64>,
    pub clock: Clock,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            seed_note_count: crate::config::DEFAULT_SEED_NOTE_COUNT,
            rng_seed: None,
            clock: Arc::new(|| chrono::Utc::now().timestamp_millis()),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Repo(RepoError),
    Spawn(std::io::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Spawn(err) => write!(f, "failed to start note store worker: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Spawn(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

enum Command {
    GenerateNote,
    DeleteAll,
    Barrier(Sender<()>),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::GenerateNote => "generate_note",
            Self::DeleteAll => "delete_all",
            Self::Barrier(_) => "barrier",
        }
    }
}

#[derive(Clone)]
struct Outputs {
    notes: Observable<Vec<NoteAndSchedule>>,
    note_count: Observable<i64>,
    schedule_count: Observable<i64>,
}

struct Worker {
    conn: Connection,
    rng: StdRng,
    clock: Clock,
    outputs: Outputs,
}

/// Owner of the note and schedule collections.
pub struct NoteStore {
    commands: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
    outputs: Outputs,
}

impl NoteStore {
    /// Opens (or creates) the database at `path` and starts the worker.
    pub fn open(
        path: impl AsRef<Path>,
        options: StoreOptions,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<Self, StoreError> {
        Self::start(open_db(path)?, options, dispatcher)
    }

    pub fn open_in_memory(
        options: StoreOptions,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<Self, StoreError> {
        Self::start(open_db_in_memory()?, options, dispatcher)
    }

    /// Starts the worker over an already opened database.
    pub fn start(
        opened: OpenedDb,
        options: StoreOptions,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<Self, StoreError> {
        let OpenedDb { mut conn, .. } = opened;
        let mut rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        {
            let mut repo = SqliteNoteRepository::try_new(&mut conn)?;
            if !repo.is_seeded()? {
                let notes: Vec<_> = (0..options.seed_note_count)
                    .map(|_| random_note(&mut rng, (options.clock)()))
                    .collect();
                let seeded = repo.seed(&notes)?;
                info!("event=store_seed module=store status=ok notes={seeded}");
            }
        }

        let outputs = Outputs {
            notes: Observable::new(Arc::clone(&dispatcher)),
            note_count: Observable::new(Arc::clone(&dispatcher)),
            schedule_count: Observable::new(dispatcher),
        };
        let (sender, receiver) = mpsc::channel();
        let worker = Worker {
            conn,
            rng,
            clock: options.clock,
            outputs: outputs.clone(),
        };
        let handle = thread::Builder::new()
            .name("notekeep-store".to_string())
            .spawn(move || worker.run(receiver))
            .map_err(StoreError::Spawn)?;

        Ok(Self {
            commands: Some(sender),
            worker: Some(handle),
            outputs,
        })
    }

    /// All notes joined with their schedule, in storage order.
    pub fn observe_all(&self) -> Observable<Vec<NoteAndSchedule>> {
        self.outputs.notes.clone()
    }

    /// Number of notes.
    pub fn observe_count(&self) -> Observable<i64> {
        self.outputs.note_count.clone()
    }

    pub fn observe_schedule_count(&self) -> Observable<i64> {
        self.outputs.schedule_count.clone()
    }

    /// Queues creation of one random note, with a schedule 70% of the time.
    pub fn generate_note(&self) {
        self.submit(Command::GenerateNote);
    }

    /// Queues removal of every note and schedule.
    pub fn delete_all_notes(&self) {
        self.submit(Command::DeleteAll);
    }

    /// Blocks until every command submitted before this call has run and its
    /// results have been published.
    pub fn wait_idle(&self) {
        let (ack, done) = mpsc::channel();
        if self.submit(Command::Barrier(ack)) {
            // A closed channel means the worker is gone; nothing to wait for.
            let _ = done.recv();
        }
    }

    fn submit(&self, command: Command) -> bool {
        let name = command.name();
        let sent = self
            .commands
            .as_ref()
            .is_some_and(|sender| sender.send(command).is_ok());
        if !sent {
            warn!("event=store_submit module=store status=error command={name} error_code=worker_stopped");
        }
        sent
    }
}

impl Drop for NoteStore {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain queued commands and exit.
        self.commands.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("event=store_shutdown module=store status=error error_code=worker_panicked");
            }
        }
    }
}

impl Worker {
    fn run(mut self, commands: Receiver<Command>) {
        debug!("event=store_worker module=store status=start");
        self.publish();

        for command in commands {
            if let Command::Barrier(ack) = command {
                let _ = ack.send(());
                continue;
            }

            let name = command.name();
            let started_at = Instant::now();
            match self.execute(command) {
                Ok(()) => debug!(
                    "event=store_command module=store status=ok command={} duration_ms={}",
                    name,
                    started_at.elapsed().as_millis()
                ),
                Err(err) => error!(
                    "event=store_command module=store status=error command={} duration_ms={} error={}",
                    name,
                    started_at.elapsed().as_millis(),
                    err
                ),
            }
            self.publish();
        }

        debug!("event=store_worker module=store status=stopped");
    }

    fn execute(&mut self, command: Command) -> Result<(), RepoError> {
        let now = (self.clock)();
        let mut repo = SqliteNoteRepository::try_new(&mut self.conn)?;
        match command {
            Command::GenerateNote => {
                let created = repo.insert_generated(&random_note(&mut self.rng, now))?;
                debug!(
                    "event=note_generate module=store status=ok note_id={} scheduled={}",
                    created.note.id,
                    created.schedule.is_some()
                );
            }
            Command::DeleteAll => {
                let summary = repo.delete_all()?;
                info!(
                    "event=note_delete_all module=store status=ok notes={} schedules={}",
                    summary.notes, summary.schedules
                );
            }
            Command::Barrier(_) => {}
        }
        Ok(())
    }

    fn publish(&mut self) {
        let snapshot = SqliteNoteRepository::try_new(&mut self.conn).and_then(|repo| {
            Ok((
                repo.find_all()?,
                repo.count_notes()?,
                repo.count_schedules()?,
            ))
        });

        match snapshot {
            Ok((notes, note_count, schedule_count)) => {
                self.outputs.notes.set_value(notes);
                self.outputs.note_count.set_value(note_count);
                self.outputs.schedule_count.set_value(schedule_count);
            }
            Err(err) => error!(
                "event=store_publish module=store status=error error={}",
                err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteStore, StoreOptions};
    use crate::observable::Immediate;
    use std::sync::Arc;

    fn options(seed_note_count: usize) -> StoreOptions {
        StoreOptions {
            seed_note_count,
            rng_seed: Some(3),
            ..StoreOptions::default()
        }
    }

    #[test]
    fn in_memory_store_is_seeded() {
        let store = NoteStore::open_in_memory(options(10), Arc::new(Immediate)).unwrap();
        store.wait_idle();
        assert_eq!(store.observe_count().value(), Some(10));
        assert_eq!(store.observe_all().value().map(|notes| notes.len()), Some(10));
    }

    #[test]
    fn generate_then_delete_all_leaves_store_empty() {
        let store = NoteStore::open_in_memory(options(0), Arc::new(Immediate)).unwrap();
        store.generate_note();
        store.delete_all_notes();
        store.wait_idle();
        assert_eq!(store.observe_count().value(), Some(0));
        assert_eq!(store.observe_schedule_count().value(), Some(0));
    }
}

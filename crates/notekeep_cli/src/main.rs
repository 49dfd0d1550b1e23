//! Terminal front-end for the notekeep core.
//!
//! # Responsibility
//! - Resolve configuration from flags and an optional JSON file.
//! - Render the sorted note list and count whenever they change.
//! - Forward stdin commands to the view-model.

mod command;
mod render;

use clap::Parser;
use command::{parse_command, Command, HELP};
use log::{info, warn};
use notekeep_core::{init_logging, AppConfig, AppContext, MainLoop, NoteAndSchedule};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Parser)]
#[command(name = "notekeep", version, about = "Reactive note list in the terminal")]
struct Args {
    /// Directory holding the database, preferences and logs.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// JSON config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("notekeep: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let config = resolve_config(args)?;
    if let Err(err) = init_logging(&config.log_level, &config.log_dir()) {
        eprintln!("notekeep: logging disabled: {err}");
    }

    let main_loop = MainLoop::new();
    let app = AppContext::open(&config, main_loop.dispatcher()).map_err(|err| err.to_string())?;
    let view_model = &app.view_model;

    let _count = view_model
        .observe_count()
        .subscribe(|count| println!("-- {count} notes"));
    let _sorted = view_model.observe_sorted().subscribe(|items: &Vec<NoteAndSchedule>| print_list(items));
    if let Err(err) = view_model.sort_order() {
        eprintln!("notekeep: {err}; use `sort <ORDER>` to reset it");
    }

    println!("{HELP}");
    let lines = spawn_stdin_reader();
    loop {
        main_loop.run_for(POLL_INTERVAL);
        match lines.try_recv() {
            Ok(line) => match parse_command(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => execute(&app, command),
                Ok(None) => {}
                Err(err) => eprintln!("{err}"),
            },
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }
    }

    app.store.wait_idle();
    main_loop.run_pending();
    info!("event=cli_exit module=cli status=ok");
    Ok(())
}

fn resolve_config(args: Args) -> Result<AppConfig, String> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path).map_err(|err| err.to_string())?,
        None => AppConfig::default(),
    };
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if config.data_dir.is_relative() {
        let cwd = std::env::current_dir().map_err(|err| format!("current directory: {err}"))?;
        config.data_dir = cwd.join(&config.data_dir);
    }
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn execute(app: &AppContext, command: Command) {
    let view_model = &app.view_model;
    match command {
        Command::Generate(count) => {
            for _ in 0..count {
                view_model.generate_note();
            }
        }
        Command::DeleteAll => view_model.delete_all_notes(),
        Command::Sort(order) => view_model.set_sort_order(order),
        Command::List => match view_model.observe_sorted().value() {
            Some(items) => print_list(&items),
            None => {
                eprintln!("sorted list not available yet");
                warn!("event=cli_list module=cli status=error error_code=no_sorted_list");
            }
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

fn print_list(items: &[NoteAndSchedule]) {
    let now = chrono::Utc::now().timestamp_millis();
    println!("{}", render::render_list(items, now));
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    // The reader blocks on stdin; it ends with the process.
    let spawned = thread::Builder::new()
        .name("notekeep-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if sender.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(err) = spawned {
        warn!("event=cli_stdin module=cli status=error error={err}");
    }
    receiver
}

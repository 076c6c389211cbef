//! Console entry point and persistent user settings.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use dirs_next as dirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

mod app;
use app::{AppError, LoadOutcome, Notifier, Renderer, Session};
mod export;
mod parser;
mod program;
use program::Program;
mod stats;
mod store;
use store::Store;
mod validate;
mod workbook;
use workbook::SheetPreview;

/// Persistent configuration for user preferences.
///
/// Serialized to a JSON file in the platform config directory so the
/// database location and the last imported file survive across runs. All
/// fields use `#[serde(default)]` so older files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
struct Settings {
    /// Database file override; the platform data directory is used when
    /// unset.
    db_path: Option<PathBuf>,
    last_file: Option<String>,
}

impl Settings {
    const FILE: &'static str = "liftplan_settings.json";

    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                if let Ok(cfg) = serde_json::from_str(&data) {
                    return cfg;
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(data) = serde_json::to_string_pretty(self) {
                let _ = std::fs::write(path, data);
            }
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "liftplan",
    about = "Import a workout program and log your lifts against it"
)]
struct Cli {
    /// Database file override.
    #[arg(long)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a workout program from a CSV or spreadsheet file.
    Import {
        file: PathBuf,
        /// Sheet to parse when the workbook has more than one.
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Show the most recently imported program (the default).
    Show,
    /// List every saved workout.
    List,
    /// Log weight and reps for an exercise of the current program.
    Log {
        exercise: String,
        weight: f64,
        reps: i64,
        #[arg(long, default_value = "")]
        notes: String,
        /// Backdate the entry (YYYY-MM-DD); defaults to now.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the logged history for an exercise of the current program.
    History { exercise: String },
    /// Delete a saved workout and everything logged against it.
    Delete { workout_id: i64 },
    /// Write the current program in the import schema (.json, else CSV).
    Export { path: PathBuf },
}

struct ConsoleUi;

impl Notifier for ConsoleUi {
    fn show_error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }

    fn show_loading(&mut self, on: bool) {
        if on {
            println!("Loading...");
        }
    }

    fn show_toast(&mut self, message: &str) {
        println!("{message}");
    }
}

struct ConsoleRenderer;

impl Renderer for ConsoleRenderer {
    fn render_workout(&mut self, program: &Program) {
        println!("\n{}", program.title);
        if !program.phase.is_empty() {
            println!("{}", program.phase);
        }
        for day in &program.days {
            println!("\n{}", day.name);
            for exercise in &day.exercises {
                let view = exercise.formatted();
                let mut line = format!("  {}", view.name);
                for part in [&view.sets, &view.reps, &view.load, &view.rpe, &view.rest] {
                    if !part.is_empty() {
                        line.push_str("  ");
                        line.push_str(part);
                    }
                }
                println!("{line}");
            }
        }
    }
}

/// Renderer for commands that need the session restored but nothing shown.
struct NullRenderer;

impl Renderer for NullRenderer {
    fn render_workout(&mut self, _program: &Program) {}
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let mut settings = Settings::load();

    if let Err(e) = run(&cli, &mut settings) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, settings: &mut Settings) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = match cli.db.clone().or_else(|| settings.db_path.clone()) {
        Some(p) => p,
        None => store::default_db_path()?,
    };
    info!("using database at {}", db_path.display());
    let mut session = Session::new(Store::open(&db_path)?);
    let mut ui = ConsoleUi;

    match cli.command.as_ref().unwrap_or(&Command::Show) {
        Command::Import { file, sheet } => {
            let mut renderer = ConsoleRenderer;
            let mut outcome =
                match session.process_file(file, sheet.as_deref(), &mut ui, &mut renderer) {
                    Ok(o) => o,
                    // Already reported through the notifier.
                    Err(_) => std::process::exit(1),
                };
            if let LoadOutcome::NeedsSelection(previews) = &outcome {
                let Some(choice) = prompt_for_sheet(previews) else {
                    println!("Cancelled; nothing was imported.");
                    return Ok(());
                };
                outcome = match session.process_file(file, Some(&choice), &mut ui, &mut renderer)
                {
                    Ok(o) => o,
                    Err(_) => std::process::exit(1),
                };
            }
            if let LoadOutcome::Loaded { workout_id } = outcome {
                info!("workout {workout_id} is now current");
                settings.last_file = Some(file.display().to_string());
                settings.save();
            }
        }
        Command::Show => {
            if !session.resume_last(&mut ConsoleRenderer)? {
                println!("No workout saved yet. Import a program file to get started.");
            }
        }
        Command::List => {
            let workouts = session.saved_workouts()?;
            if workouts.is_empty() {
                println!("No workouts saved yet.");
            }
            for workout in workouts {
                let phase = if workout.phase.is_empty() {
                    String::new()
                } else {
                    format!("  ({})", workout.phase)
                };
                println!(
                    "{:>4}  {}  {}{}",
                    workout.id,
                    workout.date.format("%Y-%m-%d"),
                    workout.name,
                    phase
                );
            }
        }
        Command::Log {
            exercise,
            weight,
            reps,
            notes,
            date,
        } => {
            resume_quietly(&mut session)?;
            match date {
                Some(day) => {
                    let record = session.find_exercise(exercise)?;
                    let stamp = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
                    session.record_progress_for(record.id, *weight, *reps, notes, Some(stamp))?;
                }
                None => {
                    session.record_progress(exercise, *weight, *reps, notes)?;
                }
            }
            println!("Progress saved for {exercise}");
        }
        Command::History { exercise } => {
            resume_quietly(&mut session)?;
            let record = session.find_exercise(exercise)?;
            let history = session.progress_history(record.id)?;
            if history.is_empty() {
                println!("No progress logged for {exercise} yet.");
                return Ok(());
            }
            for entry in &history {
                println!(
                    "{}  {} x {}  {}",
                    entry.date.format("%Y-%m-%d %H:%M"),
                    entry.weight,
                    entry.reps,
                    entry.notes
                );
            }
            let summary = stats::progress_stats(&history);
            if let (Some(best), Some(est)) = (summary.best_weight, summary.best_est_1rm) {
                println!(
                    "Best: {best} (est. 1RM {est:.1}) across {} entries",
                    summary.entries
                );
            }
        }
        Command::Delete { workout_id } => {
            session.delete_program(*workout_id)?;
            println!("Deleted workout {workout_id}");
        }
        Command::Export { path } => {
            resume_quietly(&mut session)?;
            let current = session.current().ok_or(AppError::NoWorkoutLoaded)?;
            let is_json = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"));
            if is_json {
                export::save_program_json(path, &current.program)?;
            } else {
                export::save_program_csv(path, &current.program)?;
            }
            println!("Exported to {}", path.display());
        }
    }
    Ok(())
}

fn resume_quietly(session: &mut Session) -> Result<(), AppError> {
    if !session.resume_last(&mut NullRenderer)? {
        return Err(AppError::NoWorkoutLoaded);
    }
    Ok(())
}

fn prompt_for_sheet(previews: &[SheetPreview]) -> Option<String> {
    println!("The file contains several sheets:");
    for preview in previews {
        println!("\n  {}", preview.name);
        for row in &preview.rows {
            if row.iter().all(|c| c.is_empty()) {
                continue;
            }
            println!("    {}", row.join(" | "));
        }
    }
    print!("\nSheet to import (empty to cancel): ");
    let _ = std::io::stdout().flush();
    let mut input = String::new();
    if std::io::stdin().read_line(&mut input).is_err() {
        return None;
    }
    let choice = input.trim();
    if choice.is_empty() {
        None
    } else {
        Some(choice.to_string())
    }
}

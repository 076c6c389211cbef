//! Application orchestration: the session context object and the ports the
//! surrounding UI plugs into.
//!
//! The session owns the store handle and the bookkeeping for whichever
//! workout is currently displayed. Core parsing and storage functions take
//! explicit documents and ids; nothing below this layer knows about a
//! "current" anything.

use std::path::Path;

use chrono::{DateTime, Utc};
use log::{info, warn};
use thiserror::Error;

use crate::parser::{self, ParseError};
use crate::program::Program;
use crate::stats::{self, ProgressStats};
use crate::store::{ExerciseRecord, ProgressRecord, Store, StoreError, WorkoutRecord};
use crate::validate::{ValidationError, validate};
use crate::workbook::{SheetPreview, Workbook, WorkbookError};

/// Notification surface. The core reports through it and knows nothing
/// about how messages are presented.
pub trait Notifier {
    fn show_error(&mut self, message: &str);
    fn show_loading(&mut self, on: bool);
    fn show_toast(&mut self, message: &str);
}

/// Rendering surface invoked with every successfully loaded program.
pub trait Renderer {
    fn render_workout(&mut self, program: &Program);
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to process workout file: {0}")]
    Workbook(#[from] WorkbookError),
    #[error("failed to process workout file: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no workout loaded")]
    NoWorkoutLoaded,
    #[error("exercise \"{0}\" not found in the current workout")]
    ExerciseNotFound(String),
}

/// Result of processing an uploaded source.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The source holds several sheets and none was chosen: previews are
    /// offered, nothing was parsed and nothing was written. Abandoning the
    /// selection leaves the store untouched.
    NeedsSelection(Vec<SheetPreview>),
    /// Parsed, validated, saved, and rendered.
    Loaded { workout_id: i64 },
}

/// The workout currently on display.
#[derive(Debug, Clone)]
pub struct CurrentWorkout {
    pub workout_id: i64,
    pub program: Program,
}

pub struct Session {
    store: Store,
    current: Option<CurrentWorkout>,
}

impl Session {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&CurrentWorkout> {
        self.current.as_ref()
    }

    /// Load and display the most recently saved workout, if there is one.
    pub fn resume_last(&mut self, out: &mut dyn Renderer) -> Result<bool, AppError> {
        match self.store.most_recent_workout()? {
            Some(record) => {
                out.render_workout(&record.data);
                self.current = Some(CurrentWorkout {
                    workout_id: record.id,
                    program: record.data,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The most recently saved program without touching the session state.
    pub fn most_recent_program(&self) -> Result<Option<Program>, AppError> {
        Ok(self.store.most_recent_workout()?.map(|r| r.data))
    }

    /// Every saved workout record, oldest first.
    pub fn saved_workouts(&self) -> Result<Vec<WorkoutRecord>, AppError> {
        Ok(self.store.all_workouts()?)
    }

    /// Process an uploaded file end to end: read, pick a sheet (or ask the
    /// caller to), parse, validate, persist, render. Failures are surfaced
    /// through the notifier and returned; nothing is written on failure.
    pub fn process_file(
        &mut self,
        path: &Path,
        sheet: Option<&str>,
        ui: &mut dyn Notifier,
        out: &mut dyn Renderer,
    ) -> Result<LoadOutcome, AppError> {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        ui.show_loading(true);
        let result = match Workbook::open(path) {
            Ok(wb) => self.load_workbook(&wb, sheet, &source, ui, out),
            Err(e) => Err(AppError::from(e)),
        };
        ui.show_loading(false);
        if let Err(e) = &result {
            warn!("processing {source} failed: {e}");
            ui.show_error(&e.to_string());
        }
        result
    }

    /// Sheet resolution and the parse/validate/save/render pipeline for an
    /// already-read workbook.
    pub fn load_workbook(
        &mut self,
        workbook: &Workbook,
        sheet: Option<&str>,
        source: &str,
        ui: &mut dyn Notifier,
        out: &mut dyn Renderer,
    ) -> Result<LoadOutcome, AppError> {
        if workbook.sheets().is_empty() {
            return Err(ParseError::EmptySource.into());
        }
        let grid = match (sheet, workbook.single()) {
            (Some(name), _) => workbook.grid(name)?,
            (None, Some(single)) => &single.grid,
            (None, None) => {
                info!(
                    "{source} has {} sheets, awaiting selection",
                    workbook.sheets().len()
                );
                return Ok(LoadOutcome::NeedsSelection(workbook.previews()));
            }
        };

        let program = parser::parse_program(grid)?;
        validate(&program)?;
        let saved = self.store.save_program(&program)?;
        out.render_workout(&program);
        ui.show_toast(&stats::format_load_message(
            program.days.len(),
            program.exercise_count(),
            source,
        ));
        self.current = Some(CurrentWorkout {
            workout_id: saved.workout_id,
            program,
        });
        Ok(LoadOutcome::Loaded {
            workout_id: saved.workout_id,
        })
    }

    /// Exercise record of the current workout with the given name.
    pub fn find_exercise(&self, name: &str) -> Result<ExerciseRecord, AppError> {
        let current = self.current.as_ref().ok_or(AppError::NoWorkoutLoaded)?;
        let exercises = self.store.exercises_by_workout(current.workout_id)?;
        exercises
            .into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| AppError::ExerciseNotFound(name.to_string()))
    }

    /// Record a performance entry against an exercise of the current
    /// workout, identified by its name.
    pub fn record_progress(
        &self,
        exercise_name: &str,
        weight: f64,
        reps: i64,
        notes: &str,
    ) -> Result<i64, AppError> {
        let exercise = self.find_exercise(exercise_name)?;
        let id = self
            .store
            .save_progress(exercise.id, weight, reps, notes, None)?;
        info!("progress saved for {exercise_name}");
        Ok(id)
    }

    /// Record a performance entry directly against an exercise record id.
    pub fn record_progress_for(
        &self,
        exercise_id: i64,
        weight: f64,
        reps: i64,
        notes: &str,
        date: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        Ok(self
            .store
            .save_progress(exercise_id, weight, reps, notes, date)?)
    }

    pub fn progress_history(&self, exercise_id: i64) -> Result<Vec<ProgressRecord>, AppError> {
        Ok(self.store.progress_history(exercise_id)?)
    }

    pub fn progress_summary(&self, exercise_id: i64) -> Result<ProgressStats, AppError> {
        Ok(stats::progress_stats(
            &self.store.progress_history(exercise_id)?,
        ))
    }

    /// Delete a saved workout and everything recorded against it. Clears
    /// the current selection when it pointed at the deleted workout.
    pub fn delete_program(&mut self, workout_id: i64) -> Result<(), AppError> {
        self.store.delete_workout(workout_id)?;
        if self
            .current
            .as_ref()
            .is_some_and(|c| c.workout_id == workout_id)
        {
            self.current = None;
        }
        Ok(())
    }
}

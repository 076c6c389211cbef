//! Local workout store on SQLite.
//!
//! Three collections: `workouts` (one row per uploaded program), `exercises`
//! (one row per exercise across the program's days, keyed back to its
//! workout), and `progress` (append-only performance log keyed to an
//! exercise). Writes are insert-only; deleting a workout cascades over its
//! exercises and their progress rows inside one transaction, so no reader
//! observes a half-deleted program.
//!
//! Timestamps are RFC 3339 text assigned at write time. The `data` columns
//! hold the document JSON in the import schema. `PRAGMA user_version` tracks
//! the schema revision.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dirs_next as dirs;
use log::info;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

use crate::program::{Exercise, Program};

/// Current schema revision, mirrored into `PRAGMA user_version`.
const SCHEMA_VERSION: i64 = 1;

const DB_FILE_NAME: &str = "liftplan.sqlite";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS workouts (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL,
    phase TEXT NOT NULL DEFAULT '',
    data  TEXT NOT NULL,            -- program document, import-schema JSON
    date  TEXT NOT NULL             -- RFC 3339, assigned at write time
);
CREATE INDEX IF NOT EXISTS idx_workouts_name ON workouts(name);
CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts(date);

CREATE TABLE IF NOT EXISTS exercises (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    workout_id INTEGER NOT NULL REFERENCES workouts(id),
    name       TEXT NOT NULL,
    day        TEXT NOT NULL,
    data       TEXT NOT NULL        -- exercise document, import-schema JSON
);
CREATE INDEX IF NOT EXISTS idx_exercises_workout_id ON exercises(workout_id);
CREATE INDEX IF NOT EXISTS idx_exercises_name ON exercises(name);
CREATE INDEX IF NOT EXISTS idx_exercises_day ON exercises(day);

CREATE TABLE IF NOT EXISTS progress (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    exercise_id INTEGER NOT NULL REFERENCES exercises(id),
    weight      REAL NOT NULL,
    reps        INTEGER NOT NULL,
    notes       TEXT NOT NULL DEFAULT '',
    date        TEXT NOT NULL       -- RFC 3339, assigned at write time
);
CREATE INDEX IF NOT EXISTS idx_progress_exercise_id ON progress(exercise_id);
CREATE INDEX IF NOT EXISTS idx_progress_date ON progress(date);
"#;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Open(rusqlite::Error),
    #[error("failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file: {0}")]
    Io(#[from] std::io::Error),
    #[error("database schema version {0} is newer than this build supports")]
    UnsupportedVersion(i64),
    #[error("database transaction failed: {0}")]
    Transaction(rusqlite::Error),
    #[error("record violates a referential constraint: {0}")]
    Constraint(rusqlite::Error),
    #[error("database query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("failed to encode document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("workout not found: id {0}")]
    WorkoutNotFound(i64),
}

/// Persisted form of a saved program.
#[derive(Debug, Clone)]
pub struct WorkoutRecord {
    pub id: i64,
    pub name: String,
    pub phase: String,
    pub data: Program,
    pub date: DateTime<Utc>,
}

/// Persisted form of one exercise of a saved program.
#[derive(Debug, Clone)]
pub struct ExerciseRecord {
    pub id: i64,
    pub workout_id: i64,
    pub name: String,
    pub day: String,
    pub data: Exercise,
}

/// One logged performance entry. Never mutated after insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub id: i64,
    pub exercise_id: i64,
    pub weight: f64,
    pub reps: i64,
    pub notes: String,
    pub date: DateTime<Utc>,
}

/// Ids assigned by [`Store::save_program`].
#[derive(Debug, Clone)]
pub struct SavedProgram {
    pub workout_id: i64,
    /// One id per exercise, in document order.
    pub exercise_ids: Vec<i64>,
}

#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

/// Database file inside the platform data directory.
pub fn default_db_path() -> Result<PathBuf, StoreError> {
    let dir = dirs::data_dir().ok_or(StoreError::DataDir)?.join("liftplan");
    Ok(dir.join(DB_FILE_NAME))
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(StoreError::Open)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Open)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(StoreError::Open)?;
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .map_err(StoreError::Open)?;
        if version > SCHEMA_VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }
        conn.execute_batch(SCHEMA_SQL).map_err(StoreError::Open)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(StoreError::Open)?;
        info!("opened workout store (schema v{SCHEMA_VERSION})");
        Ok(Self { conn })
    }

    /// Insert a workout record for `program`, stamped now. Never overwrites.
    pub fn create_workout(&self, program: &Program) -> Result<i64, StoreError> {
        insert_workout(&self.conn, program, Utc::now())
    }

    /// Insert one exercise record per `(day name, exercise)` pair, all
    /// carrying `workout_id`, in one transaction. Returns the new ids in
    /// input order; on any failure nothing is committed.
    pub fn create_exercises(
        &mut self,
        workout_id: i64,
        exercises: &[(&str, &Exercise)],
    ) -> Result<Vec<i64>, StoreError> {
        let tx = self.conn.transaction().map_err(StoreError::Transaction)?;
        let ids = insert_exercises(&tx, workout_id, exercises)?;
        tx.commit().map_err(StoreError::Transaction)?;
        Ok(ids)
    }

    /// Persist a parsed program: the workout record plus one exercise record
    /// per exercise across all days, as a single transaction. The workout id
    /// exists before any exercise row references it.
    pub fn save_program(&mut self, program: &Program) -> Result<SavedProgram, StoreError> {
        let tx = self.conn.transaction().map_err(StoreError::Transaction)?;
        let workout_id = insert_workout(&tx, program, Utc::now())?;
        let pairs: Vec<(&str, &Exercise)> = program
            .days
            .iter()
            .flat_map(|day| day.exercises.iter().map(move |ex| (day.name.as_str(), ex)))
            .collect();
        let exercise_ids = insert_exercises(&tx, workout_id, &pairs)?;
        tx.commit().map_err(StoreError::Transaction)?;
        info!(
            "saved workout {workout_id} with {} exercise record(s)",
            exercise_ids.len()
        );
        Ok(SavedProgram {
            workout_id,
            exercise_ids,
        })
    }

    pub fn all_workouts(&self) -> Result<Vec<WorkoutRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, phase, data, date FROM workouts ORDER BY id")?;
        let rows = stmt.query_map([], map_workout_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn workout(&self, id: i64) -> Result<Option<WorkoutRecord>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, phase, data, date FROM workouts WHERE id = ?1",
                params![id],
                map_workout_row,
            )
            .optional()?)
    }

    pub fn exercises_by_workout(&self, workout_id: i64) -> Result<Vec<ExerciseRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, workout_id, name, day, data FROM exercises WHERE workout_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![workout_id], map_exercise_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Workout with the latest `date`; ties break toward the later insert.
    pub fn most_recent_workout(&self) -> Result<Option<WorkoutRecord>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, phase, data, date FROM workouts ORDER BY date DESC, id DESC LIMIT 1",
                [],
                map_workout_row,
            )
            .optional()?)
    }

    /// Delete a workout together with its exercise records and their
    /// progress records, atomically.
    pub fn delete_workout(&mut self, id: i64) -> Result<(), StoreError> {
        let tx = self.conn.transaction().map_err(StoreError::Transaction)?;
        tx.execute(
            "DELETE FROM progress WHERE exercise_id IN
                 (SELECT id FROM exercises WHERE workout_id = ?1)",
            params![id],
        )
        .map_err(write_error)?;
        tx.execute("DELETE FROM exercises WHERE workout_id = ?1", params![id])
            .map_err(write_error)?;
        let deleted = tx
            .execute("DELETE FROM workouts WHERE id = ?1", params![id])
            .map_err(write_error)?;
        if deleted == 0 {
            // Dropping the transaction rolls the earlier deletes back.
            return Err(StoreError::WorkoutNotFound(id));
        }
        tx.commit().map_err(StoreError::Transaction)?;
        info!("deleted workout {id} and its dependent records");
        Ok(())
    }

    /// Append one performance entry for an exercise. `date` defaults to now.
    pub fn save_progress(
        &self,
        exercise_id: i64,
        weight: f64,
        reps: i64,
        notes: &str,
        date: Option<DateTime<Utc>>,
    ) -> Result<i64, StoreError> {
        let date = date.unwrap_or_else(Utc::now);
        self.conn
            .execute(
                "INSERT INTO progress (exercise_id, weight, reps, notes, date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![exercise_id, weight, reps, notes, date.to_rfc3339()],
            )
            .map_err(write_error)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Full history for one exercise, newest first. The order is total even
    /// under colliding timestamps (id breaks the tie).
    pub fn progress_history(&self, exercise_id: i64) -> Result<Vec<ProgressRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, exercise_id, weight, reps, notes, date FROM progress
             WHERE exercise_id = ?1 ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![exercise_id], map_progress_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn insert_workout(
    conn: &Connection,
    program: &Program,
    date: DateTime<Utc>,
) -> Result<i64, StoreError> {
    let data = serde_json::to_string(program)?;
    conn.execute(
        "INSERT INTO workouts (name, phase, data, date) VALUES (?1, ?2, ?3, ?4)",
        params![program.title, program.phase, data, date.to_rfc3339()],
    )
    .map_err(write_error)?;
    Ok(conn.last_insert_rowid())
}

fn insert_exercises(
    conn: &Connection,
    workout_id: i64,
    exercises: &[(&str, &Exercise)],
) -> Result<Vec<i64>, StoreError> {
    let mut stmt = conn
        .prepare("INSERT INTO exercises (workout_id, name, day, data) VALUES (?1, ?2, ?3, ?4)")?;
    let mut ids = Vec::with_capacity(exercises.len());
    for (day, exercise) in exercises {
        let data = serde_json::to_string(exercise)?;
        stmt.execute(params![workout_id, exercise.name, day, data])
            .map_err(write_error)?;
        ids.push(conn.last_insert_rowid());
    }
    Ok(ids)
}

/// Surface referential failures distinctly from other write failures.
fn write_error(e: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(ref err, _) = e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            return StoreError::Constraint(e);
        }
    }
    StoreError::Query(e)
}

fn map_workout_row(row: &Row) -> rusqlite::Result<WorkoutRecord> {
    let data: String = row.get(3)?;
    let date: String = row.get(4)?;
    Ok(WorkoutRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        phase: row.get(2)?,
        data: serde_json::from_str(&data)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        date: parse_timestamp(4, &date)?,
    })
}

fn map_exercise_row(row: &Row) -> rusqlite::Result<ExerciseRecord> {
    let data: String = row.get(4)?;
    Ok(ExerciseRecord {
        id: row.get(0)?,
        workout_id: row.get(1)?,
        name: row.get(2)?,
        day: row.get(3)?,
        data: serde_json::from_str(&data)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
    })
}

fn map_progress_row(row: &Row) -> rusqlite::Result<ProgressRecord> {
    let date: String = row.get(5)?;
    Ok(ProgressRecord {
        id: row.get(0)?,
        exercise_id: row.get(1)?,
        weight: row.get(2)?,
        reps: row.get(3)?,
        notes: row.get(4)?,
        date: parse_timestamp(5, &date)?,
    })
}

fn parse_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

//! Walks a raw sheet grid and builds the program document.
//!
//! The grid contract: title and phase in the first column of the first two
//! rows, three header rows, then day-marker rows (`#` in the label column)
//! each followed by that day's exercise rows at fixed columns. Rows that are
//! neither are skipped without complaint.

use log::debug;
use thiserror::Error;

use crate::program::{DAY_MARKER, DEFAULT_TITLE, Day, Exercise, GridLayout, Program, Value};
use crate::workbook::Grid;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no data found in the file")]
    EmptySource,
}

/// Parse a grid with the canonical import layout.
pub fn parse_program(grid: &Grid) -> Result<Program, ParseError> {
    parse_program_with(grid, &GridLayout::default())
}

/// Parse a grid with an explicit cell/column layout.
pub fn parse_program_with(grid: &Grid, layout: &GridLayout) -> Result<Program, ParseError> {
    if grid.is_empty() {
        return Err(ParseError::EmptySource);
    }

    let title_cell = cell(grid, layout.title_row, layout.label_col);
    let title = if title_cell.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title_cell.to_string().trim().to_string()
    };
    let phase = cell(grid, layout.phase_row, layout.label_col)
        .to_string()
        .trim()
        .to_string();

    let mut days: Vec<Day> = Vec::new();
    for (index, row) in grid.iter().enumerate().skip(layout.data_start_row) {
        if row.is_empty() {
            continue;
        }

        // A day marker is a *text* cell containing the marker character; a
        // numeric label never starts a day.
        if let Some(label) = row.get(layout.label_col).and_then(Value::as_text) {
            let label = label.trim();
            if !label.is_empty() && label.contains(DAY_MARKER) {
                days.push(Day {
                    name: label.to_string(),
                    exercises: Vec::new(),
                });
                continue;
            }
        }

        let name_cell = field(row, layout.name_col);
        if name_cell.is_empty() {
            continue;
        }
        let Some(day) = days.last_mut() else {
            debug!("row {index}: exercise row before any day marker, skipped");
            continue;
        };
        day.exercises.push(Exercise {
            name: name_cell.to_string(),
            warmup_sets: field(row, layout.warmup_sets_col),
            working_sets: field(row, layout.working_sets_col),
            reps: field(row, layout.reps_col),
            load: field(row, layout.load_col),
            rpe: field(row, layout.rpe_col),
            rest: field(row, layout.rest_col),
            substitution1: field(row, layout.substitution1_col).to_string(),
            substitution2: field(row, layout.substitution2_col).to_string(),
            notes: field(row, layout.notes_col).to_string(),
        });
    }

    debug!(
        "parsed \"{title}\": {} day(s), {} exercise(s)",
        days.len(),
        days.iter().map(|d| d.exercises.len()).sum::<usize>()
    );
    Ok(Program { title, phase, days })
}

fn cell<'a>(grid: &'a Grid, row: usize, col: usize) -> &'a Value {
    static EMPTY: Value = Value::Empty;
    grid.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
}

/// Cell at `col`, trimmed; absent positions map to [`Value::Empty`].
fn field(row: &[Value], col: usize) -> Value {
    match row.get(col) {
        None | Some(Value::Empty) => Value::Empty,
        Some(Value::Text(s)) => Value::text(s),
        Some(Value::Number(n)) => Value::Number(*n),
    }
}

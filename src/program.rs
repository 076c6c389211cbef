//! Core document types for a parsed workout program.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Fallback program title used when the title cell of the source is empty.
pub const DEFAULT_TITLE: &str = "My Workout Plan";

/// Character that marks a row as the start of a new training day.
pub const DAY_MARKER: char = '#';

/// A single cell value from a tabular source.
///
/// Prescription fields keep whatever the source held: a string like `"8-10"`,
/// a bare number, or nothing. The two non-empty kinds are preserved without
/// coercion in either direction; JSON keeps strings as strings, numbers as
/// numbers, and renders `Empty` as `""`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl Value {
    /// Build a text value, trimming surrounding whitespace. A blank string
    /// collapses to [`Value::Empty`].
    pub fn text<S: AsRef<str>>(s: S) -> Self {
        let trimmed = s.as_ref().trim();
        if trimmed.is_empty() {
            Value::Empty
        } else {
            Value::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Text(s) => f.write_str(s),
            // Spreadsheets show integral numbers without a decimal point;
            // the re-serialized grid has to match that.
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Empty => serializer.serialize_str(""),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string, a number, or null")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
                if v.is_empty() {
                    Ok(Value::Empty)
                } else {
                    Ok(Value::Text(v.to_string()))
                }
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
                Ok(Value::Number(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
                Ok(Value::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
                Ok(Value::Number(v as f64))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
                Ok(Value::Empty)
            }

            fn visit_none<E: de::Error>(self) -> Result<Value, E> {
                Ok(Value::Empty)
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// One movement prescription within a training day.
///
/// The serialized field names follow the import schema, so a persisted
/// document round-trips byte-compatible with uploads from the original
/// spreadsheet format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Exercise {
    pub name: String,
    pub warmup_sets: Value,
    pub working_sets: Value,
    pub reps: Value,
    pub load: Value,
    pub rpe: Value,
    pub rest: Value,
    pub substitution1: String,
    pub substitution2: String,
    pub notes: String,
}

/// One training session grouping within a program. A day with zero
/// exercises is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

/// The full parsed workout plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub title: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub days: Vec<Day>,
}

impl Program {
    pub fn exercise_count(&self) -> usize {
        self.days.iter().map(|d| d.exercises.len()).sum()
    }
}

/// Where each piece of a program lives in the source grid.
///
/// The column semantics are a contract with the import format. Keeping them
/// in one place lets the mapping be exercised apart from the row walk.
#[derive(Debug, Clone)]
pub struct GridLayout {
    pub title_row: usize,
    pub phase_row: usize,
    /// Rows before this index are header rows and never parsed.
    pub data_start_row: usize,
    /// Column holding the title, phase, and day markers.
    pub label_col: usize,
    pub name_col: usize,
    pub warmup_sets_col: usize,
    pub working_sets_col: usize,
    pub reps_col: usize,
    pub load_col: usize,
    pub rpe_col: usize,
    pub rest_col: usize,
    pub substitution1_col: usize,
    pub substitution2_col: usize,
    pub notes_col: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            title_row: 0,
            phase_row: 1,
            data_start_row: 3,
            label_col: 0,
            name_col: 1,
            warmup_sets_col: 2,
            working_sets_col: 3,
            reps_col: 4,
            load_col: 5,
            rpe_col: 6,
            rest_col: 7,
            substitution1_col: 8,
            substitution2_col: 9,
            notes_col: 10,
        }
    }
}

/// Display-ready projection of an [`Exercise`].
///
/// Recomputed on demand; nothing here is ever persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedExercise {
    pub name: String,
    pub sets: String,
    pub reps: String,
    pub load: String,
    pub rpe: String,
    pub rest: String,
}

impl Exercise {
    pub fn formatted(&self) -> FormattedExercise {
        FormattedExercise {
            name: self.name.clone(),
            sets: format_sets(&self.working_sets),
            reps: self.reps.to_string(),
            load: self.load.to_string(),
            rpe: self.rpe.to_string(),
            rest: format_rest(&self.rest),
        }
    }
}

/// `"4"` becomes `"4 sets"`; an empty cell stays empty.
pub fn format_sets(v: &Value) -> String {
    if v.is_empty() {
        String::new()
    } else {
        format!("{v} sets")
    }
}

/// Suffixes a bare rest value with `"s"` unless the cell already carries a
/// unit, so `90` becomes `"90s"` but `"2min"` is left alone.
pub fn format_rest(v: &Value) -> String {
    if v.is_empty() {
        return String::new();
    }
    let text = v.to_string();
    if text.contains('s') || text.contains("min") {
        text
    } else {
        format!("{text}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_display_drops_trailing_zero() {
        assert_eq!(Value::Number(185.0).to_string(), "185");
        assert_eq!(Value::Number(7.5).to_string(), "7.5");
        assert_eq!(Value::Text("8-10".into()).to_string(), "8-10");
        assert_eq!(Value::Empty.to_string(), "");
    }

    #[test]
    fn value_text_trims_and_collapses() {
        assert_eq!(Value::text("  Bench Press "), Value::Text("Bench Press".into()));
        assert_eq!(Value::text("   "), Value::Empty);
    }

    #[test]
    fn value_json_round_trip() {
        let json = serde_json::to_string(&Value::Text("8-10".into())).unwrap();
        assert_eq!(json, "\"8-10\"");
        assert_eq!(serde_json::from_str::<Value>("\"8-10\"").unwrap(), Value::Text("8-10".into()));
        assert_eq!(serde_json::from_str::<Value>("185").unwrap(), Value::Number(185.0));
        assert_eq!(serde_json::from_str::<Value>("\"\"").unwrap(), Value::Empty);
        assert_eq!(serde_json::from_str::<Value>("null").unwrap(), Value::Empty);
    }

    #[test]
    fn exercise_json_uses_import_schema_keys() {
        let exercise = Exercise {
            name: "Bench Press".into(),
            working_sets: Value::Text("4".into()),
            ..Exercise::default()
        };
        let json = serde_json::to_value(&exercise).unwrap();
        assert_eq!(json["name"], "Bench Press");
        assert_eq!(json["workingSets"], "4");
        assert_eq!(json["warmupSets"], "");
        assert!(json.get("working_sets").is_none());
    }

    #[test]
    fn format_rest_adds_unit_once() {
        assert_eq!(format_rest(&Value::Number(90.0)), "90s");
        assert_eq!(format_rest(&Value::Text("90s".into())), "90s");
        assert_eq!(format_rest(&Value::Text("2min".into())), "2min");
        assert_eq!(format_rest(&Value::Empty), "");
    }

    #[test]
    fn format_rest_is_idempotent() {
        for v in [Value::Number(60.0), Value::Text("45".into()), Value::Text("3min".into())] {
            let once = format_rest(&v);
            let twice = format_rest(&Value::text(&once));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn formatting_twice_matches_formatting_once() {
        let exercise = Exercise {
            name: "Squat".into(),
            working_sets: Value::Number(4.0),
            reps: Value::Text("6-8".into()),
            rest: Value::Number(120.0),
            ..Exercise::default()
        };
        assert_eq!(exercise.formatted(), exercise.formatted());
        assert_eq!(exercise.formatted().sets, "4 sets");
        assert_eq!(exercise.formatted().rest, "120s");
    }
}

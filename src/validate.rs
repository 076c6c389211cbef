//! Structural validation of a program document.
//!
//! Presence and array-ness of the document fields are enforced by the types
//! (and by serde when a persisted document is read back); what remains are
//! the non-emptiness rules, checked in order with the first failure
//! reported. The input is never modified and never partially repaired.

use thiserror::Error;

use crate::program::Program;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid workout data: program title is empty")]
    EmptyTitle,
    #[error("invalid workout data: day {index} has an empty name")]
    EmptyDayName { index: usize },
    #[error("invalid workout data: exercise {index} in \"{day}\" has an empty name")]
    EmptyExerciseName { day: String, index: usize },
}

pub fn validate(program: &Program) -> Result<(), ValidationError> {
    if program.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    for (index, day) in program.days.iter().enumerate() {
        if day.name.trim().is_empty() {
            return Err(ValidationError::EmptyDayName { index });
        }
        for (ex_index, exercise) in day.exercises.iter().enumerate() {
            if exercise.name.trim().is_empty() {
                return Err(ValidationError::EmptyExerciseName {
                    day: day.name.clone(),
                    index: ex_index,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Day, Exercise};

    fn program_with(days: Vec<Day>) -> Program {
        Program {
            title: "Test Program".into(),
            phase: String::new(),
            days,
        }
    }

    fn exercise(name: &str) -> Exercise {
        Exercise {
            name: name.into(),
            ..Exercise::default()
        }
    }

    #[test]
    fn empty_days_and_empty_exercise_lists_pass() {
        assert_eq!(validate(&program_with(vec![])), Ok(()));
        let program = program_with(vec![Day {
            name: "#Rest".into(),
            exercises: vec![],
        }]);
        assert_eq!(validate(&program), Ok(()));
    }

    #[test]
    fn empty_title_fails() {
        let mut program = program_with(vec![]);
        program.title = "  ".into();
        assert_eq!(validate(&program), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn empty_day_name_fails_with_its_index() {
        let program = program_with(vec![
            Day { name: "#Push".into(), exercises: vec![] },
            Day { name: "".into(), exercises: vec![] },
        ]);
        assert_eq!(validate(&program), Err(ValidationError::EmptyDayName { index: 1 }));
    }

    #[test]
    fn empty_exercise_name_names_the_day() {
        let program = program_with(vec![Day {
            name: "#Pull".into(),
            exercises: vec![exercise("Row"), exercise(" ")],
        }]);
        assert_eq!(
            validate(&program),
            Err(ValidationError::EmptyExerciseName { day: "#Pull".into(), index: 1 })
        );
    }

    #[test]
    fn first_failure_wins() {
        let program = program_with(vec![Day {
            name: "".into(),
            exercises: vec![exercise("")],
        }]);
        assert_eq!(validate(&program), Err(ValidationError::EmptyDayName { index: 0 }));
    }
}

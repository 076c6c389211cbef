// Module for summarizing logged progress entries.
use crate::store::ProgressRecord;
use chrono::{DateTime, Utc};

/// Summary statistics for one exercise's progress history.
#[derive(Debug, Default, PartialEq)]
pub struct ProgressStats {
    pub entries: usize,
    pub total_reps: i64,
    pub total_volume: f64,
    pub best_weight: Option<f64>,
    pub best_est_1rm: Option<f64>,
    pub last_entry: Option<DateTime<Utc>>,
}

/// Reduce a progress history to its summary statistics.
///
/// Volume is weight times reps per entry. The estimated one-rep max uses
/// the Epley formula. Entry order does not matter.
pub fn progress_stats(history: &[ProgressRecord]) -> ProgressStats {
    let mut stats = ProgressStats::default();
    for entry in history {
        stats.entries += 1;
        stats.total_reps += entry.reps;
        stats.total_volume += entry.weight * entry.reps as f64;
        stats.best_weight = match stats.best_weight {
            Some(w) if w >= entry.weight => Some(w),
            _ => Some(entry.weight),
        };
        let est = entry.weight * (1.0 + entry.reps as f64 / 30.0);
        stats.best_est_1rm = match stats.best_est_1rm {
            Some(current) if current >= est => Some(current),
            _ => Some(est),
        };
        stats.last_entry = match stats.last_entry {
            Some(d) if d >= entry.date => Some(d),
            _ => Some(entry.date),
        };
    }
    stats
}

/// Format a user facing message after successfully loading a program.
pub fn format_load_message(days: usize, exercises: usize, source: &str) -> String {
    format!("Loaded {} days and {} exercises from {}", days, exercises, source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, weight: f64, reps: i64, date: &str) -> ProgressRecord {
        ProgressRecord {
            id,
            exercise_id: 1,
            weight,
            reps,
            notes: String::new(),
            date: DateTime::parse_from_rfc3339(date).unwrap().with_timezone(&Utc),
        }
    }

    #[test]
    fn test_progress_stats() {
        let history = vec![
            entry(1, 100.0, 5, "2025-01-01T08:00:00Z"),
            entry(2, 110.0, 3, "2025-01-08T08:00:00Z"),
            entry(3, 105.0, 8, "2025-01-15T08:00:00Z"),
        ];
        let stats = progress_stats(&history);
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.total_reps, 16);
        assert!((stats.total_volume - (500.0 + 330.0 + 840.0)).abs() < 1e-6);
        assert_eq!(stats.best_weight, Some(110.0));
        // Epley: 105 * (1 + 8/30) = 133.0 beats 110 * (1 + 3/30) = 121.0
        assert!((stats.best_est_1rm.unwrap() - 133.0).abs() < 1e-3);
        assert_eq!(
            stats.last_entry,
            Some(DateTime::parse_from_rfc3339("2025-01-15T08:00:00Z").unwrap().with_timezone(&Utc))
        );
    }

    #[test]
    fn test_empty_history_gives_defaults() {
        assert_eq!(progress_stats(&[]), ProgressStats::default());
    }

    #[test]
    fn test_format_load_message() {
        let msg = format_load_message(3, 12, "ppl.xlsx");
        assert_eq!(msg, "Loaded 3 days and 12 exercises from ppl.xlsx");
    }
}

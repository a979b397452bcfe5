//! Metric Engine
//!
//! Derives Total, Average, and Grade from the raw subject scores. Cutoffs
//! are evaluated in descending order; the first matching cutoff wins.
//!
//! Score content is not validated here: non-numeric scores are rejected
//! upstream by the CSV schema check.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::SUBJECTS;

/// Columns derived from the subject scores.
///
/// Recomputed from raw scores after every mutation, never persisted as
/// authoritative.
pub const DERIVED_COLUMNS: [&str; 3] = ["Total", "Average", "Grade"];

/// Grade cutoffs applied to the Average column.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GradeScale {
    pub a_cutoff: f64,
    pub b_cutoff: f64,
    pub c_cutoff: f64,
}

impl Default for GradeScale {
    fn default() -> Self {
        Self {
            a_cutoff: 85.0,
            b_cutoff: 70.0,
            c_cutoff: 50.0,
        }
    }
}

impl GradeScale {
    /// Load cutoffs from a JSON override file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read grade scale file: {}", path.display()))?;

        serde_json::from_str(&contents).with_context(|| "Failed to parse grade scale JSON")
    }
}

/// Augment `df` with Total, Average, and Grade.
///
/// Stale derived columns from an earlier pass are dropped first so the
/// output always reflects the current raw scores.
pub fn with_derived_columns(df: &DataFrame, scale: &GradeScale) -> Result<DataFrame> {
    let mut raw = df.clone();
    for column in DERIVED_COLUMNS {
        if raw.get_column_index(column).is_some() {
            raw = raw.drop(column)?;
        }
    }

    let total = SUBJECTS[1..]
        .iter()
        .fold(col(SUBJECTS[0]), |acc, subject| acc + col(*subject));

    raw.lazy()
        .with_columns([
            total.clone().alias("Total"),
            (total.cast(DataType::Float64) / lit(SUBJECTS.len() as f64)).alias("Average"),
        ])
        .with_column(
            when(col("Average").gt_eq(lit(scale.a_cutoff)))
                .then(lit("A"))
                .when(col("Average").gt_eq(lit(scale.b_cutoff)))
                .then(lit("B"))
                .when(col("Average").gt_eq(lit(scale.c_cutoff)))
                .then(lit("C"))
                .otherwise(lit("F"))
                .alias("Grade"),
        )
        .collect()
        .with_context(|| "Failed to compute derived columns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn roster_of(scores: &[[i64; 4]]) -> DataFrame {
        let ids: Vec<String> = (0..scores.len()).map(|i| format!("S{:03}", i + 1)).collect();
        let names: Vec<&str> = scores.iter().map(|_| "Test").collect();
        let ages: Vec<i64> = scores.iter().map(|_| 20).collect();

        df!(
            "ID" => ids,
            "Name" => names,
            "Age" => ages,
            "Math" => scores.iter().map(|s| s[0]).collect::<Vec<_>>(),
            "Physics" => scores.iter().map(|s| s[1]).collect::<Vec<_>>(),
            "Chemistry" => scores.iter().map(|s| s[2]).collect::<Vec<_>>(),
            "English" => scores.iter().map(|s| s[3]).collect::<Vec<_>>(),
        )
        .unwrap()
    }

    fn derived_row(scores: [i64; 4]) -> (i64, f64, String) {
        let out = with_derived_columns(&roster_of(&[scores]), &GradeScale::default()).unwrap();
        (
            out.column("Total").unwrap().i64().unwrap().get(0).unwrap(),
            out.column("Average").unwrap().f64().unwrap().get(0).unwrap(),
            out.column("Grade").unwrap().str().unwrap().get(0).unwrap().to_string(),
        )
    }

    #[test]
    fn test_worked_example() {
        // Math=90, Physics=80, Chemistry=70, English=60
        let (total, average, grade) = derived_row([90, 80, 70, 60]);
        assert_eq!(total, 300);
        assert_relative_eq!(average, 75.0);
        assert_eq!(grade, "B");
    }

    #[test]
    fn test_grade_boundaries() {
        // Exact cutoffs belong to the higher grade; just below falls through
        assert_eq!(derived_row([85, 85, 85, 85]).2, "A"); // avg 85.00
        assert_eq!(derived_row([85, 85, 85, 84]).2, "B"); // avg 84.75
        assert_eq!(derived_row([70, 70, 70, 70]).2, "B"); // avg 70.00
        assert_eq!(derived_row([70, 70, 70, 69]).2, "C"); // avg 69.75
        assert_eq!(derived_row([50, 50, 50, 50]).2, "C"); // avg 50.00
        assert_eq!(derived_row([50, 50, 50, 49]).2, "F"); // avg 49.75
    }

    #[test]
    fn test_total_and_average_identities() {
        let rows = [[0, 0, 0, 0], [100, 100, 100, 100], [13, 57, 91, 22]];
        for scores in rows {
            let (total, average, _) = derived_row(scores);
            assert_eq!(total, scores.iter().sum::<i64>());
            assert_relative_eq!(average, total as f64 / 4.0);
        }
    }

    #[test]
    fn test_stale_derived_columns_are_recomputed() {
        let first = with_derived_columns(&roster_of(&[[40, 40, 40, 40]]), &GradeScale::default())
            .unwrap();
        assert_eq!(first.column("Grade").unwrap().str().unwrap().get(0), Some("F"));

        // Rerunning the derivation on an already-augmented frame must not
        // duplicate columns or keep stale values.
        let again = with_derived_columns(&first, &GradeScale::default()).unwrap();
        assert_eq!(again.width(), first.width());
        assert_eq!(again.column("Grade").unwrap().str().unwrap().get(0), Some("F"));
    }

    #[test]
    fn test_custom_grade_scale() {
        let lenient = GradeScale {
            a_cutoff: 60.0,
            b_cutoff: 40.0,
            c_cutoff: 20.0,
        };
        let out = with_derived_columns(&roster_of(&[[60, 60, 60, 60]]), &lenient).unwrap();
        assert_eq!(out.column("Grade").unwrap().str().unwrap().get(0), Some("A"));
    }
}

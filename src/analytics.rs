//! Query Module
//!
//! Ranking and descriptive statistics over the augmented roster. All
//! functions here expect the derived columns to be present (see
//! `metrics::with_derived_columns`).

use anyhow::{bail, Context, Result};
use polars::prelude::*;

use crate::data::SUBJECTS;

/// Default number of rows returned by [`top_students`].
pub const DEFAULT_TOP_N: usize = 5;

/// Per-subject mean / max / min.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectStats {
    pub subject: String,
    pub mean: f64,
    pub max: i64,
    pub min: i64,
}

/// Statistics over all subject scores flattened into one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct OverallStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub max: i64,
    pub min: i64,
}

/// One row of the describe-style summary.
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// The `n` highest-Average students, projected to ID / Name / Average / Grade.
///
/// Stable sort: ties keep original row order. Returns fewer than `n` rows
/// when the roster is smaller.
pub fn top_students(df: &DataFrame, n: usize) -> Result<DataFrame> {
    let sorted = df
        .sort(
            ["Average"],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .with_context(|| "Failed to sort roster by Average")?;

    sorted
        .head(Some(n))
        .select(["ID", "Name", "Average", "Grade"])
        .with_context(|| "Failed to project top-student columns")
}

/// Mean, max, and min per subject.
pub fn subject_statistics(df: &DataFrame) -> Result<Vec<SubjectStats>> {
    if df.height() == 0 {
        bail!("Roster is empty");
    }

    let mut stats = Vec::with_capacity(SUBJECTS.len());
    for subject in SUBJECTS {
        let scores = df.column(subject)?.i64()?;
        stats.push(SubjectStats {
            subject: subject.to_string(),
            mean: scores
                .mean()
                .with_context(|| format!("No scores for {}", subject))?,
            max: scores
                .max()
                .with_context(|| format!("No scores for {}", subject))?,
            min: scores
                .min()
                .with_context(|| format!("No scores for {}", subject))?,
        });
    }

    Ok(stats)
}

/// Mean, population standard deviation, max, and min over all subject
/// scores flattened into a single sample.
pub fn overall_statistics(df: &DataFrame) -> Result<OverallStats> {
    let values = flattened_scores(df)?;
    if values.is_empty() {
        bail!("Roster is empty");
    }

    let floats: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    let mean = mean_of(&floats);

    Ok(OverallStats {
        mean,
        std_dev: std_dev_of(&floats, mean, 0),
        max: values
            .iter()
            .copied()
            .max()
            .with_context(|| "No scores present")?,
        min: values
            .iter()
            .copied()
            .min()
            .with_context(|| "No scores present")?,
    })
}

/// Describe-style summary of every numeric column.
pub fn summarize(df: &DataFrame) -> Result<Vec<ColumnSummary>> {
    if df.height() == 0 {
        bail!("Roster is empty");
    }

    let mut numeric: Vec<&str> = vec!["Age"];
    numeric.extend(SUBJECTS);
    for column in ["Total", "Average"] {
        if df.get_column_index(column).is_some() {
            numeric.push(column);
        }
    }

    let mut rows = Vec::with_capacity(numeric.len());
    for name in numeric {
        let series = df
            .column(name)?
            .cast(&DataType::Float64)
            .with_context(|| format!("Column '{}' is not numeric", name))?;
        let values: Vec<f64> = series.f64()?.into_no_null_iter().collect();

        let mean = mean_of(&values);
        rows.push(ColumnSummary {
            column: name.to_string(),
            count: values.len(),
            mean,
            std_dev: std_dev_of(&values, mean, 1),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        });
    }

    Ok(rows)
}

/// All subject scores in one flat vector, column by column.
fn flattened_scores(df: &DataFrame) -> Result<Vec<i64>> {
    let mut values = Vec::with_capacity(df.height() * SUBJECTS.len());
    for subject in SUBJECTS {
        let scores = df.column(subject)?.i64()?;
        values.extend(scores.into_no_null_iter());
    }
    Ok(values)
}

fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with the given delta degrees of freedom
/// (0 = population, 1 = sample).
fn std_dev_of(values: &[f64], mean: f64, ddof: usize) -> f64 {
    if values.len() <= ddof {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (sum_sq / (values.len() - ddof) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{with_derived_columns, GradeScale};
    use approx::assert_relative_eq;

    fn augmented_roster(scores: &[[i64; 4]]) -> DataFrame {
        let ids: Vec<String> = (0..scores.len()).map(|i| format!("S{:03}", i + 1)).collect();
        let names: Vec<String> = (0..scores.len()).map(|i| format!("Student{}", i + 1)).collect();
        let ages: Vec<i64> = scores.iter().map(|_| 20).collect();

        let raw = df!(
            "ID" => ids,
            "Name" => names,
            "Age" => ages,
            "Math" => scores.iter().map(|s| s[0]).collect::<Vec<_>>(),
            "Physics" => scores.iter().map(|s| s[1]).collect::<Vec<_>>(),
            "Chemistry" => scores.iter().map(|s| s[2]).collect::<Vec<_>>(),
            "English" => scores.iter().map(|s| s[3]).collect::<Vec<_>>(),
        )
        .unwrap();

        with_derived_columns(&raw, &GradeScale::default()).unwrap()
    }

    #[test]
    fn test_top_students_sorted_and_bounded() {
        let df = augmented_roster(&[
            [50, 50, 50, 50], // avg 50
            [90, 90, 90, 90], // avg 90
            [70, 70, 70, 70], // avg 70
        ]);

        let top = top_students(&df, 2).unwrap();
        assert_eq!(top.height(), 2);

        let ids = top.column("ID").unwrap().str().unwrap();
        assert_eq!(ids.get(0), Some("S002"));
        assert_eq!(ids.get(1), Some("S003"));

        // Never more rows than exist
        let top = top_students(&df, 10).unwrap();
        assert_eq!(top.height(), 3);
    }

    #[test]
    fn test_top_students_ties_keep_row_order() {
        let df = augmented_roster(&[
            [80, 80, 80, 80],
            [80, 80, 80, 80],
            [60, 60, 60, 60],
        ]);

        let top = top_students(&df, 3).unwrap();
        let ids = top.column("ID").unwrap().str().unwrap();
        assert_eq!(ids.get(0), Some("S001"));
        assert_eq!(ids.get(1), Some("S002"));
        assert_eq!(ids.get(2), Some("S003"));

        let averages = top.column("Average").unwrap().f64().unwrap();
        assert!(averages.get(0) >= averages.get(1));
        assert!(averages.get(1) >= averages.get(2));
    }

    #[test]
    fn test_subject_statistics() {
        let df = augmented_roster(&[[40, 50, 60, 70], [80, 90, 100, 30]]);

        let stats = subject_statistics(&df).unwrap();
        assert_eq!(stats.len(), 4);

        let math = &stats[0];
        assert_eq!(math.subject, "Math");
        assert_relative_eq!(math.mean, 60.0);
        assert_eq!(math.max, 80);
        assert_eq!(math.min, 40);

        let english = &stats[3];
        assert_eq!(english.max, 70);
        assert_eq!(english.min, 30);
    }

    #[test]
    fn test_overall_statistics_population_std() {
        // Flattened sample: 2, 4, 4, 4, 5, 5, 7, 9 -> mean 5, pop std 2
        let df = augmented_roster(&[[2, 4, 4, 4], [5, 5, 7, 9]]);

        let stats = overall_statistics(&df).unwrap();
        assert_relative_eq!(stats.mean, 5.0);
        assert_relative_eq!(stats.std_dev, 2.0);
        assert_eq!(stats.max, 9);
        assert_eq!(stats.min, 2);
    }

    #[test]
    fn test_summarize_covers_numeric_columns() {
        let df = augmented_roster(&[[90, 80, 70, 60], [60, 70, 80, 90]]);

        let summary = summarize(&df).unwrap();
        let columns: Vec<&str> = summary.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(
            columns,
            ["Age", "Math", "Physics", "Chemistry", "English", "Total", "Average"]
        );

        let average = summary.last().unwrap();
        assert_eq!(average.count, 2);
        assert_relative_eq!(average.mean, 75.0);
        assert_relative_eq!(average.std_dev, 0.0);
    }

    #[test]
    fn test_empty_roster_queries_fail() {
        let df = augmented_roster(&[]);
        assert!(subject_statistics(&df).is_err());
        assert!(overall_statistics(&df).is_err());
        assert!(summarize(&df).is_err());

        // Top-N on an empty roster is simply empty
        assert_eq!(top_students(&df, 5).unwrap().height(), 0);
    }
}

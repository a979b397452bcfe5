//! Terminal Charts
//!
//! String renderers over the augmented roster: histogram of averages, bar
//! chart of subject means, grade count plot, and a subject correlation
//! heatmap. The menu layer prints the returned strings as-is.

use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use comfy_table::{presets::ASCII_MARKDOWN, Cell, CellAlignment, ContentArrangement, Table};
use polars::prelude::*;
use rustc_hash::FxHashMap;

use crate::data::SUBJECTS;

/// Default bin count for the Average histogram.
pub const HISTOGRAM_BINS: usize = 10;

/// Widest bar, in glyphs.
const BAR_WIDTH: usize = 40;

/// Grades in display order.
const GRADE_ORDER: [&str; 4] = ["A", "B", "C", "F"];

/// Histogram of the Average column.
pub fn average_histogram(df: &DataFrame, bins: usize) -> Result<String> {
    if df.height() == 0 {
        bail!("Roster is empty");
    }
    if bins == 0 {
        bail!("Histogram needs at least one bin");
    }

    let averages: Vec<f64> = df
        .column("Average")?
        .f64()?
        .into_no_null_iter()
        .collect();
    let (lo, bin_width, counts) = bin_values(&averages, bins);
    let peak = counts.iter().copied().max().unwrap_or(0).max(1);

    let mut out = String::from("Average Marks Distribution\n");
    for (i, &count) in counts.iter().enumerate() {
        let start = lo + i as f64 * bin_width;
        writeln!(
            out,
            "{:>6.1}..{:<6.1} | {:<width$} {}",
            start,
            start + bin_width,
            bar(count as f64 / peak as f64),
            count,
            width = BAR_WIDTH,
        )?;
    }

    Ok(out)
}

/// Horizontal bar per subject mean, on a 0-100 scale.
pub fn subject_mean_bars(df: &DataFrame) -> Result<String> {
    if df.height() == 0 {
        bail!("Roster is empty");
    }

    let mut out = String::from("Average Marks per Subject\n");
    for subject in SUBJECTS {
        let mean = df
            .column(subject)?
            .i64()?
            .mean()
            .with_context(|| format!("No scores for {}", subject))?;
        writeln!(
            out,
            "{:<10} | {:<width$} {:.2}",
            subject,
            bar(mean / 100.0),
            mean,
            width = BAR_WIDTH,
        )?;
    }

    Ok(out)
}

/// Count plot over grades, in fixed A/B/C/F order.
pub fn grade_counts(df: &DataFrame) -> Result<String> {
    if df.height() == 0 {
        bail!("Roster is empty");
    }

    let grades = df.column("Grade")?.str()?;
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for grade in grades.into_iter().flatten() {
        *counts.entry(grade).or_insert(0) += 1;
    }
    let peak = counts.values().copied().max().unwrap_or(0).max(1);

    let mut out = String::from("Grade Distribution\n");
    for grade in GRADE_ORDER {
        let count = counts.get(grade).copied().unwrap_or(0);
        writeln!(
            out,
            "{:<2} | {:<width$} {}",
            grade,
            bar(count as f64 / peak as f64),
            count,
            width = BAR_WIDTH,
        )?;
    }

    Ok(out)
}

/// Pearson correlation matrix of the four subjects, annotated to two
/// decimals.
pub fn correlation_heatmap(df: &DataFrame) -> Result<String> {
    if df.height() == 0 {
        bail!("Roster is empty");
    }

    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(SUBJECTS.len());
    for subject in SUBJECTS {
        columns.push(
            df.column(subject)?
                .i64()?
                .into_no_null_iter()
                .map(|v| v as f64)
                .collect(),
        );
    }

    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("")];
    header.extend(SUBJECTS.iter().map(|s| Cell::new(*s)));
    table.set_header(header);

    for (i, subject) in SUBJECTS.iter().enumerate() {
        let mut row = vec![Cell::new(*subject)];
        for other in &columns {
            let r = pearson(&columns[i], other);
            row.push(Cell::new(format!("{:.2}", r)).set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }

    Ok(format!("Subject Correlation Heatmap\n{table}\n"))
}

/// Bar of `fraction` x [`BAR_WIDTH`] block glyphs.
fn bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled)
}

/// Bin `values` into `bins` equal-width intervals over [min, max].
///
/// Returns (min, bin width, counts). The maximum lands in the last bin; a
/// constant sample collapses into the first bin.
fn bin_values(values: &[f64], bins: usize) -> (f64, f64, Vec<usize>) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut counts = vec![0usize; bins];
    if hi > lo {
        let width = (hi - lo) / bins as f64;
        for &v in values {
            let mut idx = ((v - lo) / width) as usize;
            if idx >= bins {
                idx = bins - 1;
            }
            counts[idx] += 1;
        }
        (lo, width, counts)
    } else {
        counts[0] = values.len();
        (lo, 1.0, counts)
    }
}

/// Pearson correlation; NaN when either sample has zero variance.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return f64::NAN;
    }

    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        let dx = a - mx;
        let dy = b - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }

    cov / (var_x.sqrt() * var_y.sqrt())
}

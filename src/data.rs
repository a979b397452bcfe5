//! Roster Storage
//!
//! Loads and persists the student roster CSV using Polars. The store owns
//! only the raw columns; derived columns belong to the metric engine and are
//! never written back to disk.
//!
//! Storage model: full-table read on load, full-table rewrite on every
//! mutation.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::*;
use rand::Rng;
use thiserror::Error;

/// Subject score columns, in storage order.
pub const SUBJECTS: [&str; 4] = ["Math", "Physics", "Chemistry", "English"];

/// Raw columns persisted to disk, in storage order.
pub const RAW_COLUMNS: [&str; 7] = [
    "ID", "Name", "Age", "Math", "Physics", "Chemistry", "English",
];

/// Name pool for synthetic rosters.
const SAMPLE_NAMES: [&str; 12] = [
    "Ali", "Ahmed", "Sara", "Ayesha", "Hassan", "Zain",
    "Umar", "Fatima", "Hina", "Bilal", "Usman", "Noor",
];

/// Schema violations detected when loading a roster file.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster file is missing required column '{0}'")]
    MissingColumn(String),
}

/// In-memory roster backed by a CSV file.
#[derive(Debug)]
pub struct RosterStore {
    path: PathBuf,
    /// Raw table only; derived columns never live here.
    pub df: DataFrame,
}

impl RosterStore {
    /// Open the roster at `path`.
    ///
    /// A missing file is not an error: a synthetic roster of `seed_count`
    /// students is generated and written first, then loaded.
    pub fn open(path: &Path, seed_count: usize) -> Result<Self> {
        if !path.exists() {
            let df = generate_dummy_students(seed_count)?;
            write_csv(path, &df)?;
            println!("Dummy student data generated.");
        }

        let df = read_csv(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            df,
        })
    }

    /// Re-read the whole table from disk, discarding in-memory state.
    pub fn reload(&mut self) -> Result<()> {
        self.df = read_csv(&self.path)?;
        Ok(())
    }

    /// ID assigned to the next added student: `S` + zero-padded row count + 1.
    pub fn next_student_id(&self) -> String {
        format!("S{:03}", self.df.height() + 1)
    }

    /// Append one student and rewrite the CSV. Returns the assigned ID.
    pub fn add_student(&mut self, name: &str, age: i64, scores: [i64; 4]) -> Result<String> {
        let id = self.next_student_id();

        let row = df!(
            "ID" => [id.as_str()],
            "Name" => [name],
            "Age" => [age],
            "Math" => [scores[0]],
            "Physics" => [scores[1]],
            "Chemistry" => [scores[2]],
            "English" => [scores[3]],
        )
        .with_context(|| "Failed to build student row")?;

        self.df = self
            .df
            .vstack(&row)
            .with_context(|| "Failed to append student row")?;
        write_csv(&self.path, &self.df)?;

        Ok(id)
    }

    /// Remove the row matching `student_id` and rewrite the CSV.
    ///
    /// Returns `true` if a row was removed. An unknown ID is a silent no-op.
    pub fn delete_student(&mut self, student_id: &str) -> Result<bool> {
        let before = self.df.height();

        let id_col = self.df.column("ID")?.str()?;
        let mask: BooleanChunked = id_col
            .into_iter()
            .map(|opt| opt.map_or(true, |s| s != student_id))
            .collect();

        self.df = self.df.filter(&mask)?;
        write_csv(&self.path, &self.df)?;

        Ok(self.df.height() < before)
    }
}

/// Generate a synthetic roster of `n` students.
///
/// Ages 18-25, scores 40-100, names drawn from a fixed pool.
pub fn generate_dummy_students(n: usize) -> Result<DataFrame> {
    let mut rng = rand::thread_rng();

    let mut ids = Vec::with_capacity(n);
    let mut names = Vec::with_capacity(n);
    let mut ages = Vec::with_capacity(n);
    let mut math = Vec::with_capacity(n);
    let mut physics = Vec::with_capacity(n);
    let mut chemistry = Vec::with_capacity(n);
    let mut english = Vec::with_capacity(n);

    for i in 0..n {
        ids.push(format!("S{:03}", i + 1));
        names.push(SAMPLE_NAMES[rng.gen_range(0..SAMPLE_NAMES.len())]);
        ages.push(rng.gen_range(18..=25i64));
        math.push(rng.gen_range(40..=100i64));
        physics.push(rng.gen_range(40..=100i64));
        chemistry.push(rng.gen_range(40..=100i64));
        english.push(rng.gen_range(40..=100i64));
    }

    df!(
        "ID" => ids,
        "Name" => names,
        "Age" => ages,
        "Math" => math,
        "Physics" => physics,
        "Chemistry" => chemistry,
        "English" => english,
    )
    .with_context(|| "Failed to build synthetic roster")
}

/// Load the roster CSV and validate the raw schema.
fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to load roster CSV: {}", path.display()))?;

    for column in RAW_COLUMNS {
        if df.get_column_index(column).is_none() {
            return Err(RosterError::MissingColumn(column.to_string()).into());
        }
    }

    Ok(df)
}

/// Rewrite the whole roster CSV.
fn write_csv(path: &Path, df: &DataFrame) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create roster CSV: {}", path.display()))?;

    let mut out = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut out)
        .with_context(|| format!("Failed to write roster CSV: {}", path.display()))?;

    Ok(())
}

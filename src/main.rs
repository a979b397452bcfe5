//! Student Performance Analytics System
//!
//! Interactive menu front end over the roster store, metric engine, query
//! module, and chart renderers. Single-threaded; the only blocking points
//! are stdin reads.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{presets::ASCII_MARKDOWN, Cell, CellAlignment, ContentArrangement, Table};
use polars::prelude::*;

use student_analytics::analytics::{self, DEFAULT_TOP_N};
use student_analytics::charts;
use student_analytics::data::{RosterStore, SUBJECTS};
use student_analytics::metrics::{with_derived_columns, GradeScale};

#[derive(Parser)]
#[command(
    name = "student_analytics",
    about = "Student performance analytics over a CSV roster"
)]
struct Cli {
    /// Roster CSV file; seeded with synthetic data when missing.
    #[arg(long, default_value = "students_data.csv")]
    data_file: PathBuf,

    /// Number of synthetic students generated when the roster is missing.
    #[arg(long, default_value_t = 50)]
    seed_count: usize,

    /// Optional JSON file overriding the A/B/C grade cutoffs.
    #[arg(long)]
    grade_scale: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let scale = match &cli.grade_scale {
        Some(path) => GradeScale::load(path)?,
        None => GradeScale::default(),
    };

    let mut store = RosterStore::open(&cli.data_file, cli.seed_count)?;

    loop {
        clear();
        rule();
        println!("STUDENT PERFORMANCE ANALYTICS SYSTEM");
        rule();
        println!("1. Add Student");
        println!("2. Delete Student");
        println!("3. Analytics");
        println!("4. Visualization");
        println!("5. Reload Data");
        println!("0. Exit");

        match prompt("Choice: ")?.as_str() {
            "1" => add_student_screen(&mut store)?,
            "2" => delete_student_screen(&mut store)?,
            "3" => analytics_menu(&store, &scale)?,
            "4" => visualization_menu(&store, &scale)?,
            "5" => store.reload()?,
            "0" => {
                println!("Exiting...");
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

fn analytics_menu(store: &RosterStore, scale: &GradeScale) -> Result<()> {
    loop {
        clear();
        rule();
        println!("ANALYTICS MENU");
        rule();
        println!("1. Data Summary");
        println!("2. Top Students");
        println!("3. Subject Statistics");
        println!("4. Overall Analysis");
        println!("0. Back");

        let choice = prompt("Choice: ")?;
        if choice == "0" {
            return Ok(());
        }

        // Derived columns are recomputed from raw scores on every screen
        let view = with_derived_columns(&store.df, scale)?;
        let outcome = match choice.as_str() {
            "1" => show_summary(&view),
            "2" => show_top_students(&view),
            "3" => show_subject_statistics(&view),
            "4" => show_overall_statistics(&view),
            _ => continue,
        };

        clear();
        if let Err(err) = outcome {
            println!("{err:#}");
        }
        pause()?;
    }
}

fn visualization_menu(store: &RosterStore, scale: &GradeScale) -> Result<()> {
    loop {
        clear();
        rule();
        println!("VISUALIZATION MENU");
        rule();
        println!("1. Average Distribution");
        println!("2. Subject Mean Bar Chart");
        println!("3. Grade Count");
        println!("4. Heatmap");
        println!("0. Back");

        let choice = prompt("Choice: ")?;
        if choice == "0" {
            return Ok(());
        }

        let view = with_derived_columns(&store.df, scale)?;
        let rendered = match choice.as_str() {
            "1" => charts::average_histogram(&view, charts::HISTOGRAM_BINS),
            "2" => charts::subject_mean_bars(&view),
            "3" => charts::grade_counts(&view),
            "4" => charts::correlation_heatmap(&view),
            _ => continue,
        };

        clear();
        match rendered {
            Ok(chart) => println!("{chart}"),
            Err(err) => println!("{err:#}"),
        }
        pause()?;
    }
}

fn add_student_screen(store: &mut RosterStore) -> Result<()> {
    clear();
    rule();
    println!("ADD NEW STUDENT");
    rule();

    let name = prompt("Name: ")?;
    let age = prompt_i64("Age: ")?;

    let mut scores = [0i64; 4];
    for (slot, subject) in scores.iter_mut().zip(SUBJECTS) {
        *slot = prompt_i64(&format!("{subject} marks: "))?;
    }

    let id = store.add_student(&name, age, scores)?;
    println!("Student {id} added successfully.");
    pause()
}

fn delete_student_screen(store: &mut RosterStore) -> Result<()> {
    clear();
    let id = prompt("Enter Student ID to delete: ")?;
    store.delete_student(&id)?;
    println!("Student deleted.");
    pause()
}

fn show_summary(view: &DataFrame) -> Result<()> {
    rule();
    println!("DATA SUMMARY");
    rule();

    let summary = analytics::summarize(view)?;

    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Column", "Count", "Mean", "Std", "Min", "Max"]);
    for row in summary {
        table.add_row(vec![
            Cell::new(row.column),
            numeric_cell(format!("{}", row.count)),
            numeric_cell(format!("{:.2}", row.mean)),
            numeric_cell(format!("{:.2}", row.std_dev)),
            numeric_cell(format!("{:.2}", row.min)),
            numeric_cell(format!("{:.2}", row.max)),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn show_top_students(view: &DataFrame) -> Result<()> {
    let top = analytics::top_students(view, DEFAULT_TOP_N)?;

    let ids = top.column("ID")?.str()?;
    let names = top.column("Name")?.str()?;
    let averages = top.column("Average")?.f64()?;
    let grades = top.column("Grade")?.str()?;

    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Name", "Average", "Grade"]);
    for idx in 0..top.height() {
        table.add_row(vec![
            Cell::new(ids.get(idx).unwrap_or("")),
            Cell::new(names.get(idx).unwrap_or("")),
            numeric_cell(format!("{:.2}", averages.get(idx).unwrap_or(f64::NAN))),
            Cell::new(grades.get(idx).unwrap_or("")),
        ]);
    }

    println!("TOP {DEFAULT_TOP_N} STUDENTS");
    println!("{table}");
    Ok(())
}

fn show_subject_statistics(view: &DataFrame) -> Result<()> {
    let stats = analytics::subject_statistics(view)?;

    for subject in stats {
        println!("\n{}", subject.subject);
        println!("Mean: {:.2}", subject.mean);
        println!("Max: {}", subject.max);
        println!("Min: {}", subject.min);
    }
    Ok(())
}

fn show_overall_statistics(view: &DataFrame) -> Result<()> {
    let stats = analytics::overall_statistics(view)?;

    println!("OVERALL ANALYSIS");
    rule();
    println!("Overall Mean: {:.2}", stats.mean);
    println!("Overall Std Dev: {:.2}", stats.std_dev);
    println!("Highest Mark: {}", stats.max);
    println!("Lowest Mark: {}", stats.min);
    Ok(())
}

fn numeric_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn clear() {
    print!("\x1b[2J\x1b[1;1H");
}

fn rule() {
    println!("{}", "=".repeat(60));
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}

/// Numeric prompt. Malformed input propagates as an error and aborts.
fn prompt_i64(label: &str) -> Result<i64> {
    let raw = prompt(label)?;
    raw.parse()
        .with_context(|| format!("Invalid number: '{raw}'"))
}

fn pause() -> Result<()> {
    prompt("\nPress Enter to continue...")?;
    Ok(())
}

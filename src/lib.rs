//! Student Performance Analytics
//!
//! Roster management and analytics over a flat CSV of student records.
//! The store holds the raw table (ID, Name, Age, four subject scores);
//! Total, Average, and Grade are derived with Polars expressions and
//! recomputed after every mutation rather than persisted.
//!
//! - `data`: CSV-backed roster store (load, save, synthetic seeding, CRUD)
//! - `metrics`: derived-column computation and grade cutoffs
//! - `analytics`: ranking and descriptive statistics
//! - `charts`: terminal chart renderers

pub mod analytics;
pub mod charts;
pub mod data;
pub mod metrics;

// Re-export commonly used types
pub use analytics::{ColumnSummary, OverallStats, SubjectStats};
pub use data::{RosterError, RosterStore};
pub use metrics::{with_derived_columns, GradeScale};

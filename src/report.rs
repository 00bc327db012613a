//! Run summaries.
//!
//! Pure presentation over classification plans and run statistics. Nothing
//! here influences what gets copied where.

use crate::placement::{ClassificationPlan, FileError, RunStatistics, percentage};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One category row: how many files, and their share of all files found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryLine {
    pub category: String,
    pub count: usize,
    pub percentage: f64,
}

fn category_lines(counts: &BTreeMap<String, usize>, total: usize) -> Vec<CategoryLine> {
    counts
        .iter()
        .map(|(category, count)| CategoryLine {
            category: category.clone(),
            count: *count,
            percentage: percentage(*count, total),
        })
        .collect()
}

/// Summary of the classification phase, shown before anything is copied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationSummary {
    pub total_files: usize,
    /// Sorted by category name.
    pub categories: Vec<CategoryLine>,
    pub favorites: usize,
}

impl ClassificationSummary {
    pub fn from_plan(plan: &ClassificationPlan) -> Self {
        Self {
            total_files: plan.total_files(),
            categories: category_lines(plan.category_counts(), plan.total_files()),
            favorites: plan.favorites(),
        }
    }
}

impl fmt::Display for ClassificationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.categories {
            writeln!(
                f,
                "{:<50} {:>5} files ({:>5.1}%)",
                line.category, line.count, line.percentage
            )?;
        }
        write!(f, "Favorites (+++): {} files", self.favorites)
    }
}

/// Final summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_files: usize,
    pub processed: usize,
    pub favorites: usize,
    pub favorites_copied: usize,
    pub categories: Vec<CategoryLine>,
    pub error_count: usize,
    /// The first errors, capped at the preview limit.
    pub error_preview: Vec<FileError>,
    /// Errors left out of the preview.
    pub omitted_errors: usize,
    pub elapsed_seconds: f64,
    pub finished_at: Option<String>,
}

impl RunSummary {
    /// Summarises `stats`, keeping at most `preview_limit` error messages.
    pub fn new(stats: &RunStatistics, preview_limit: usize) -> Self {
        let error_preview: Vec<FileError> =
            stats.errors.iter().take(preview_limit).cloned().collect();
        Self {
            total_files: stats.total_files,
            processed: stats.processed,
            favorites: stats.favorites,
            favorites_copied: stats.favorites_copied,
            categories: category_lines(&stats.category_counts, stats.total_files),
            error_count: stats.errors.len(),
            omitted_errors: stats.errors.len() - error_preview.len(),
            error_preview,
            elapsed_seconds: stats.elapsed.as_secs_f64(),
            finished_at: stats.finished_at.map(|t| t.to_rfc3339()),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total files processed: {}", self.processed)?;
        writeln!(f, "Favorites copied: {}", self.favorites_copied)?;
        writeln!(f, "Errors: {}", self.error_count)?;
        write!(f, "Time elapsed: {:.2} seconds", self.elapsed_seconds)?;

        if self.has_errors() {
            write!(f, "\n\nERRORS:")?;
            for error in &self.error_preview {
                write!(f, "\n  - {}: {}", error.file_name, error.message)?;
            }
            if self.omitted_errors > 0 {
                write!(f, "\n  ... and {} more errors", self.omitted_errors)?;
            }
        }
        Ok(())
    }
}

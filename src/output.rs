//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! section headers, the copy progress bar, and the two report tables.

use crate::placement::{PlacementObserver, PlacementOutcome, percentage};
use crate::report::{ClassificationSummary, RunSummary};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - The copy progress bar
/// - Classification and run summaries
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tunesort::output::OutputFormatter;
    /// OutputFormatter::success("Copied 120 files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tunesort::output::OutputFormatter;
    /// OutputFormatter::error("Source directory not found");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tunesort::output::OutputFormatter;
    /// OutputFormatter::warning("No audio files found!");
    /// ```
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tunesort::output::OutputFormatter;
    /// OutputFormatter::info("Scanning for audio files...");
    /// ```
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    ///
    /// # Arguments
    ///
    /// * `header` - The header text, printed bold above a rule line
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tunesort::output::OutputFormatter;
    /// OutputFormatter::header("CLASSIFICATION SUMMARY");
    /// ```
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
        println!("{}", "-".repeat(70));
    }

    /// Prints a full-width banner line.
    ///
    /// # Arguments
    ///
    /// * `title` - The title printed between two `=` rules
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tunesort::output::OutputFormatter;
    /// OutputFormatter::banner("SORTING COMPLETE");
    /// ```
    pub fn banner(title: &str) {
        println!("{}", "=".repeat(70));
        println!("{}", title.bold());
        println!("{}", "=".repeat(70));
    }

    /// Creates and returns a progress bar for the copy phase.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of files the bar counts up to
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tunesort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints the per-category breakdown computed before copying.
    ///
    /// One line per category, sorted by name, with the file count and its
    /// share of all files found, followed by the favorites count.
    ///
    /// # Arguments
    ///
    /// * `summary` - The classification summary to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tunesort::output::OutputFormatter;
    /// use tunesort::placement::{FileEntry, PlacementPipeline};
    /// use tunesort::report::ClassificationSummary;
    ///
    /// let files: Vec<FileEntry> = ["Techno Night.wav", "+++Pop Anthem.wav"]
    ///     .into_iter()
    ///     .filter_map(FileEntry::from_path)
    ///     .collect();
    /// let plan = PlacementPipeline::default().classify_all(&files);
    /// OutputFormatter::classification_summary(&ClassificationSummary::from_plan(&plan));
    /// ```
    pub fn classification_summary(summary: &ClassificationSummary) {
        Self::header("CLASSIFICATION SUMMARY");
        for line in &summary.categories {
            println!(
                "{:<50} {:>5} files ({:>5.1}%)",
                line.category, line.count, line.percentage
            );
        }
        println!(
            "\n{} {} files",
            "Favorites (+++):".yellow(),
            summary.favorites
        );
    }

    /// Prints the final run summary, including the error preview.
    ///
    /// Errors beyond the preview are reported as a count only.
    ///
    /// # Arguments
    ///
    /// * `summary` - The run summary to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use tunesort::output::OutputFormatter;
    /// use tunesort::placement::PlacementPipeline;
    /// use tunesort::report::RunSummary;
    ///
    /// let stats = PlacementPipeline::default().run(&[], Path::new("/music/SORTED_MUSIC"));
    /// OutputFormatter::run_summary(&RunSummary::new(&stats, 10));
    /// ```
    pub fn run_summary(summary: &RunSummary) {
        println!("Total files processed: {}", summary.processed.to_string().green());
        println!("Favorites copied: {}", summary.favorites_copied);
        let errors = summary.error_count.to_string();
        println!(
            "Errors: {}",
            if summary.has_errors() { errors.red() } else { errors.normal() }
        );
        println!("Time elapsed: {:.2} seconds", summary.elapsed_seconds);

        if summary.has_errors() {
            println!();
            Self::warning("ERRORS:");
            for error in &summary.error_preview {
                println!("  - {}: {}", error.file_name, error.message);
            }
            if summary.omitted_errors > 0 {
                println!("  ... and {} more errors", summary.omitted_errors);
            }
        }
    }
}

/// Drives a progress bar from pipeline events.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    /// Creates an observer with a bar sized for `total` files.
    pub fn new(total: usize) -> Self {
        Self {
            bar: OutputFormatter::create_progress_bar(total as u64),
        }
    }

    /// Removes the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PlacementObserver for ProgressObserver {
    fn on_outcome(&mut self, outcome: &PlacementOutcome) {
        if !outcome.succeeded {
            self.bar.println(format!(
                "{} {}: {}",
                "✗".red(),
                outcome.source.name,
                outcome.error_message.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    fn on_batch_complete(&mut self, handled: usize, total: usize) {
        self.bar.set_position(handled as u64);
        self.bar
            .set_message(format!("{:.1}%", percentage(handled, total)));
    }
}

//! Command-line orchestration for tunesort.
//!
//! This module ties the pieces together for one invocation:
//! - Configuration loading
//! - Scanning the source tree
//! - Classification and the summary shown before copying
//! - The copy phase with progress reporting
//! - The final report

use crate::config::{CompiledConfig, ConfigError, SortConfig};
use crate::output::{OutputFormatter, ProgressObserver};
use crate::placement::{FileEntry, NoopObserver, PlacementPipeline, RunStatistics};
use crate::report::{ClassificationSummary, RunSummary};
use crate::scanner::ScanError;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

/// Errors that abort a run before any file is copied.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Error scanning source: {0}")]
    Scan(#[from] ScanError),
    #[error("Error writing JSON report: {0}")]
    Json(#[from] serde_json::Error),
}

/// One sorting invocation.
#[derive(Debug, Clone, Default)]
pub struct SortRequest {
    /// Directory to scan.
    pub source: PathBuf,
    /// Output root; defaults to `<source>/<output_folder>`.
    pub output: Option<PathBuf>,
    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
    /// Classify and report without copying anything.
    pub dry_run: bool,
    /// Print the final summary as JSON instead of text.
    pub json: bool,
    /// Skip banners and the progress bar.
    pub quiet: bool,
}

impl SortRequest {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// The output root this request writes to.
    pub fn output_root(&self, config: &CompiledConfig) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.source.join(&config.output_folder))
    }

    fn decorated(&self) -> bool {
        !self.quiet && !self.json
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum SortOutcome {
    /// The scan found nothing to sort.
    NoFiles,
    /// Classification only; nothing was written.
    DryRun(ClassificationSummary),
    /// Files were copied. Per-file errors are inside the statistics.
    Completed(RunStatistics),
}

/// Runs a sort, loading configuration from the request or the usual locations.
///
/// # Examples
///
/// ```no_run
/// use tunesort::cli::{SortOutcome, SortRequest, run_sort};
///
/// match run_sort(&SortRequest::new("/music/unsorted")) {
///     Ok(SortOutcome::Completed(stats)) => println!("{} errors", stats.error_count()),
///     Ok(_) => {}
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn run_sort(request: &SortRequest) -> Result<SortOutcome, SortError> {
    let config = SortConfig::load(request.config_path.as_deref())?.compile()?;
    run_sort_with_config(request, &config)
}

/// Runs a sort with an already compiled configuration.
pub fn run_sort_with_config(
    request: &SortRequest,
    config: &CompiledConfig,
) -> Result<SortOutcome, SortError> {
    let output_root = request.output_root(config);

    if request.decorated() {
        OutputFormatter::banner(if request.dry_run {
            "TUNESORT - DRY RUN"
        } else {
            "TUNESORT"
        });
        println!("Source Directory: {}", request.source.display());
        println!("Output Directory: {}", output_root.display());
        println!();
    }

    let started = Instant::now();
    let files = scan(request, config, &output_root)?;
    info!(files = files.len(), source = %request.source.display(), "scan complete");

    if files.is_empty() {
        if request.json {
            println!("{}", serde_json::to_string_pretty(&json!({ "total_files": 0 }))?);
        } else {
            OutputFormatter::warning("No audio files found!");
        }
        return Ok(SortOutcome::NoFiles);
    }
    if request.decorated() {
        OutputFormatter::success(&format!("Found {} audio files", files.len()));
    }

    let pipeline = PlacementPipeline::new(config.rules.clone(), config.placement_options());
    let plan = pipeline.classify_all_since(&files, started);
    let classification = ClassificationSummary::from_plan(&plan);

    if request.dry_run {
        if request.json {
            println!("{}", serde_json::to_string_pretty(&classification)?);
        } else {
            OutputFormatter::classification_summary(&classification);
            println!();
            OutputFormatter::success("Dry run complete. No files were copied.");
        }
        return Ok(SortOutcome::DryRun(classification));
    }

    if !request.json {
        OutputFormatter::classification_summary(&classification);
    }

    let stats = if request.decorated() {
        OutputFormatter::header("Copying files...");
        let mut progress = ProgressObserver::new(plan.total_files());
        let stats = pipeline.execute(&plan, &output_root, &mut progress);
        progress.finish();
        stats
    } else {
        pipeline.execute(&plan, &output_root, &mut NoopObserver)
    };

    let summary = RunSummary::new(&stats, config.error_preview_limit);
    if request.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!();
        OutputFormatter::banner("SORTING COMPLETE");
        OutputFormatter::run_summary(&summary);
        println!("Output location: {}", output_root.display());
    }

    Ok(SortOutcome::Completed(stats))
}

/// Scans the source, leaving out previous output.
fn scan(
    request: &SortRequest,
    config: &CompiledConfig,
    output_root: &Path,
) -> Result<Vec<FileEntry>, ScanError> {
    let mut scanner = config.scanner();
    if output_root.starts_with(&request.source) {
        scanner = scanner.exclude_path(output_root);
    }

    if request.decorated() {
        OutputFormatter::info("Scanning for audio files...");
    }
    let paths = scanner.scan(&request.source)?;
    Ok(paths.into_iter().filter_map(FileEntry::from_path).collect())
}

//! Classification and placement pipeline.
//!
//! A run has two phases. [`PlacementPipeline::classify_all`] classifies every
//! discovered file up front without touching the filesystem, producing a
//! [`ClassificationPlan`] whose counts can be reported before anything is
//! written. [`PlacementPipeline::execute`] then copies each file, in input
//! order, into `output_root/<category>/`, plus a second copy into
//! `<category>/_FAVORITES/` for favorites. Every copy gets its own collision
//! resolution, so existing files are never overwritten.
//!
//! A failure while placing one file is recorded and the run moves on to the
//! next file. Source files are only ever read.

use crate::favorites::{FAVORITES_SUBFOLDER, is_favorite};
use crate::rules::RuleTable;
use crate::versioning::resolve_collision;
use chrono::{DateTime, Utc};
use filetime::FileTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Number of files handled between progress notifications.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// A discovered source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Full path to the source file.
    pub path: PathBuf,
    /// Base filename, used for classification and favorite detection.
    pub name: String,
}

impl FileEntry {
    /// Builds an entry from a path. Returns `None` for paths without a file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self { path, name })
    }

    pub fn is_favorite(&self) -> bool {
        is_favorite(&self.name)
    }
}

/// The category chosen for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub source: FileEntry,
    pub category: String,
    /// Winning rule, `None` when the fallback category was used.
    pub rule: Option<String>,
}

/// Output of the classification phase.
///
/// Built once and never changed afterwards.
#[derive(Debug, Clone)]
pub struct ClassificationPlan {
    results: Vec<ClassificationResult>,
    category_counts: BTreeMap<String, usize>,
    favorites: usize,
    started: Instant,
}

impl ClassificationPlan {
    pub fn results(&self) -> &[ClassificationResult] {
        &self.results
    }

    /// Files per category, sorted by category name.
    pub fn category_counts(&self) -> &BTreeMap<String, usize> {
        &self.category_counts
    }

    pub fn favorites(&self) -> usize {
        self.favorites
    }

    pub fn total_files(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Which copy of a file an outcome describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyKind {
    /// The copy into the category folder.
    Primary,
    /// The extra copy into the category's favorites subfolder.
    Favorite,
}

/// Result of one attempted copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementOutcome {
    pub source: FileEntry,
    pub kind: CopyKind,
    /// Final destination. For a failed copy this is the file written, if any,
    /// and otherwise the intended folder.
    pub destination: PathBuf,
    pub succeeded: bool,
    pub error_message: Option<String>,
}

/// A file that could not be fully placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub file_name: String,
    pub message: String,
}

/// Errors raised while placing a single file.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The destination folder could not be created.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Copying the file content failed.
    #[error("Failed to copy {} to {}: {source}", from.display(), to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The copy was written to `path` but its timestamps could not be set.
    #[error("Failed to preserve timestamps on {}: {source}", path.display())]
    TimestampsFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The source path has no file name component.
    #[error("{} has no file name", .0.display())]
    MissingFileName(PathBuf),
}

impl PlacementError {
    /// The file left on disk by a copy that failed after writing its content.
    pub fn written_path(&self) -> Option<&Path> {
        match self {
            PlacementError::TimestampsFailed { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Aggregate results of a run.
///
/// Category counts come from classification; the remaining counters are
/// accumulated as copies are attempted.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatistics {
    pub category_counts: BTreeMap<String, usize>,
    pub total_files: usize,
    /// Favorites found during classification.
    pub favorites: usize,
    /// Favorite copies actually written.
    pub favorites_copied: usize,
    /// Files whose every applicable copy succeeded.
    pub processed: usize,
    pub errors: Vec<FileError>,
    pub outcomes: Vec<PlacementOutcome>,
    #[serde(serialize_with = "serialize_seconds")]
    pub elapsed: Duration,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunStatistics {
    fn from_plan(plan: &ClassificationPlan) -> Self {
        Self {
            category_counts: plan.category_counts.clone(),
            total_files: plan.total_files(),
            favorites: plan.favorites,
            favorites_copied: 0,
            processed: 0,
            errors: Vec::new(),
            outcomes: Vec::new(),
            elapsed: Duration::ZERO,
            finished_at: None,
        }
    }

    /// Folds the outcomes of one file into the totals.
    fn record_file(&mut self, outcomes: Vec<PlacementOutcome>) {
        let failure = outcomes.iter().find(|o| !o.succeeded);
        match failure {
            Some(failed) => self.errors.push(FileError {
                file_name: failed.source.name.clone(),
                message: failed.error_message.clone().unwrap_or_default(),
            }),
            None => self.processed += 1,
        }
        self.favorites_copied += outcomes
            .iter()
            .filter(|o| o.kind == CopyKind::Favorite && o.succeeded)
            .count();
        self.outcomes.extend(outcomes);
    }

    fn finish(&mut self, started: Instant) {
        self.elapsed = started.elapsed();
        self.finished_at = Some(Utc::now());
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Share of all discovered files that landed in `category`, in percent.
    pub fn percentage(&self, category: &str) -> f64 {
        percentage(
            self.category_counts.get(category).copied().unwrap_or(0),
            self.total_files,
        )
    }
}

fn serialize_seconds<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

pub(crate) fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Receives progress while a plan is executed.
///
/// All methods default to doing nothing.
pub trait PlacementObserver {
    /// Called after every attempted copy.
    fn on_outcome(&mut self, _outcome: &PlacementOutcome) {}

    /// Called after each batch with the number of files handled so far.
    fn on_batch_complete(&mut self, _handled: usize, _total: usize) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PlacementObserver for NoopObserver {}

/// Tunables for a placement run.
#[derive(Debug, Clone)]
pub struct PlacementOptions {
    /// Files per progress batch. Does not affect which files are written.
    pub batch_size: usize,
    pub favorites_subfolder: String,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            favorites_subfolder: FAVORITES_SUBFOLDER.to_string(),
        }
    }
}

/// Classifies files and copies them into the category tree.
#[derive(Debug, Clone)]
pub struct PlacementPipeline {
    rules: RuleTable,
    options: PlacementOptions,
}

impl PlacementPipeline {
    pub fn new(rules: RuleTable, options: PlacementOptions) -> Self {
        Self { rules, options }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Classifies and places `files` under `output_root`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use tunesort::placement::{FileEntry, PlacementPipeline};
    ///
    /// let files: Vec<FileEntry> = ["/music/Techno Night.wav"]
    ///     .into_iter()
    ///     .filter_map(FileEntry::from_path)
    ///     .collect();
    /// let stats = PlacementPipeline::default().run(&files, Path::new("/music/SORTED_MUSIC"));
    /// println!("{} placed, {} errors", stats.processed, stats.error_count());
    /// ```
    pub fn run(&self, files: &[FileEntry], output_root: &Path) -> RunStatistics {
        let plan = self.classify_all(files);
        self.execute(&plan, output_root, &mut NoopObserver)
    }

    /// Classifies every file without touching the filesystem.
    ///
    /// The run's elapsed time is measured from this call.
    pub fn classify_all(&self, files: &[FileEntry]) -> ClassificationPlan {
        self.classify_all_since(files, Instant::now())
    }

    /// Like [`classify_all`](Self::classify_all), with the run's elapsed time
    /// measured from `started`, usually the start of the scan.
    pub fn classify_all_since(&self, files: &[FileEntry], started: Instant) -> ClassificationPlan {
        let mut category_counts = BTreeMap::new();
        let mut favorites = 0;

        let results = files
            .iter()
            .map(|file| {
                let classification = self.rules.classify(&file.name);
                debug!(
                    file = %file.name,
                    category = classification.category,
                    rule = classification.rule.unwrap_or("fallback"),
                    "classified"
                );
                *category_counts
                    .entry(classification.category.to_string())
                    .or_insert(0) += 1;
                if file.is_favorite() {
                    favorites += 1;
                }
                ClassificationResult {
                    source: file.clone(),
                    category: classification.category.to_string(),
                    rule: classification.rule.map(str::to_string),
                }
            })
            .collect::<Vec<_>>();

        info!(
            files = results.len(),
            categories = category_counts.len(),
            favorites,
            "classification complete"
        );

        ClassificationPlan {
            results,
            category_counts,
            favorites,
            started,
        }
    }

    /// Copies every classified file into `output_root`, in plan order.
    pub fn execute(
        &self,
        plan: &ClassificationPlan,
        output_root: &Path,
        observer: &mut dyn PlacementObserver,
    ) -> RunStatistics {
        let mut stats = RunStatistics::from_plan(plan);
        let total = plan.total_files();
        let mut handled = 0;

        info!(output = %output_root.display(), files = total, "copying files");

        for batch in plan.results.chunks(self.options.batch_size.max(1)) {
            for result in batch {
                let outcomes = self.place(result, output_root, observer);
                stats.record_file(outcomes);
                handled += 1;
            }
            observer.on_batch_complete(handled, total);
        }

        stats.finish(plan.started);
        info!(
            processed = stats.processed,
            errors = stats.error_count(),
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "placement finished"
        );
        stats
    }

    /// Places one file: the category copy, then the favorites copy if the
    /// first one worked.
    fn place(
        &self,
        result: &ClassificationResult,
        output_root: &Path,
        observer: &mut dyn PlacementObserver,
    ) -> Vec<PlacementOutcome> {
        let category_dir = output_root.join(&result.category);
        let mut outcomes = Vec::with_capacity(2);

        let primary = self.attempt(&result.source, &category_dir, CopyKind::Primary);
        observer.on_outcome(&primary);
        let primary_ok = primary.succeeded;
        outcomes.push(primary);

        if primary_ok && result.source.is_favorite() {
            let favorites_dir = category_dir.join(&self.options.favorites_subfolder);
            let favorite = self.attempt(&result.source, &favorites_dir, CopyKind::Favorite);
            observer.on_outcome(&favorite);
            outcomes.push(favorite);
        }

        outcomes
    }

    fn attempt(&self, source: &FileEntry, folder: &Path, kind: CopyKind) -> PlacementOutcome {
        outcome_for(source, folder, kind, copy_into_folder(&source.path, folder))
    }
}

fn outcome_for(
    source: &FileEntry,
    folder: &Path,
    kind: CopyKind,
    result: Result<PathBuf, PlacementError>,
) -> PlacementOutcome {
    match result {
        Ok(destination) => {
            debug!(
                file = %source.name,
                destination = %destination.display(),
                ?kind,
                "copied"
            );
            PlacementOutcome {
                source: source.clone(),
                kind,
                destination,
                succeeded: true,
                error_message: None,
            }
        }
        Err(e) => {
            debug!(file = %source.name, ?kind, "copy failed: {}", e);
            PlacementOutcome {
                source: source.clone(),
                kind,
                destination: e
                    .written_path()
                    .map_or_else(|| folder.to_path_buf(), Path::to_path_buf),
                succeeded: false,
                error_message: Some(e.to_string()),
            }
        }
    }
}

impl Default for PlacementPipeline {
    fn default() -> Self {
        Self::new(RuleTable::default(), PlacementOptions::default())
    }
}

/// Copies `source` into `folder` under a collision-free name and returns the
/// path written. The folder is created if needed.
pub fn copy_into_folder(source: &Path, folder: &Path) -> Result<PathBuf, PlacementError> {
    fs::create_dir_all(folder).map_err(|e| PlacementError::DirectoryCreationFailed {
        path: folder.to_path_buf(),
        source: e,
    })?;

    let file_name = source
        .file_name()
        .ok_or_else(|| PlacementError::MissingFileName(source.to_path_buf()))?;
    let destination = resolve_collision(&folder.join(file_name));

    copy_with_metadata(source, &destination)?;
    Ok(destination)
}

/// Copies content and permissions, then access and modification times.
pub fn copy_with_metadata(source: &Path, destination: &Path) -> Result<(), PlacementError> {
    fs::copy(source, destination).map_err(|e| PlacementError::CopyFailed {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: e,
    })?;

    let metadata = fs::metadata(source).map_err(|e| PlacementError::TimestampsFailed {
        path: destination.to_path_buf(),
        source: e,
    })?;
    let accessed = FileTime::from_last_access_time(&metadata);
    let modified = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(destination, accessed, modified).map_err(|e| {
        PlacementError::TimestampsFailed {
            path: destination.to_path_buf(),
            source: e,
        }
    })
}

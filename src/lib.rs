//! tunesort - sort audio files into a genre folder tree
//!
//! This library classifies audio files by keywords in their names, copies them
//! into category folders without ever overwriting existing files, duplicates
//! favorites into a dedicated subfolder, and reports what happened.

pub mod cli;
pub mod config;
pub mod favorites;
pub mod output;
pub mod placement;
pub mod report;
pub mod rules;
pub mod scanner;
pub mod versioning;

pub use config::{CompiledConfig, ConfigError, SortConfig};
pub use favorites::is_favorite;
pub use placement::{
    FileEntry, PlacementOutcome, PlacementPipeline, RunStatistics, copy_with_metadata,
};
pub use report::{ClassificationSummary, RunSummary};
pub use rules::{Classification, ClassificationRule, FALLBACK_CATEGORY, RuleTable};
pub use scanner::{AudioScanner, ScanError};
pub use versioning::resolve_collision;

pub use cli::{SortError, SortOutcome, SortRequest, run_sort};

//! Sorting configuration.
//!
//! This module loads optional settings from a TOML file and compiles them into
//! the structures the pipeline runs on. Every setting has a built-in default,
//! so a missing configuration file is never an error.
//!
//! # Configuration File Format
//!
//! ```toml
//! [sort]
//! output_folder = "SORTED_MUSIC"
//! extensions = ["wav"]
//! fallback_category = "99_Uncategorized/Other"
//! batch_size = 50
//! error_preview_limit = 10
//!
//! # Optional. When present, replaces the built-in genre rules.
//! [[rules]]
//! name = "stems_vocals"
//! category = "06_Stems_Production/Vocals"
//! priority = 1
//! patterns = ['\(vocals?\)']
//! ```

use crate::placement::{DEFAULT_BATCH_SIZE, PlacementOptions};
use crate::rules::{FALLBACK_CATEGORY, RuleError, RuleSpec, RuleTable};
use crate::scanner::{AudioScanner, DEFAULT_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Folder created under the source directory when no output is given.
pub const DEFAULT_OUTPUT_FOLDER: &str = "SORTED_MUSIC";

/// Number of individual errors shown in the final report.
pub const DEFAULT_ERROR_PREVIEW_LIMIT: usize = 10;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".tunesortrc.toml";

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// A rule could not be compiled.
    #[error("Invalid rule: {0}")]
    InvalidRule(#[from] RuleError),
    /// An option has a value outside its allowed range.
    #[error("Invalid value for '{option}': {reason}")]
    InvalidOption { option: &'static str, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortConfig {
    #[serde(default)]
    pub sort: SortOptions,

    /// Custom rule table. Empty means the built-in rules.
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// The `[sort]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SortOptions {
    /// Output folder name under the source directory; also never scanned.
    pub output_folder: String,
    /// File extensions to pick up, without the dot.
    pub extensions: Vec<String>,
    pub fallback_category: String,
    pub batch_size: usize,
    pub error_preview_limit: usize,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            output_folder: DEFAULT_OUTPUT_FOLDER.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            fallback_category: FALLBACK_CATEGORY.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            error_preview_limit: DEFAULT_ERROR_PREVIEW_LIMIT,
        }
    }
}

impl SortConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.tunesortrc.toml` in the current directory
    /// 3. Look for `~/.config/tunesort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if a discovered file is malformed.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Explicit configuration file, from `--config`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tunesort::config::SortConfig;
    /// let config = SortConfig::load(None).expect("Failed to load configuration");
    /// println!("Sorting into {}", config.sort.output_folder);
    /// ```
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("tunesort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        debug!(path = %path.display(), "loading configuration");
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// Missing tables and keys take their default values.
    ///
    /// # Example
    ///
    /// ```
    /// use tunesort::config::SortConfig;
    /// let config = SortConfig::from_toml("[sort]\nbatch_size = 10\n").unwrap();
    /// assert_eq!(config.sort.batch_size, 10);
    /// assert_eq!(config.sort.output_folder, "SORTED_MUSIC");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Validate the configuration and compile its rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any rule is invalid or an option is out of range.
    ///
    /// # Example
    ///
    /// ```
    /// use tunesort::config::SortConfig;
    /// let compiled = SortConfig::default().compile().unwrap();
    /// assert_eq!(
    ///     compiled.rules.category_for("Techno Night.wav"),
    ///     "01_Electronic_Dance/Techno"
    /// );
    /// ```
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        CompiledConfig::new(self)
    }
}

/// Validated configuration, ready to drive a run.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub rules: RuleTable,
    pub output_folder: String,
    pub extensions: Vec<String>,
    pub batch_size: usize,
    pub error_preview_limit: usize,
}

impl CompiledConfig {
    fn new(config: SortConfig) -> Result<Self, ConfigError> {
        let options = config.sort;

        if options.batch_size == 0 {
            return Err(ConfigError::InvalidOption {
                option: "batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if options.extensions.is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "extensions",
                reason: "at least one extension is required".to_string(),
            });
        }
        let output_folder = options.output_folder.trim();
        if output_folder.is_empty() || output_folder.contains(['/', '\\']) {
            return Err(ConfigError::InvalidOption {
                option: "output_folder",
                reason: "must be a single folder name".to_string(),
            });
        }

        let specs = if config.rules.is_empty() {
            RuleTable::builtin_specs()
        } else {
            config.rules
        };
        let rules = RuleTable::new(&specs)?.with_fallback_category(&options.fallback_category)?;

        Ok(Self {
            rules,
            output_folder: output_folder.to_string(),
            extensions: options.extensions,
            batch_size: options.batch_size,
            error_preview_limit: options.error_preview_limit,
        })
    }

    /// Scanner for this configuration, skipping the output folder name.
    pub fn scanner(&self) -> AudioScanner {
        AudioScanner::new(&self.extensions).exclude_folder_name(self.output_folder.clone())
    }

    /// Pipeline options carrying the configured batch size.
    pub fn placement_options(&self) -> PlacementOptions {
        PlacementOptions {
            batch_size: self.batch_size,
            ..Default::default()
        }
    }
}

impl Default for CompiledConfig {
    fn default() -> Self {
        Self {
            rules: RuleTable::default(),
            output_folder: DEFAULT_OUTPUT_FOLDER.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            batch_size: DEFAULT_BATCH_SIZE,
            error_preview_limit: DEFAULT_ERROR_PREVIEW_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_uses_builtin_rules() {
        let compiled = SortConfig::default().compile().unwrap();
        assert_eq!(
            compiled.rules.rules().len(),
            RuleTable::builtin_specs().len()
        );
        assert_eq!(compiled.output_folder, "SORTED_MUSIC");
        assert_eq!(compiled.batch_size, 50);
        assert_eq!(compiled.error_preview_limit, 10);
    }

    #[test]
    fn test_partial_sort_table_keeps_other_defaults() {
        let config = SortConfig::from_toml("[sort]\nbatch_size = 5\n").unwrap();
        let compiled = config.compile().unwrap();
        assert_eq!(compiled.batch_size, 5);
        assert_eq!(compiled.extensions, vec!["wav".to_string()]);
        assert_eq!(compiled.rules.fallback_category(), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_custom_rules_replace_builtin_table() {
        let config = SortConfig::from_toml(
            r#"
            [sort]
            fallback_category = "Misc"

            [[rules]]
            name = "lofi"
            category = "Chill/LoFi"
            priority = 3
            patterns = ['\blo-?fi\b']

            [[rules]]
            name = "drafts"
            category = "Drafts"
            priority = 1
            patterns = ['\bdraft\b']
            "#,
        )
        .unwrap();
        let compiled = config.compile().unwrap();

        assert_eq!(compiled.rules.rules().len(), 2);
        assert_eq!(compiled.rules.category_for("LoFi Draft.wav"), "Drafts");
        assert_eq!(compiled.rules.category_for("Lo-Fi Beat.wav"), "Chill/LoFi");
        assert_eq!(compiled.rules.category_for("Techno.wav"), "Misc");
    }

    #[test]
    fn test_invalid_rule_pattern_returns_error() {
        let config = SortConfig::from_toml(
            r#"
            [[rules]]
            name = "broken"
            category = "Broken"
            priority = 1
            patterns = ['[invalid(']
            "#,
        )
        .unwrap();

        let result = config.compile();
        assert!(matches!(result, Err(ConfigError::InvalidRule(_))));
    }

    #[test]
    fn test_rule_without_patterns_returns_error() {
        let config = SortConfig::from_toml(
            r#"
            [[rules]]
            name = "empty"
            category = "Empty"
            priority = 1
            patterns = []
            "#,
        )
        .unwrap();

        assert!(config.compile().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = SortConfig::from_toml("[sort]\nbatch_size = 0\n").unwrap();
        assert!(matches!(
            config.compile(),
            Err(ConfigError::InvalidOption {
                option: "batch_size",
                ..
            })
        ));
    }

    #[test]
    fn test_nested_output_folder_rejected() {
        let config = SortConfig::from_toml("[sort]\noutput_folder = \"a/b\"\n").unwrap();
        assert!(config.compile().is_err());
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = SortConfig::from_toml("[sort\nbatch_size = ");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_explicit_missing_file_returns_error() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let result = SortConfig::load(Some(&temp.path().join("missing.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().join("tunesort.toml");
        fs::write(&path, "[sort]\nextensions = [\"wav\", \"flac\"]\n").unwrap();

        let config = SortConfig::load(Some(&path)).unwrap();
        assert_eq!(config.sort.extensions, vec!["wav", "flac"]);

        let compiled = config.compile().unwrap();
        assert!(compiled.scanner().is_audio_file(Path::new("x.FLAC")));
    }
}

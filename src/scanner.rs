//! Recursive discovery of audio files.
//!
//! The scanner walks a source tree and returns every regular file whose
//! extension is in the configured set, skipping excluded folders so an
//! earlier run's output is never sorted again.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Extensions picked up when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["wav"];

/// Errors that stop a scan before anything is classified.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The source directory does not exist.
    #[error("source directory not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The source path exists but is not a directory.
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    /// The source directory itself could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Finds audio files below a root directory.
#[derive(Debug, Clone)]
pub struct AudioScanner {
    extensions: HashSet<String>,
    excluded_names: HashSet<String>,
    excluded_paths: Vec<PathBuf>,
}

impl Default for AudioScanner {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().copied())
    }
}

impl AudioScanner {
    /// Creates a scanner for the given extensions (matched case-insensitively,
    /// with or without a leading dot).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
            excluded_names: HashSet::new(),
            excluded_paths: Vec::new(),
        }
    }

    /// Skips every directory with this name, at any depth.
    pub fn exclude_folder_name(mut self, name: impl Into<String>) -> Self {
        self.excluded_names.insert(name.into());
        self
    }

    /// Skips one specific directory.
    pub fn exclude_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded_paths.push(path.into());
        self
    }

    /// Returns true if `path` has one of the scanned extensions.
    pub fn is_audio_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Scans `root` recursively.
    ///
    /// Files come back sorted by path within each directory, so repeated scans
    /// of the same tree yield the same order.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root.exists() {
            return Err(ScanError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(ScanError::Unreadable {
                        path: root.to_path_buf(),
                        source: e,
                    });
                }
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if is_regular_file(&entry) && self.is_audio_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        debug!(root = %root.display(), count = files.len(), "scan finished");
        Ok(files)
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let by_name = entry
            .file_name()
            .to_str()
            .is_some_and(|name| self.excluded_names.contains(name));
        by_name || self.excluded_paths.iter().any(|p| p == entry.path())
    }
}

/// Regular files, and symlinks that resolve to one. Directory links are
/// never followed.
fn is_regular_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_audio_file_case_insensitive() {
        let scanner = AudioScanner::default();
        assert!(scanner.is_audio_file(Path::new("song.wav")));
        assert!(scanner.is_audio_file(Path::new("SONG.WAV")));
        assert!(!scanner.is_audio_file(Path::new("song.mp3")));
        assert!(!scanner.is_audio_file(Path::new("wav")));
    }

    #[test]
    fn test_custom_extensions_accept_leading_dot() {
        let scanner = AudioScanner::new([".FLAC", "wav"]);
        assert!(scanner.is_audio_file(Path::new("a.flac")));
        assert!(scanner.is_audio_file(Path::new("a.wav")));
        assert!(!scanner.is_audio_file(Path::new("a.mp3")));
    }

    #[test]
    fn test_scan_recurses_and_filters() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let base = temp.path();
        fs::write(base.join("b.wav"), b"b").unwrap();
        fs::write(base.join("a.wav"), b"a").unwrap();
        fs::write(base.join("notes.txt"), b"text").unwrap();
        fs::create_dir_all(base.join("sub/deeper")).unwrap();
        fs::write(base.join("sub/deeper/c.WAV"), b"c").unwrap();

        let files = AudioScanner::default().scan(base).unwrap();

        assert_eq!(
            files,
            vec![
                base.join("a.wav"),
                base.join("b.wav"),
                base.join("sub/deeper/c.WAV"),
            ]
        );
    }

    #[test]
    fn test_excluded_folder_names_are_pruned_at_any_depth() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let base = temp.path();
        fs::create_dir_all(base.join("SORTED_MUSIC/Pop")).unwrap();
        fs::create_dir_all(base.join("inner/SORTED_MUSIC")).unwrap();
        fs::write(base.join("SORTED_MUSIC/Pop/old.wav"), b"x").unwrap();
        fs::write(base.join("inner/SORTED_MUSIC/old.wav"), b"x").unwrap();
        fs::write(base.join("inner/new.wav"), b"x").unwrap();

        let files = AudioScanner::default()
            .exclude_folder_name("SORTED_MUSIC")
            .scan(base)
            .unwrap();

        assert_eq!(files, vec![base.join("inner/new.wav")]);
    }

    #[test]
    fn test_excluded_path_is_pruned() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let base = temp.path();
        fs::create_dir_all(base.join("out")).unwrap();
        fs::write(base.join("out/old.wav"), b"x").unwrap();
        fs::write(base.join("new.wav"), b"x").unwrap();

        let files = AudioScanner::default()
            .exclude_path(base.join("out"))
            .scan(base)
            .unwrap();

        assert_eq!(files, vec![base.join("new.wav")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_is_scanned() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let base = temp.path();
        let library = base.join("library");
        let src = base.join("src");
        fs::create_dir_all(&library).unwrap();
        fs::create_dir_all(&src).unwrap();
        fs::write(library.join("real.wav"), b"x").unwrap();
        std::os::unix::fs::symlink(library.join("real.wav"), src.join("Techno Night.wav"))
            .unwrap();

        let files = AudioScanner::default().scan(&src).unwrap();

        assert_eq!(files, vec![src.join("Techno Night.wav")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_not_followed() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let base = temp.path();
        let library = base.join("library");
        let src = base.join("src");
        fs::create_dir_all(&library).unwrap();
        fs::create_dir_all(&src).unwrap();
        fs::write(library.join("inside.wav"), b"x").unwrap();
        std::os::unix::fs::symlink(&library, src.join("linked")).unwrap();

        let files = AudioScanner::default().scan(&src).unwrap();

        assert!(files.is_empty());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let result = AudioScanner::default().scan(&temp.path().join("missing"));
        assert!(matches!(result, Err(ScanError::NotFound(_))));
    }

    #[test]
    fn test_file_root_is_an_error() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let file = temp.path().join("song.wav");
        fs::write(&file, b"x").unwrap();

        let result = AudioScanner::default().scan(&file);
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }
}

//! Collision-free destination names.
//!
//! When a destination file already exists, a version marker is inserted
//! between the stem and the extension: `Track.wav`, `Track v2.wav`,
//! `Track v3.wav`, and so on. Existing files are never overwritten.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// First counter tried when the desired path is taken.
pub const FIRST_VERSION: u32 = 2;

/// Builds the versioned sibling of `path` for `counter`.
///
/// `dir/Track.wav` becomes `dir/Track v{counter}.wav`; a name without an
/// extension simply gains the suffix.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use tunesort::versioning::versioned_name;
///
/// assert_eq!(
///     versioned_name(Path::new("out/Track.wav"), 2),
///     PathBuf::from("out/Track v2.wav")
/// );
/// ```
pub fn versioned_name(path: &Path, counter: u32) -> PathBuf {
    let mut name = OsString::new();
    if let Some(stem) = path.file_stem() {
        name.push(stem);
    }
    name.push(format!(" v{}", counter));
    if let Some(extension) = path.extension() {
        name.push(".");
        name.push(extension);
    }
    path.with_file_name(name)
}

/// Returns `desired` if nothing exists there, otherwise the first free
/// versioned sibling starting at ` v2`.
///
/// This is a check-then-act resolution: the returned path was free when it
/// was checked. Callers writing into the same folder from several threads
/// must hold a per-folder lock across resolution and the write, or create
/// the file exclusively and retry on conflict.
pub fn resolve_collision(desired: &Path) -> PathBuf {
    if !path_taken(desired) {
        return desired.to_path_buf();
    }

    let mut counter = FIRST_VERSION;
    loop {
        let candidate = versioned_name(desired, counter);
        if !path_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Dangling symlinks count as taken so they are never written through.
fn path_taken(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

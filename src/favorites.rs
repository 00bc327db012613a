//! Favorite detection.
//!
//! A favorite is any file whose name starts with [`FAVORITE_MARKER`]. Favorites
//! are copied twice: once into their category folder and once more into that
//! category's [`FAVORITES_SUBFOLDER`].

/// Filename prefix that marks a favorite.
pub const FAVORITE_MARKER: &str = "+++";

/// Subfolder, inside a category folder, that receives favorite copies.
pub const FAVORITES_SUBFOLDER: &str = "_FAVORITES";

/// Returns true if `filename` starts with the favorite marker.
///
/// The check is case-sensitive and prefix-only.
///
/// # Examples
///
/// ```
/// use tunesort::favorites::is_favorite;
///
/// assert!(is_favorite("+++Track.wav"));
/// assert!(!is_favorite("Track+++.wav"));
/// ```
pub fn is_favorite(filename: &str) -> bool {
    filename.starts_with(FAVORITE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_prefix_is_favorite() {
        assert!(is_favorite("+++Track.wav"));
        assert!(is_favorite("+++"));
        assert!(is_favorite("++++Extra.wav"));
    }

    #[test]
    fn test_marker_elsewhere_is_not_favorite() {
        assert!(!is_favorite("Track+++.wav"));
        assert!(!is_favorite(" +++Track.wav"));
        assert!(!is_favorite("Tr+++ack.wav"));
    }

    #[test]
    fn test_short_marker_is_not_favorite() {
        assert!(!is_favorite("++Track.wav"));
        assert!(!is_favorite("+Track.wav"));
        assert!(!is_favorite(""));
    }
}

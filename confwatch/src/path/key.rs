//! Mapping-key derivation for discovered files.

use std::path::Path;

/// How keys are derived for files that were not declared under a name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyStyle {
    /// Keep the file extension in the key (`db.yaml` instead of `db`).
    pub conserve_extensions: bool,
    /// Use the full normalized path as the key. Takes precedence over
    /// `conserve_extensions`.
    pub conserve_paths: bool,
}

/// Derive the mapping key for a normalized path.
///
/// # Examples
///
/// ```
/// use confwatch::path::{derive_key, KeyStyle};
/// use std::path::Path;
///
/// let path = Path::new("/srv/conf/db.yaml");
/// assert_eq!(derive_key(path, KeyStyle::default()), "db");
///
/// let keep_ext = KeyStyle { conserve_extensions: true, ..KeyStyle::default() };
/// assert_eq!(derive_key(path, keep_ext), "db.yaml");
///
/// let keep_path = KeyStyle { conserve_paths: true, ..KeyStyle::default() };
/// assert_eq!(derive_key(path, keep_path), "/srv/conf/db.yaml");
/// ```
#[must_use]
pub fn derive_key(path: &Path, style: KeyStyle) -> String {
    if style.conserve_paths {
        return path.to_string_lossy().into_owned();
    }

    let name = if style.conserve_extensions {
        path.file_name()
    } else {
        path.file_stem()
    };

    name.map_or_else(
        || path.to_string_lossy().into_owned(),
        |n| n.to_string_lossy().into_owned(),
    )
}

/// The last extension of a path including its leading dot, or an empty
/// string when there is none.
///
/// # Examples
///
/// ```
/// use confwatch::path::extension_of;
/// use std::path::Path;
///
/// assert_eq!(extension_of(Path::new("app.config.json")), ".json");
/// assert_eq!(extension_of(Path::new("Makefile")), "");
/// assert_eq!(extension_of(Path::new(".env")), "");
/// ```
#[must_use]
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_only_last_extension() {
        let path = Path::new("/srv/app.local.json");
        assert_eq!(derive_key(path, KeyStyle::default()), "app.local");
    }

    #[test]
    fn test_file_without_extension() {
        let path = Path::new("/srv/hosts");
        assert_eq!(derive_key(path, KeyStyle::default()), "hosts");
        let keep = KeyStyle {
            conserve_extensions: true,
            conserve_paths: false,
        };
        assert_eq!(derive_key(path, keep), "hosts");
    }

    #[test]
    fn test_conserve_paths_wins_over_extensions() {
        let path = Path::new("/srv/a/db.yaml");
        let style = KeyStyle {
            conserve_extensions: false,
            conserve_paths: true,
        };
        assert_eq!(derive_key(path, style), "/srv/a/db.yaml");
    }

    #[test]
    fn test_same_basename_different_folders() {
        let style = KeyStyle {
            conserve_extensions: false,
            conserve_paths: true,
        };
        let a = derive_key(Path::new("/srv/a/db.yaml"), style);
        let b = derive_key(Path::new("/srv/b/db.yaml"), style);
        assert_ne!(a, b);
        assert_eq!(
            derive_key(Path::new("/srv/a/db.yaml"), KeyStyle::default()),
            derive_key(Path::new("/srv/b/db.yaml"), KeyStyle::default())
        );
    }

    #[test]
    fn test_extension_of_hidden_file() {
        assert_eq!(extension_of(Path::new("/srv/.settings.yml")), ".yml");
    }
}

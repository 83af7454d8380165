//! Path normalization.
//!
//! Source identity is decided on the normalized absolute form of a path:
//! - `~` and `~/...` are expanded to the home directory
//! - relative paths are joined onto the current directory
//! - `.` and `..` components are resolved lexically
//!
//! Normalization never follows symlinks, so it works for files that do not
//! exist yet. Some watch backends report events under the resolved real
//! path instead (macOS reports `/private/var/...` for a watch on
//! `/var/...`); [`real_alias`] gives the real form of an existing directory
//! so those events can be mapped back.

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Expand a leading `~` component to the home directory.
///
/// `~user` is rejected; any other path is returned unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] for `~user` paths or when the home
/// directory cannot be determined.
///
/// # Examples
///
/// ```
/// use confwatch::path::normalize::expand_tilde;
/// use std::path::Path;
///
/// let expanded = expand_tilde(Path::new("~/conf")).unwrap();
/// assert!(expanded.is_absolute());
/// assert!(expanded.ends_with("conf"));
///
/// let untouched = expand_tilde(Path::new("./conf")).unwrap();
/// assert_eq!(untouched, Path::new("./conf"));
/// ```
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    let Some(Component::Normal(first)) = components.next() else {
        return Ok(path.to_path_buf());
    };

    match first.to_str() {
        Some("~") => {
            let home = home::home_dir().ok_or_else(|| Error::InvalidPath {
                path: path.to_path_buf(),
                reason: "cannot determine home directory".to_string(),
            })?;
            let rest = components.as_path();
            if rest.as_os_str().is_empty() {
                Ok(home)
            } else {
                Ok(home.join(rest))
            }
        }
        Some(name) if name.starts_with('~') => Err(Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "~user syntax is not supported; use ~ or ~/path".to_string(),
        }),
        _ => Ok(path.to_path_buf()),
    }
}

/// Drop `.` components and fold each `..` into its parent.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] when a `..` has no parent to fold into,
/// for example `/..`.
///
/// # Examples
///
/// ```
/// use confwatch::path::normalize::resolve_components;
/// use std::path::{Path, PathBuf};
///
/// let resolved = resolve_components(Path::new("/etc/./app/../conf")).unwrap();
/// assert_eq!(resolved, PathBuf::from("/etc/conf"));
/// ```
pub fn resolve_components(path: &Path) -> Result<PathBuf> {
    let mut resolved = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(resolved.components().next_back(), Some(Component::Normal(_))) {
                    return Err(Error::InvalidPath {
                        path: path.to_path_buf(),
                        reason: "too many '..' components (escapes root)".to_string(),
                    });
                }
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }

    Ok(resolved)
}

/// Normalize a path to absolute form.
///
/// # Errors
///
/// Returns an error if tilde expansion fails, the current directory cannot
/// be determined, or the path escapes the root.
///
/// # Examples
///
/// ```no_run
/// use confwatch::path::normalize::normalize;
/// use std::path::Path;
///
/// let normalized = normalize(Path::new("./conf/app.json")).unwrap();
/// assert!(normalized.is_absolute());
/// assert!(normalized.ends_with("conf/app.json"));
/// ```
pub fn normalize(path: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path)?;
    if expanded.is_absolute() {
        return resolve_components(&expanded);
    }

    let cwd = env::current_dir().map_err(|e| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: format!("cannot get current directory: {e}"),
    })?;
    resolve_components(&cwd.join(expanded))
}

/// Normalize a path, falling back to the path as given when normalization
/// fails.
///
/// Used on hot paths (change events, lookups) where an unresolvable path
/// should simply not match anything rather than abort the operation.
#[must_use]
pub fn normalize_lossy(path: &Path) -> PathBuf {
    normalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve every symlink in an existing path.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] if the path does not exist, or
/// [`Error::Io`] for any other failure.
pub fn canonicalize(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "does not exist".to_string(),
        },
        _ => Error::Io(e),
    })
}

/// The real path of an existing path, when it differs from the path itself.
///
/// Returns `None` for missing paths and for paths without symlinks.
#[must_use]
pub fn real_alias(path: &Path) -> Option<PathBuf> {
    canonicalize(path).ok().filter(|real| real != path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_home() {
        let home = home::home_dir().unwrap();
        assert_eq!(expand_tilde(Path::new("~")).unwrap(), home);
    }

    #[test]
    fn test_expand_tilde_with_path() {
        let home = home::home_dir().unwrap();
        let expanded = expand_tilde(Path::new("~/conf/app.json")).unwrap();
        assert_eq!(expanded, home.join("conf/app.json"));
    }

    #[test]
    fn test_expand_tilde_user_syntax_not_supported() {
        assert!(expand_tilde(Path::new("~user/conf")).is_err());
    }

    #[test]
    fn test_resolve_components_multiple_parent() {
        let resolved = resolve_components(Path::new("/a/b/../../c")).unwrap();
        assert_eq!(resolved, PathBuf::from("/c"));
    }

    #[test]
    fn test_resolve_components_root_only() {
        let resolved = resolve_components(Path::new("/")).unwrap();
        assert_eq!(resolved, PathBuf::from("/"));
    }

    #[test]
    fn test_resolve_components_too_many_parent() {
        assert!(resolve_components(Path::new("/a/../..")).is_err());
    }

    #[test]
    fn test_resolve_components_keeps_glob_metacharacters() {
        let resolved = resolve_components(Path::new("/srv/./conf/**/*.yaml")).unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/conf/**/*.yaml"));
    }

    #[test]
    fn test_normalize_relative() {
        let cwd = env::current_dir().unwrap();
        let normalized = normalize(Path::new("./conf/../conf/app.json")).unwrap();
        assert_eq!(normalized, cwd.join("conf/app.json"));
    }

    #[test]
    fn test_normalize_current_dir() {
        let cwd = env::current_dir().unwrap();
        assert_eq!(normalize(Path::new(".")).unwrap(), cwd);
    }

    #[test]
    fn test_resolve_components_relative_escape() {
        assert!(resolve_components(Path::new("a/../..")).is_err());
        assert_eq!(resolve_components(Path::new("a/./b/..")).unwrap(), PathBuf::from("a"));
    }

    #[test]
    fn test_canonicalize_missing_path() {
        let err = canonicalize(Path::new("/nonexistent/confwatch/dir")).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
        assert!(real_alias(Path::new("/nonexistent/confwatch/dir")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_real_alias_follows_symlinks() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap();
        fs::create_dir(root.join("real")).unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("link")).unwrap();

        assert_eq!(real_alias(&root.join("link")), Some(root.join("real")));
        assert_eq!(real_alias(&root.join("real")), None);
    }

    #[test]
    fn test_normalize_lossy_falls_back() {
        let escaping = Path::new("/..");
        assert_eq!(normalize_lossy(escaping), PathBuf::from("/.."));
    }

    #[cfg(unix)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn path_strategy() -> impl Strategy<Value = String> {
            prop::collection::vec("[a-zA-Z0-9_-]{1,10}", 1..=5)
                .prop_map(|parts| format!("/{}", parts.join("/")))
        }

        fn path_with_dots_strategy() -> impl Strategy<Value = String> {
            prop::collection::vec(
                prop_oneof![
                    Just(".".to_string()),
                    Just("..".to_string()),
                    "[a-zA-Z0-9_-]{1,10}".prop_map(|s| s),
                ],
                1..=8,
            )
            .prop_map(|parts| format!("/{}", parts.join("/")))
        }

        proptest! {
            #[test]
            fn normalize_idempotent(s in path_strategy()) {
                let norm1 = normalize(Path::new(&s)).unwrap();
                let norm2 = normalize(&norm1).unwrap();
                prop_assert_eq!(norm1, norm2);
            }

            #[test]
            fn normalize_removes_dot_components(s in path_with_dots_strategy()) {
                if let Ok(normalized) = normalize(Path::new(&s)) {
                    prop_assert!(normalized.is_absolute());
                    for component in normalized.components() {
                        prop_assert_ne!(component, Component::CurDir);
                        prop_assert_ne!(component, Component::ParentDir);
                    }
                }
            }
        }
    }
}

//! Compiled folder patterns.

use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::error::{Error, Result};
use crate::path::normalize;

const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// A folder glob made absolute, with the directory that must be watched
/// to see every file it can match.
#[derive(Debug, Clone)]
pub struct FolderPattern {
    raw: String,
    matcher: Pattern,
    base: PathBuf,
    recursive: bool,
}

impl FolderPattern {
    /// Compile a pattern, resolving it against the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if the glob is malformed, or
    /// [`Error::InvalidPath`] if the pattern cannot be made absolute.
    pub fn compile(raw: &str) -> Result<Self> {
        let absolute = normalize(Path::new(raw))?;
        let text = absolute.to_string_lossy().into_owned();
        let matcher = Pattern::new(&text).map_err(|e| Error::pattern(raw, &e))?;

        let mut base = PathBuf::new();
        let mut rest = Vec::new();
        for component in absolute.components() {
            let literal = rest.is_empty() && !has_glob_meta(component);
            if literal {
                base.push(component);
            } else {
                rest.push(component);
            }
        }

        let (base, recursive) = if rest.is_empty() {
            // No wildcard at all: a single file, watched through its parent.
            let parent = base.parent().map_or_else(|| base.clone(), Path::to_path_buf);
            (parent, false)
        } else {
            (base, rest.len() > 1)
        };

        Ok(Self {
            raw: raw.to_string(),
            matcher,
            base,
            recursive,
        })
    }

    /// The pattern as declared.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The absolute glob.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.matcher.as_str()
    }

    /// Deepest directory without wildcards.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Whether matches can lie below the base directory's direct children.
    #[must_use]
    pub const fn recursive(&self) -> bool {
        self.recursive
    }

    /// Whether a normalized path matches.
    #[must_use]
    pub fn matches(&self, path: &Path, options: MatchOptions) -> bool {
        self.matcher.matches_path_with(path, options)
    }

    /// Whether a path lies inside the watched base directory.
    #[must_use]
    pub fn covers(&self, path: &Path) -> bool {
        path.starts_with(&self.base)
    }

    /// Every regular file currently matching, in glob order. Entries that
    /// cannot be read are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if the glob is malformed.
    pub fn expand(&self, options: MatchOptions) -> Result<Vec<PathBuf>> {
        let paths = glob::glob_with(self.as_str(), options).map_err(|e| Error::pattern(&self.raw, &e))?;
        Ok(paths
            .filter_map(std::result::Result::ok)
            .filter(|path| path.is_file())
            .collect())
    }
}

fn has_glob_meta(component: Component<'_>) -> bool {
    component
        .as_os_str()
        .to_string_lossy()
        .contains(GLOB_META)
}

//! Error types for the confwatch library.
//!
//! This module provides the error hierarchy shared by every part of the
//! crate, using `thiserror` for ergonomic error handling.
//!
//! Per-file failures (unreadable files, malformed content, rejected values)
//! are represented here so that they can be logged and reported through
//! [`LoadOutcome`](crate::loader::LoadOutcome), but they never escape the
//! loader. Only lifecycle misuse and setup failures are returned to callers.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a confwatch error.
///
/// # Examples
///
/// ```
/// use confwatch::{Error, Result};
///
/// fn example_operation() -> Result<bool> {
///     Ok(true)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the confwatch library.
#[derive(Debug, Error)]
pub enum Error {
    /// An invalid filesystem path was provided.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
        /// The reason the path is invalid.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be decoded by its selected decoder.
    #[error("failed to parse {}: {message}", path.display())]
    Decode {
        /// The file that failed to decode.
        path: PathBuf,
        /// The decoder's error message.
        message: String,
    },

    /// A decoded configuration value was rejected by its validator.
    #[error("validation error in file {}{}", path.display(), reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Validation {
        /// The file whose content was rejected.
        path: PathBuf,
        /// The validator's reason, when it provides one.
        reason: Option<String>,
    },

    /// A folder glob pattern is malformed.
    #[error("invalid glob pattern '{pattern}': {message}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// What is wrong with it.
        message: String,
    },

    /// The filesystem watcher could not be created or armed.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// An options manifest could not be parsed.
    #[error("invalid manifest {}: {message}", path.display())]
    Manifest {
        /// The manifest file.
        path: PathBuf,
        /// The parse error message.
        message: String,
    },

    /// A setting (from the environment or a manifest) has an invalid value.
    #[error("invalid value for '{field}': {message}")]
    InvalidSetting {
        /// The setting that was rejected.
        field: String,
        /// A description of the problem.
        message: String,
    },

    /// `start()` was called while the parser is already starting or running.
    #[error("ConfigParser already started")]
    AlreadyStarted,

    /// `stop()` was called before a successful `start()`.
    #[error("ConfigParser not started")]
    NotStarted,

    /// `stop()` was called while no watcher is held.
    #[error("watcher not initialized")]
    WatcherNotInitialized,
}

impl Error {
    /// Build a [`Error::Pattern`] from a `glob` parse failure.
    pub(crate) fn pattern(pattern: &str, err: &glob::PatternError) -> Self {
        Self::Pattern {
            pattern: pattern.to_string(),
            message: format!("{} (at position {})", err.msg, err.pos),
        }
    }

    /// Check if the error is a lifecycle misuse (`start`/`stop` called in
    /// the wrong state).
    ///
    /// # Examples
    ///
    /// ```
    /// use confwatch::Error;
    ///
    /// assert!(Error::AlreadyStarted.is_lifecycle());
    /// assert!(Error::NotStarted.is_lifecycle());
    /// ```
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::AlreadyStarted | Self::NotStarted | Self::WatcherNotInitialized
        )
    }

    /// Check if the error was produced by a validator rejecting a value.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if the error was produced by a decoder.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

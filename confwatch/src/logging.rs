//! Logging infrastructure for the confwatch library.
//!
//! Two independently toggleable channels are exposed: an error channel for
//! per-file failures (decode and validation errors) and a debug channel for
//! load progress. Messages go to a [`LogSink`], which by default forwards to
//! the [`log`] facade so the embedding application decides where they end up.

use std::env;
use std::fmt;
use std::sync::Arc;

/// Prefix attached to every message emitted by the library.
const PREFIX: &str = "[ConfigParser]";

/// Target used when forwarding to the `log` facade.
pub const LOG_TARGET: &str = "confwatch";

/// Environment variable consulted by [`LoggingOptions::from_env`].
pub const LOG_MODE_VAR: &str = "CONFWATCH_LOG_MODE";

/// Logging level for controlling output verbosity.
///
/// Log levels are ordered from least verbose (Quiet) to most verbose (Verbose).
///
/// # Examples
///
/// ```
/// use confwatch::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert!(LogLevel::Normal < LogLevel::Verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Neither errors nor debug messages.
    Quiet,
    /// Errors only.
    Normal,
    /// Errors and debug messages.
    Verbose,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl LogLevel {
    /// Parses a log level from a string.
    ///
    /// Recognizes: "quiet", "normal", "verbose" (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use confwatch::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse("quiet").unwrap(), LogLevel::Quiet);
    /// assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
    /// assert!(LogLevel::parse("invalid").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(format!("invalid log level: {s}")),
        }
    }
}

/// Which logging channels are enabled.
///
/// Defaults to errors on, debug off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Emit per-file failures.
    pub error: bool,
    /// Emit load progress.
    pub debug: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self::from_level(LogLevel::Normal)
    }
}

impl LoggingOptions {
    /// Channel settings equivalent to a [`LogLevel`].
    ///
    /// # Examples
    ///
    /// ```
    /// use confwatch::{LogLevel, LoggingOptions};
    ///
    /// let opts = LoggingOptions::from_level(LogLevel::Verbose);
    /// assert!(opts.error && opts.debug);
    /// ```
    #[must_use]
    pub const fn from_level(level: LogLevel) -> Self {
        Self {
            error: matches!(level, LogLevel::Normal | LogLevel::Verbose),
            debug: matches!(level, LogLevel::Verbose),
        }
    }

    /// Reads `CONFWATCH_LOG_MODE`, falling back to the defaults when the
    /// variable is unset or unrecognized.
    #[must_use]
    pub fn from_env() -> Self {
        env::var(LOG_MODE_VAR)
            .ok()
            .and_then(|value| LogLevel::parse(&value).ok())
            .map_or_else(Self::default, Self::from_level)
    }
}

/// Destination for log messages.
///
/// Implement this to capture messages yourself; the default
/// [`FacadeSink`] forwards to the `log` crate.
#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync {
    /// Receives an error-channel message.
    fn error(&self, message: &str);
    /// Receives a debug-channel message.
    fn debug(&self, message: &str);
}

/// Sink forwarding to `log::error!` and `log::debug!` under [`LOG_TARGET`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn error(&self, message: &str) {
        log::error!(target: LOG_TARGET, "{message}");
    }

    fn debug(&self, message: &str) {
        log::debug!(target: LOG_TARGET, "{message}");
    }
}

/// A channel-filtering logger shared by the loader and the watch worker.
///
/// # Examples
///
/// ```
/// use confwatch::{Logger, LoggingOptions};
///
/// let logger = Logger::new(LoggingOptions::default());
/// logger.error("this goes to the error channel");
/// logger.debug("this is dropped: debug is off by default");
/// ```
#[derive(Clone)]
pub struct Logger {
    options: LoggingOptions,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Creates a logger that forwards to the `log` facade.
    #[must_use]
    pub fn new(options: LoggingOptions) -> Self {
        Self::with_sink(options, Arc::new(FacadeSink))
    }

    /// Creates a logger writing to a custom sink.
    #[must_use]
    pub fn with_sink(options: LoggingOptions, sink: Arc<dyn LogSink>) -> Self {
        Self { options, sink }
    }

    /// Returns the enabled channels.
    #[must_use]
    pub const fn options(&self) -> LoggingOptions {
        self.options
    }

    /// Logs an error message if the error channel is enabled.
    pub fn error(&self, message: &str) {
        if self.options.error {
            self.sink.error(&format!("{PREFIX} {message}"));
        }
    }

    /// Logs a debug message if the debug channel is enabled.
    pub fn debug(&self, message: &str) {
        if self.options.debug {
            self.sink.debug(&format!("{PREFIX} {message}"));
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggingOptions::default())
    }
}

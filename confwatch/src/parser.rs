//! The [`ConfigParser`] facade.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::format::FormatRegistry;
use crate::loader::{ConfigMap, LoadOutcome, Loader, LoaderSettings};
use crate::logging::Logger;
use crate::options::ConfigParserOptions;
use crate::watch::{self, Lifecycle, ResolvedEntry, Session, WatchHandle};

/// Aggregates configuration files into a live [`ConfigMap`].
///
/// Construction does no I/O. [`start`](Self::start) loads every declared
/// source once and, if any source is hot-reloaded, keeps the map current
/// until [`stop`](Self::stop) is called or the parser is dropped.
///
/// # Examples
///
/// ```
/// use confwatch::{ConfigParser, ConfigParserOptions, FileSource};
/// use serde_json::json;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("app.json");
/// std::fs::write(&path, r#"{"port": 8080}"#).unwrap();
///
/// let options = ConfigParserOptions::new()
///     .file("app", FileSource::new(&path))
///     .hot_reload(false);
/// let parser = ConfigParser::open(options).unwrap();
///
/// assert_eq!(parser.get("app"), Some(json!({ "port": 8080 })));
/// ```
#[derive(Debug)]
pub struct ConfigParser {
    options: ConfigParserOptions,
    loader: Loader,
    lifecycle: Lifecycle,
    session: Option<Arc<Session>>,
    watch: Option<WatchHandle>,
}

impl ConfigParser {
    /// Create a parser without touching the filesystem.
    #[must_use]
    pub fn new(options: ConfigParserOptions) -> Self {
        let logger = match &options.log_sink {
            Some(sink) => Logger::with_sink(options.logging, Arc::clone(sink)),
            None => Logger::new(options.logging),
        };
        let settings = LoaderSettings {
            encoding: options.encoding,
            key_style: options.key_style(),
            allow_binary: options.allow_binary,
        };
        let loader = Loader::new(
            settings,
            FormatRegistry::with_overrides(&options.parsers),
            logger,
            ConfigMap::new(),
        );

        Self {
            options,
            loader,
            lifecycle: Lifecycle::Stopped,
            session: None,
            watch: None,
        }
    }

    /// Create a parser and, when `options.start` is set, start it.
    ///
    /// # Errors
    ///
    /// Returns the error from [`start`](Self::start).
    pub fn open(options: ConfigParserOptions) -> Result<Self> {
        let mut parser = Self::new(options);
        if parser.options.start {
            parser.start()?;
        }
        Ok(parser)
    }

    /// Load every declared source and begin watching hot-reload sources.
    ///
    /// Files that are missing, binary, malformed or rejected do not fail
    /// the start; they are logged and left out of the map.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyStarted`] if the parser is starting or running.
    /// - [`Error::Pattern`] if a folder pattern is malformed.
    /// - [`Error::Watch`] or [`Error::Io`] if the watcher cannot be armed.
    ///
    /// On error the parser is left stopped.
    pub fn start(&mut self) -> Result<()> {
        if self.lifecycle != Lifecycle::Stopped {
            return Err(Error::AlreadyStarted);
        }
        self.lifecycle = Lifecycle::Starting;

        match watch::start(&self.options, self.loader.clone()) {
            Ok((session, handle)) => {
                self.session = Some(session);
                self.watch = handle;
                self.lifecycle = Lifecycle::Watching;
                Ok(())
            }
            Err(err) => {
                self.loader.logger().error(&err.to_string());
                self.lifecycle = Lifecycle::Stopped;
                Err(err)
            }
        }
    }

    /// Stop watching. The map keeps its current contents.
    ///
    /// # Errors
    ///
    /// - [`Error::NotStarted`] if the parser is not running.
    /// - [`Error::WatcherNotInitialized`] if it is running without a
    ///   watcher (no source is hot-reloaded); the parser stays running.
    pub fn stop(&mut self) -> Result<()> {
        if self.lifecycle != Lifecycle::Watching {
            return Err(Error::NotStarted);
        }
        let handle = self.watch.take().ok_or(Error::WatcherNotInitialized)?;

        if !handle.close() {
            self.loader.logger().error("watch worker panicked");
        }
        self.session = None;
        self.lifecycle = Lifecycle::Stopped;
        Ok(())
    }

    /// Reload one file the way a change event would: with the overrides of
    /// its entry, registering it first if it matches a folder pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotStarted`] if the parser is not running. Load
    /// failures are reported through the returned [`LoadOutcome`].
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<LoadOutcome> {
        let session = self.session.as_ref().ok_or(Error::NotStarted)?;
        Ok(session.reload(path.as_ref()))
    }

    /// Whether the parser has started and not been stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Watching
    }

    /// Whether a filesystem watcher is armed.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The live map. Clone the handle to share it with other threads.
    #[must_use]
    pub fn configs(&self) -> &ConfigMap {
        self.loader.configs()
    }

    /// A copy of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.configs().get(key)
    }

    /// The options this parser was built with.
    #[must_use]
    pub fn options(&self) -> &ConfigParserOptions {
        &self.options
    }

    /// The resolved sources of the running session; empty when stopped.
    #[must_use]
    pub fn entries(&self) -> Vec<ResolvedEntry> {
        self.session
            .as_ref()
            .map(|session| session.entries())
            .unwrap_or_default()
    }
}

impl Drop for ConfigParser {
    fn drop(&mut self) {
        if let Some(handle) = self.watch.take() {
            handle.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LoggingOptions;
    use crate::options::{FileSource, FolderSource};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn quiet() -> ConfigParserOptions {
        ConfigParserOptions::new().logging(LoggingOptions {
            error: false,
            debug: false,
        })
    }

    #[test]
    fn test_new_does_no_io() {
        let parser = ConfigParser::new(quiet().file("app", FileSource::new("/nonexistent/app.json")));
        assert_eq!(parser.lifecycle(), Lifecycle::Stopped);
        assert!(parser.configs().is_empty());
        assert!(parser.entries().is_empty());
    }

    #[test]
    fn test_open_without_auto_start() {
        let parser = ConfigParser::open(quiet().auto_start(false)).unwrap();
        assert!(!parser.is_running());
    }

    #[test]
    fn test_start_twice_fails() {
        let mut parser = ConfigParser::new(quiet().hot_reload(false));
        parser.start().unwrap();
        assert!(matches!(parser.start(), Err(Error::AlreadyStarted)));
        assert!(parser.is_running());
    }

    #[test]
    fn test_stop_before_start_fails() {
        let mut parser = ConfigParser::new(quiet());
        assert!(matches!(parser.stop(), Err(Error::NotStarted)));
    }

    #[test]
    fn test_stop_without_watcher() {
        let mut parser = ConfigParser::new(quiet().hot_reload(false));
        parser.start().unwrap();
        assert!(!parser.is_watching());
        assert!(matches!(parser.stop(), Err(Error::WatcherNotInitialized)));
        assert!(parser.is_running());
    }

    #[test]
    fn test_bad_pattern_leaves_parser_stopped() {
        let mut parser = ConfigParser::new(quiet().folder(FolderSource::new("/srv/[x/*.json")));
        assert!(matches!(parser.start(), Err(Error::Pattern { .. })));
        assert_eq!(parser.lifecycle(), Lifecycle::Stopped);
    }

    #[test]
    fn test_start_stop_restart() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.json");
        fs::write(&path, r#"{"v": 1}"#).unwrap();

        let mut parser = ConfigParser::new(quiet().file("app", FileSource::new(&path)));
        parser.start().unwrap();
        assert!(parser.is_watching());
        parser.stop().unwrap();
        assert_eq!(parser.lifecycle(), Lifecycle::Stopped);
        assert_eq!(parser.get("app"), Some(json!({ "v": 1 })));

        fs::write(&path, r#"{"v": 2}"#).unwrap();
        parser.start().unwrap();
        assert_eq!(parser.get("app"), Some(json!({ "v": 2 })));
    }

    #[test]
    fn test_reload_requires_running_parser() {
        let parser = ConfigParser::new(quiet());
        assert!(matches!(parser.reload("/tmp/x.json"), Err(Error::NotStarted)));
    }
}

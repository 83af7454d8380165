//! Options for a [`ConfigParser`](crate::ConfigParser).
//!
//! Options are assembled programmatically through [`ConfigParserOptions`]'s
//! builder methods, optionally starting from a declarative [`Manifest`]
//! and adjusted by `CONFWATCH_*` environment variables
//! ([`EnvironmentOverrides`]). Parsers, validators and event handlers cannot
//! be serialized and are always attached in code.
//!
//! # Examples
//!
//! ```
//! use confwatch::{ConfigParserOptions, FileSource, FolderSource};
//!
//! let options = ConfigParserOptions::new()
//!     .file("app", FileSource::new("./app.json"))
//!     .folder(FolderSource::new("./conf/*.yaml"))
//!     .hot_reload(false);
//!
//! assert_eq!(options.files.len(), 1);
//! assert!(!options.hot_reload);
//! ```

mod environment;
mod manifest;
mod schema;

pub use environment::EnvironmentOverrides;
pub use manifest::{FileEntry, FolderEntry, Manifest};
pub use schema::{Encoding, FileSource, FolderSource, GlobOptions, WatchOptions};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::format::Parser;
use crate::logging::{LogSink, LoggingOptions};
use crate::path::KeyStyle;
use crate::watch::EventHandlers;

/// Everything a [`ConfigParser`](crate::ConfigParser) needs to know.
///
/// | Field                 | Default  |
/// |-----------------------|----------|
/// | `hot_reload`          | `true`   |
/// | `allow_binary`        | `false`  |
/// | `conserve_extensions` | `false`  |
/// | `conserve_paths`      | `false`  |
/// | `encoding`            | UTF-8    |
/// | `start`               | `true`   |
/// | `logging`             | errors on, debug off |
#[derive(Clone)]
pub struct ConfigParserOptions {
    /// Reload sources when they change on disk.
    pub hot_reload: bool,
    /// Load files whose extension marks them as binary.
    pub allow_binary: bool,
    /// Keep the extension in keys derived from file names.
    pub conserve_extensions: bool,
    /// Use the full normalized path as the key of discovered files.
    pub conserve_paths: bool,
    /// Encoding used to read every file.
    pub encoding: Encoding,
    /// Start automatically from [`ConfigParser::open`](crate::ConfigParser::open).
    pub start: bool,
    /// Declared files, by logical name, in declaration order.
    pub files: Vec<(String, FileSource)>,
    /// Declared folder patterns.
    pub folders: Vec<FolderSource>,
    /// Decoders by extension, taking precedence over the built-in ones.
    pub parsers: HashMap<String, Parser>,
    /// Enabled logging channels.
    pub logging: LoggingOptions,
    /// Where log messages go; the `log` facade when unset.
    pub log_sink: Option<Arc<dyn LogSink>>,
    /// Settings forwarded to the filesystem watcher.
    pub watch: WatchOptions,
    /// Settings forwarded to glob expansion.
    pub glob: GlobOptions,
    /// Watch event callbacks.
    pub events: EventHandlers,
}

impl Default for ConfigParserOptions {
    fn default() -> Self {
        Self {
            hot_reload: true,
            allow_binary: false,
            conserve_extensions: false,
            conserve_paths: false,
            encoding: Encoding::default(),
            start: true,
            files: Vec::new(),
            folders: Vec::new(),
            parsers: HashMap::new(),
            logging: LoggingOptions::default(),
            log_sink: None,
            watch: WatchOptions::default(),
            glob: GlobOptions::default(),
            events: EventHandlers::default(),
        }
    }
}

impl fmt::Debug for ConfigParserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parsers: Vec<&String> = self.parsers.keys().collect();
        parsers.sort();
        f.debug_struct("ConfigParserOptions")
            .field("hot_reload", &self.hot_reload)
            .field("allow_binary", &self.allow_binary)
            .field("conserve_extensions", &self.conserve_extensions)
            .field("conserve_paths", &self.conserve_paths)
            .field("encoding", &self.encoding)
            .field("start", &self.start)
            .field("files", &self.files)
            .field("folders", &self.folders)
            .field("parsers", &parsers)
            .field("logging", &self.logging)
            .field("log_sink", &self.log_sink.is_some())
            .field("watch", &self.watch)
            .field("glob", &self.glob)
            .field("events", &self.events)
            .finish()
    }
}

impl ConfigParserOptions {
    /// Defaults with no sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a file under a logical name.
    ///
    /// Declaring the same name twice replaces the earlier source in place.
    #[must_use]
    pub fn file(mut self, name: impl Into<String>, source: FileSource) -> Self {
        let name = name.into();
        match self.files.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = source,
            None => self.files.push((name, source)),
        }
        self
    }

    /// Declare a folder pattern.
    #[must_use]
    pub fn folder(mut self, source: FolderSource) -> Self {
        self.folders.push(source);
        self
    }

    /// Register a decoder for an extension (with or without the leading dot).
    #[must_use]
    pub fn parser(mut self, extension: impl Into<String>, parser: Parser) -> Self {
        self.parsers.insert(extension.into(), parser);
        self
    }

    /// Set the global hot-reload default.
    #[must_use]
    pub fn hot_reload(mut self, enabled: bool) -> Self {
        self.hot_reload = enabled;
        self
    }

    /// Set the global binary-loading default.
    #[must_use]
    pub fn allow_binary(mut self, allowed: bool) -> Self {
        self.allow_binary = allowed;
        self
    }

    /// Keep extensions in derived keys.
    #[must_use]
    pub fn conserve_extensions(mut self, enabled: bool) -> Self {
        self.conserve_extensions = enabled;
        self
    }

    /// Key discovered files by their full path.
    #[must_use]
    pub fn conserve_paths(mut self, enabled: bool) -> Self {
        self.conserve_paths = enabled;
        self
    }

    /// Set the text encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Whether [`ConfigParser::open`](crate::ConfigParser::open) starts the
    /// parser.
    #[must_use]
    pub fn auto_start(mut self, enabled: bool) -> Self {
        self.start = enabled;
        self
    }

    /// Set the enabled logging channels.
    #[must_use]
    pub fn logging(mut self, logging: LoggingOptions) -> Self {
        self.logging = logging;
        self
    }

    /// Send log messages to a custom sink.
    #[must_use]
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Set the watcher passthrough settings.
    #[must_use]
    pub fn watch_options(mut self, watch: WatchOptions) -> Self {
        self.watch = watch;
        self
    }

    /// Set the glob passthrough settings.
    #[must_use]
    pub fn glob_options(mut self, glob: GlobOptions) -> Self {
        self.glob = glob;
        self
    }

    /// Set the watch event callbacks.
    #[must_use]
    pub fn events(mut self, events: EventHandlers) -> Self {
        self.events = events;
        self
    }

    /// Key derivation settings for discovered files.
    #[must_use]
    pub const fn key_style(&self) -> KeyStyle {
        KeyStyle {
            conserve_extensions: self.conserve_extensions,
            conserve_paths: self.conserve_paths,
        }
    }

    /// The declared file with this logical name.
    #[must_use]
    pub fn declared_file(&self, name: &str) -> Option<&FileSource> {
        self.files
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, source)| source)
    }
}

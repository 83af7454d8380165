#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # confwatch
//!
//! Aggregates configuration files of mixed formats into one live mapping
//! and keeps it current as the files change on disk.
//!
//! Sources are declared as named files or as glob folder patterns. Each
//! file is decoded by extension (JSON, JSONC, INI, YAML, TOML, XML, with
//! raw text as the fallback), optionally validated, and stored under its
//! declared name or a key derived from its path. A file that fails to
//! decode or validate is logged and never replaces a previously good value.
//!
//! ## Core Types
//!
//! - [`ConfigParser`]: starts, stops and owns the live [`ConfigMap`]
//! - [`ConfigParserOptions`], [`FileSource`] and [`FolderSource`]: what to load
//! - [`Parser`] and [`Validator`]: per-source decoding and validation hooks
//! - [`EventHandlers`] and [`WatchEvent`]: filesystem event callbacks
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use confwatch::{ConfigParser, ConfigParserOptions, FolderSource};
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("db.yaml"), "host: localhost\nport: 5432\n").unwrap();
//!
//! let pattern = format!("{}/*.yaml", dir.path().display());
//! let options = ConfigParserOptions::new()
//!     .folder(FolderSource::new(pattern))
//!     .hot_reload(false);
//! let parser = ConfigParser::open(options).unwrap();
//!
//! assert_eq!(parser.get("db"), Some(json!({ "host": "localhost", "port": 5432 })));
//! ```

pub mod error;
pub mod format;
pub mod loader;
pub mod logging;
pub mod options;
pub mod parser;
pub mod path;
pub mod validation;
pub mod watch;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use format::{Decoder, FormatRegistry, Parser};
pub use loader::{ConfigMap, LoadOutcome, LoadOverrides, Loader, LoaderSettings};
pub use logging::{FacadeSink, LogLevel, LogSink, Logger, LoggingOptions};
pub use options::{
    ConfigParserOptions, Encoding, EnvironmentOverrides, FileSource, FolderSource, GlobOptions,
    Manifest, WatchOptions,
};
pub use parser::ConfigParser;
pub use serde_json::Value;
pub use validation::{Issue, SafeParse, SchemaError, SchemaValidate, TypedSchema, Validator, Verdict};
pub use watch::{EventHandlers, Lifecycle, ResolvedEntry, WatchEvent};

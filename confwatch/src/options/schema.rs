//! Option types: sources, encodings and collaborator passthrough settings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::format::Parser;
use crate::validation::Validator;

/// Text encoding used to read configuration files.
///
/// Undecodable input is replaced rather than rejected, so a stray byte
/// never prevents a file from being handed to its decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Encoding {
    /// UTF-8 (the default).
    #[default]
    Utf8,
    /// Little-endian UTF-16.
    Utf16Le,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// 7-bit ASCII; the high bit of every byte is dropped.
    Ascii,
}

impl Encoding {
    /// Parses an encoding name.
    ///
    /// Accepts the usual spellings (`utf8`, `utf-8`, `utf16le`, `ucs2`,
    /// `latin1`, `binary`, `ascii`), case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use confwatch::Encoding;
    ///
    /// assert_eq!(Encoding::parse("UTF-8").unwrap(), Encoding::Utf8);
    /// assert_eq!(Encoding::parse("ucs2").unwrap(), Encoding::Utf16Le);
    /// assert!(Encoding::parse("ebcdic").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(Self::Utf16Le),
            "latin1" | "binary" | "iso-8859-1" => Ok(Self::Latin1),
            "ascii" => Ok(Self::Ascii),
            _ => Err(format!("unsupported encoding: {s}")),
        }
    }

    /// Canonical name of the encoding.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
            Self::Latin1 => "latin1",
            Self::Ascii => "ascii",
        }
    }

    /// Decodes raw file bytes into text.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Ascii => bytes.iter().map(|&b| char::from(b & 0x7f)).collect(),
        }
    }
}

impl TryFrom<String> for Encoding {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Encoding> for String {
    fn from(value: Encoding) -> Self {
        value.name().to_string()
    }
}

/// Options forwarded to the glob expansion of folder patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobOptions {
    /// Match letters case-sensitively.
    pub case_sensitive: bool,
    /// `*` and `?` never match a path separator.
    pub require_literal_separator: bool,
    /// Leading dots in file names must be matched literally.
    pub require_literal_leading_dot: bool,
}

impl Default for GlobOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        }
    }
}

impl From<GlobOptions> for glob::MatchOptions {
    fn from(value: GlobOptions) -> Self {
        Self {
            case_sensitive: value.case_sensitive,
            require_literal_separator: value.require_literal_separator,
            require_literal_leading_dot: value.require_literal_leading_dot,
        }
    }
}

/// Options forwarded to the filesystem watcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Polling interval, for backends that poll.
    pub poll_interval: Option<Duration>,
    /// Compare file contents instead of modification times when polling.
    pub compare_contents: bool,
}

impl From<WatchOptions> for notify::Config {
    fn from(value: WatchOptions) -> Self {
        let config = Self::default().with_compare_contents(value.compare_contents);
        match value.poll_interval {
            Some(interval) => config.with_poll_interval(interval),
            None => config,
        }
    }
}

/// One explicitly declared configuration file.
///
/// # Examples
///
/// ```
/// use confwatch::{FileSource, Validator};
///
/// let source = FileSource::new("./app.json")
///     .hot_reload(false)
///     .validator(Validator::predicate(|v| v.is_object()));
/// assert_eq!(source.hot_reload, Some(false));
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    /// Location of the file.
    pub path: PathBuf,
    /// Reload on change; inherits the global setting when unset.
    pub hot_reload: Option<bool>,
    /// Load even if the extension marks the file as binary; inherits the
    /// global setting when unset.
    pub allow_binary: Option<bool>,
    /// Decoder used instead of the extension-based one.
    pub parser: Option<Parser>,
    /// Validator applied to the decoded value.
    pub validator: Option<Validator>,
}

impl FileSource {
    /// Declare a file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            hot_reload: None,
            allow_binary: None,
            parser: None,
            validator: None,
        }
    }

    /// Override the global hot-reload setting.
    #[must_use]
    pub fn hot_reload(mut self, enabled: bool) -> Self {
        self.hot_reload = Some(enabled);
        self
    }

    /// Override the global binary-loading setting.
    #[must_use]
    pub fn allow_binary(mut self, allowed: bool) -> Self {
        self.allow_binary = Some(allowed);
        self
    }

    /// Use a custom decoder for this file.
    #[must_use]
    pub fn parser(mut self, parser: Parser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Validate this file's decoded value.
    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }
}

/// A glob pattern whose matches are all loaded.
///
/// Parsers and validators are looked up by file name (`db.yaml`) and then
/// by stem (`db`).
///
/// # Examples
///
/// ```
/// use confwatch::{FolderSource, Validator};
/// use std::path::Path;
///
/// let folder = FolderSource::new("./conf/*.yaml")
///     .validator("db", Validator::predicate(|v| v.get("host").is_some()));
/// assert!(folder.validator_for(Path::new("/srv/conf/db.yaml")).is_some());
/// assert!(folder.validator_for(Path::new("/srv/conf/cache.yaml")).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct FolderSource {
    /// Glob pattern, relative to the current directory unless absolute.
    pub pattern: String,
    /// Reload on change; inherits the global setting when unset.
    pub hot_reload: Option<bool>,
    /// Load binary files too; inherits the global setting when unset.
    pub allow_binary: Option<bool>,
    /// Decoders by file name or stem.
    pub parsers: HashMap<String, Parser>,
    /// Validators by file name or stem.
    pub validators: HashMap<String, Validator>,
}

impl FolderSource {
    /// Declare a folder pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            hot_reload: None,
            allow_binary: None,
            parsers: HashMap::new(),
            validators: HashMap::new(),
        }
    }

    /// Override the global hot-reload setting.
    #[must_use]
    pub fn hot_reload(mut self, enabled: bool) -> Self {
        self.hot_reload = Some(enabled);
        self
    }

    /// Override the global binary-loading setting.
    #[must_use]
    pub fn allow_binary(mut self, allowed: bool) -> Self {
        self.allow_binary = Some(allowed);
        self
    }

    /// Use a custom decoder for the file with this name or stem.
    #[must_use]
    pub fn parser(mut self, name: impl Into<String>, parser: Parser) -> Self {
        self.parsers.insert(name.into(), parser);
        self
    }

    /// Validate the file with this name or stem.
    #[must_use]
    pub fn validator(mut self, name: impl Into<String>, validator: Validator) -> Self {
        self.validators.insert(name.into(), validator);
        self
    }

    /// The decoder declared for a discovered file, if any.
    #[must_use]
    pub fn parser_for(&self, path: &Path) -> Option<&Parser> {
        lookup_by_name(&self.parsers, path)
    }

    /// The validator declared for a discovered file, if any.
    #[must_use]
    pub fn validator_for(&self, path: &Path) -> Option<&Validator> {
        lookup_by_name(&self.validators, path)
    }
}

fn lookup_by_name<'a, T>(table: &'a HashMap<String, T>, path: &Path) -> Option<&'a T> {
    if table.is_empty() {
        return None;
    }
    let by_name = path
        .file_name()
        .and_then(|name| table.get(name.to_string_lossy().as_ref()));
    by_name.or_else(|| {
        path.file_stem()
            .and_then(|stem| table.get(stem.to_string_lossy().as_ref()))
    })
}

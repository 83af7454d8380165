//! Declarative option manifests.
//!
//! A manifest lists sources and global flags in YAML, TOML or JSON (chosen
//! by extension). Relative file paths and folder patterns are resolved
//! against the directory containing the manifest.
//!
//! ```yaml
//! hot_reload: true
//! encoding: utf-8
//! files:
//!   app: ./app.json
//!   secrets:
//!     path: ./secrets.yaml
//!     hot_reload: false
//! folders:
//!   - ./conf/*.yaml
//!   - pattern: ./certs/*
//!     allow_binary: true
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use super::schema::{Encoding, FileSource, FolderSource, GlobOptions, WatchOptions};
use super::ConfigParserOptions;
use crate::error::{Error, Result};
use crate::logging::{LogLevel, LoggingOptions};

/// Options as read from a manifest file. Every field is optional; unset
/// fields keep the value of the options the manifest is applied to.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Global hot-reload default.
    pub hot_reload: Option<bool>,
    /// Global binary-loading default.
    pub allow_binary: Option<bool>,
    /// Keep extensions in derived keys.
    pub conserve_extensions: Option<bool>,
    /// Key discovered files by full path.
    pub conserve_paths: Option<bool>,
    /// Text encoding.
    pub encoding: Option<Encoding>,
    /// Start automatically when opened.
    pub start: Option<bool>,
    /// Logging verbosity: `quiet`, `normal` or `verbose`.
    pub log_mode: Option<String>,
    /// Declared files, by logical name, in document order.
    #[serde(default, deserialize_with = "ordered_files")]
    pub files: Vec<(String, FileEntry)>,
    /// Declared folder patterns.
    #[serde(default)]
    pub folders: Vec<FolderEntry>,
    /// Glob passthrough settings.
    pub glob: Option<GlobOptions>,
    /// Polling interval for polling watcher backends, in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Compare contents instead of modification times when polling.
    pub compare_contents: Option<bool>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// A file declared in a manifest: a bare path or a table of settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File location.
    pub path: PathBuf,
    /// Per-file hot-reload setting.
    pub hot_reload: Option<bool>,
    /// Per-file binary-loading setting.
    pub allow_binary: Option<bool>,
}

impl<'de> Deserialize<'de> for FileEntry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Path(PathBuf),
            Table {
                path: PathBuf,
                #[serde(default)]
                hot_reload: Option<bool>,
                #[serde(default)]
                allow_binary: Option<bool>,
            },
        }

        Ok(match Helper::deserialize(deserializer)? {
            Helper::Path(path) => Self {
                path,
                hot_reload: None,
                allow_binary: None,
            },
            Helper::Table {
                path,
                hot_reload,
                allow_binary,
            } => Self {
                path,
                hot_reload,
                allow_binary,
            },
        })
    }
}

/// A folder declared in a manifest: a bare pattern or a table of settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    /// Glob pattern.
    pub pattern: String,
    /// Per-folder hot-reload setting.
    pub hot_reload: Option<bool>,
    /// Per-folder binary-loading setting.
    pub allow_binary: Option<bool>,
}

impl<'de> Deserialize<'de> for FolderEntry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Pattern(String),
            Table {
                pattern: String,
                #[serde(default)]
                hot_reload: Option<bool>,
                #[serde(default)]
                allow_binary: Option<bool>,
            },
        }

        Ok(match Helper::deserialize(deserializer)? {
            Helper::Pattern(pattern) => Self {
                pattern,
                hot_reload: None,
                allow_binary: None,
            },
            Helper::Table {
                pattern,
                hot_reload,
                allow_binary,
            } => Self {
                pattern,
                hot_reload,
                allow_binary,
            },
        })
    }
}

/// Deserialize the `files` map keeping document order and rejecting
/// repeated names.
fn ordered_files<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, FileEntry)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FilesVisitor;

    impl<'de> Visitor<'de> for FilesVisitor {
        type Value = Vec<(String, FileEntry)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of logical names to file paths")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut files: Vec<(String, FileEntry)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, entry)) = map.next_entry::<String, FileEntry>()? {
                if files.iter().any(|(existing, _)| *existing == name) {
                    return Err(de::Error::custom(format!("duplicate file name '{name}'")));
                }
                files.push((name, entry));
            }
            Ok(files)
        }
    }

    deserializer.deserialize_map(FilesVisitor)
}

impl Manifest {
    /// Read a manifest from disk. The format follows the extension:
    /// `.yaml`/`.yml`, `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if the file cannot be read and
    /// [`Error::Manifest`] if it cannot be parsed or has an unknown
    /// extension.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let mut manifest =
            Self::parse(&text, &extension).map_err(|message| Error::Manifest {
                path: path.to_path_buf(),
                message,
            })?;
        manifest.base_dir = path.parent().map(Path::to_path_buf);
        Ok(manifest)
    }

    fn parse(text: &str, extension: &str) -> std::result::Result<Self, String> {
        match extension {
            "yaml" | "yml" => serde_yaml::from_str(text).map_err(|e| e.to_string()),
            "toml" => toml::from_str(text).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(text).map_err(|e| e.to_string()),
            other => Err(format!("unsupported manifest format '.{other}'")),
        }
    }

    /// Build options from the manifest, starting from the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSetting`] if `log_mode` is not recognized.
    pub fn into_options(self) -> Result<ConfigParserOptions> {
        self.apply_to(ConfigParserOptions::default())
    }

    /// Layer the manifest over existing options. Declared files replace
    /// same-named ones; folders are appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSetting`] if `log_mode` is not recognized.
    pub fn apply_to(self, mut options: ConfigParserOptions) -> Result<ConfigParserOptions> {
        if let Some(value) = self.hot_reload {
            options.hot_reload = value;
        }
        if let Some(value) = self.allow_binary {
            options.allow_binary = value;
        }
        if let Some(value) = self.conserve_extensions {
            options.conserve_extensions = value;
        }
        if let Some(value) = self.conserve_paths {
            options.conserve_paths = value;
        }
        if let Some(value) = self.encoding {
            options.encoding = value;
        }
        if let Some(value) = self.start {
            options.start = value;
        }
        if let Some(mode) = &self.log_mode {
            let level = LogLevel::parse(mode).map_err(|message| Error::InvalidSetting {
                field: "log_mode".into(),
                message,
            })?;
            options.logging = LoggingOptions::from_level(level);
        }
        if let Some(glob) = self.glob {
            options.glob = glob;
        }
        if self.poll_interval_ms.is_some() || self.compare_contents.is_some() {
            options.watch = WatchOptions {
                poll_interval: self
                    .poll_interval_ms
                    .map(Duration::from_millis)
                    .or(options.watch.poll_interval),
                compare_contents: self
                    .compare_contents
                    .unwrap_or(options.watch.compare_contents),
            };
        }

        let base = self.base_dir.as_deref();
        for (name, entry) in self.files {
            let mut source = FileSource::new(rebase(base, entry.path));
            source.hot_reload = entry.hot_reload;
            source.allow_binary = entry.allow_binary;
            options = options.file(name, source);
        }
        for entry in self.folders {
            let pattern = rebase(base, PathBuf::from(entry.pattern));
            let mut source = FolderSource::new(pattern.to_string_lossy());
            source.hot_reload = entry.hot_reload;
            source.allow_binary = entry.allow_binary;
            options = options.folder(source);
        }

        Ok(options)
    }
}

/// Anchor a relative manifest path at the manifest's directory. Absolute
/// and `~`-prefixed paths are kept as written.
fn rebase(base: Option<&Path>, path: PathBuf) -> PathBuf {
    match base {
        Some(base) if path.is_relative() && !path.starts_with("~") => base.join(path),
        _ => path,
    }
}

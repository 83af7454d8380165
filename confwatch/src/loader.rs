//! Reading, decoding, validating and committing one configuration file.
//!
//! [`Loader::load`] never fails outright: every per-file problem is logged
//! on the error channel and reported through [`LoadOutcome`], and the
//! shared [`ConfigMap`] keeps whatever value it held before.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::format::{FormatRegistry, Parser};
use crate::logging::Logger;
use crate::options::Encoding;
use crate::path::{derive_key, extension_of, is_binary_path, normalize_lossy, KeyStyle};
use crate::validation::{Validator, Verdict};

/// The live mapping from keys to decoded values.
///
/// Cloning the handle shares the underlying map. Readers always observe
/// whole values: each commit replaces one key under the write lock.
///
/// # Examples
///
/// ```
/// use confwatch::ConfigMap;
///
/// let configs = ConfigMap::new();
/// assert!(configs.is_empty());
/// assert!(configs.get("app").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigMap {
    inner: Arc<RwLock<HashMap<String, Value>>>,
}

impl ConfigMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    /// The value under `key`, deserialized into `T`.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the value does not fit `T`.
    /// A missing key yields `Ok(None)`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> serde_json::Result<Option<T>> {
        let guard = self.inner.read();
        guard.get(key).map(T::deserialize).transpose()
    }

    /// Whether a value is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// All keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether nothing has been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// A point-in-time copy of the whole map.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.inner.read().clone()
    }

    pub(crate) fn commit(&self, key: String, value: Value) {
        self.inner.write().insert(key, value);
    }
}

/// Per-call settings that take precedence over the loader's defaults.
#[derive(Debug, Clone, Default)]
pub struct LoadOverrides {
    /// Store under this key instead of one derived from the path.
    pub key: Option<String>,
    /// Decode with this parser instead of the extension-based one.
    pub parser: Option<Parser>,
    /// Reject values this validator does not accept.
    pub validator: Option<Validator>,
    /// Override the binary-loading default.
    pub allow_binary: Option<bool>,
}

/// What happened to one load attempt.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The value was committed under `key`.
    Loaded {
        /// Key the value is stored under.
        key: String,
    },
    /// The file does not exist; nothing changed.
    Missing,
    /// The file looks binary and binary loading is off; nothing changed.
    SkippedBinary,
    /// Reading, decoding or validation failed; nothing changed.
    Failed(Error),
}

impl LoadOutcome {
    /// Whether a value was committed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// The key a value was committed under, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Loaded { key } => Some(key),
            _ => None,
        }
    }

    /// The failure, if the attempt failed.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Defaults applied to every load.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderSettings {
    /// How file bytes become text.
    pub encoding: Encoding,
    /// How keys are derived when no name is given.
    pub key_style: KeyStyle,
    /// Whether binary-looking files are loaded.
    pub allow_binary: bool,
}

/// Loads files into a [`ConfigMap`].
#[derive(Debug, Clone)]
pub struct Loader {
    settings: LoaderSettings,
    formats: FormatRegistry,
    logger: Logger,
    configs: ConfigMap,
}

impl Loader {
    /// Create a loader committing into `configs`.
    #[must_use]
    pub fn new(
        settings: LoaderSettings,
        formats: FormatRegistry,
        logger: Logger,
        configs: ConfigMap,
    ) -> Self {
        Self {
            settings,
            formats,
            logger,
            configs,
        }
    }

    /// The map this loader writes to.
    #[must_use]
    pub fn configs(&self) -> &ConfigMap {
        &self.configs
    }

    /// The logger this loader reports to.
    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The loader's defaults.
    #[must_use]
    pub const fn settings(&self) -> LoaderSettings {
        self.settings
    }

    /// Load one file.
    ///
    /// # Examples
    ///
    /// ```
    /// use confwatch::{ConfigMap, FormatRegistry, LoadOverrides, Loader, LoaderSettings, Logger};
    /// use serde_json::json;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let path = dir.path().join("app.json");
    /// std::fs::write(&path, r#"{"port": 8080}"#).unwrap();
    ///
    /// let configs = ConfigMap::new();
    /// let loader = Loader::new(
    ///     LoaderSettings::default(),
    ///     FormatRegistry::new(),
    ///     Logger::default(),
    ///     configs.clone(),
    /// );
    /// assert!(loader.load(&path, &LoadOverrides::default()).is_loaded());
    /// assert_eq!(configs.get("app"), Some(json!({ "port": 8080 })));
    /// ```
    pub fn load(&self, path: &Path, overrides: &LoadOverrides) -> LoadOutcome {
        let path = normalize_lossy(path);

        if !path.exists() {
            self.logger
                .debug(&format!("[LOAD] File {} does not exist", path.display()));
            return LoadOutcome::Missing;
        }

        let allow_binary = overrides.allow_binary.unwrap_or(self.settings.allow_binary);
        if !allow_binary && is_binary_path(&path) {
            self.logger
                .debug(&format!("[LOAD] Ignoring binary file {}", path.display()));
            return LoadOutcome::SkippedBinary;
        }

        self.logger
            .debug(&format!("[LOAD] (Re)Loading file {}...", path.display()));

        match self.try_load(&path, overrides) {
            Ok(key) => {
                self.logger.debug(&format!(
                    "[LOAD] Successfully (re)loaded file {} as '{key}'",
                    path.display()
                ));
                LoadOutcome::Loaded { key }
            }
            Err(err) => {
                self.logger.error(&err.to_string());
                LoadOutcome::Failed(err)
            }
        }
    }

    fn try_load(&self, path: &Path, overrides: &LoadOverrides) -> Result<String> {
        let bytes = fs::read(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = self.settings.encoding.decode(&bytes);

        let value = self
            .formats
            .dispatch(&text, &extension_of(path), overrides.parser.as_ref())
            .map_err(|e| Error::Decode {
                path: path.to_path_buf(),
                message: format!("{e:#}"),
            })?;

        if let Some(validator) = &overrides.validator {
            if let Verdict::Reject { reason } = validator.check(&value) {
                return Err(Error::Validation {
                    path: path.to_path_buf(),
                    reason,
                });
            }
        }

        let key = overrides
            .key
            .clone()
            .unwrap_or_else(|| derive_key(path, self.settings.key_style));
        self.configs.commit(key.clone(), value);
        Ok(key)
    }
}

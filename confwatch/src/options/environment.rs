//! Environment variable handling for option overrides.
//!
//! `CONFWATCH_*` variables take precedence over both the programmatic
//! defaults and any manifest.

use std::env;

use super::schema::Encoding;
use super::ConfigParserOptions;
use crate::error::{Error, Result};
use crate::logging::{LogLevel, LoggingOptions, LOG_MODE_VAR};

/// Overrides the global hot-reload default.
pub const HOT_RELOAD_VAR: &str = "CONFWATCH_HOT_RELOAD";
/// Overrides the global binary-loading default.
pub const ALLOW_BINARY_VAR: &str = "CONFWATCH_ALLOW_BINARY";
/// Overrides `conserve_extensions`.
pub const CONSERVE_EXTENSIONS_VAR: &str = "CONFWATCH_CONSERVE_EXTENSIONS";
/// Overrides `conserve_paths`.
pub const CONSERVE_PATHS_VAR: &str = "CONFWATCH_CONSERVE_PATHS";
/// Overrides the text encoding.
pub const ENCODING_VAR: &str = "CONFWATCH_ENCODING";

/// Applies `CONFWATCH_*` environment variables to options.
///
/// # Examples
///
/// ```no_run
/// use confwatch::{ConfigParserOptions, EnvironmentOverrides};
///
/// let mut options = ConfigParserOptions::default();
/// EnvironmentOverrides::apply(&mut options).unwrap();
/// ```
pub struct EnvironmentOverrides;

impl EnvironmentOverrides {
    /// Apply every recognized variable that is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSetting`] naming the variable if a value
    /// cannot be parsed.
    pub fn apply(options: &mut ConfigParserOptions) -> Result<()> {
        if let Ok(val) = env::var(HOT_RELOAD_VAR) {
            options.hot_reload = Self::parse_bool(HOT_RELOAD_VAR, &val)?;
        }

        if let Ok(val) = env::var(ALLOW_BINARY_VAR) {
            options.allow_binary = Self::parse_bool(ALLOW_BINARY_VAR, &val)?;
        }

        if let Ok(val) = env::var(CONSERVE_EXTENSIONS_VAR) {
            options.conserve_extensions = Self::parse_bool(CONSERVE_EXTENSIONS_VAR, &val)?;
        }

        if let Ok(val) = env::var(CONSERVE_PATHS_VAR) {
            options.conserve_paths = Self::parse_bool(CONSERVE_PATHS_VAR, &val)?;
        }

        if let Ok(val) = env::var(ENCODING_VAR) {
            options.encoding = Encoding::parse(val.trim()).map_err(|message| Error::InvalidSetting {
                field: ENCODING_VAR.into(),
                message,
            })?;
        }

        if let Ok(val) = env::var(LOG_MODE_VAR) {
            let level = LogLevel::parse(val.trim()).map_err(|message| Error::InvalidSetting {
                field: LOG_MODE_VAR.into(),
                message,
            })?;
            options.logging = LoggingOptions::from_level(level);
        }

        Ok(())
    }

    /// Parse a boolean value from a string.
    ///
    /// Accepts: true/1/yes/on for true, false/0/no/off for false (case-insensitive).
    fn parse_bool(field: &str, s: &str) -> Result<bool> {
        match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::InvalidSetting {
                field: field.into(),
                message: format!(
                    "Invalid boolean value: '{s}' (expected true/false/1/0/yes/no/on/off)"
                ),
            }),
        }
    }
}

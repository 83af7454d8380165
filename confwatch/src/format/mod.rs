//! Format dispatch: turning file text into a [`Value`].
//!
//! Decoders are selected purely by file extension, never by content. The
//! resolution order for a file is:
//!
//! 1. the per-source parser, when the source declares one
//! 2. a global parser registered for the extension
//! 3. the built-in decoder for the extension
//! 4. the raw-text fallback, which stores the text unchanged
//!
//! | Extension          | Built-in decoder        |
//! |--------------------|-------------------------|
//! | `.json`            | strict JSON             |
//! | `.jsonc`           | JSON with comments      |
//! | `.ini`             | INI                     |
//! | `.yaml`, `.yml`    | YAML                    |
//! | `.toml`            | TOML                    |
//! | `.xml`             | XML element tree        |
//!
//! `.js` modules cannot be evaluated; register a parser for `.js` if such
//! files need more than their raw text.
//!
//! # Examples
//!
//! ```
//! use confwatch::format::FormatRegistry;
//! use serde_json::json;
//!
//! let registry = FormatRegistry::new();
//! let value = registry.dispatch("port = 8080", ".toml", None).unwrap();
//! assert_eq!(value, json!({ "port": 8080 }));
//!
//! let raw = registry.dispatch("hello", ".txt", None).unwrap();
//! assert_eq!(raw, json!("hello"));
//! ```

mod ini;
mod xml;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

pub use self::ini::IniDecoder;
pub use self::xml::XmlDecoder;

/// Something that decodes file text into a structured value.
///
/// Implemented for any `Fn(&str) -> anyhow::Result<Value>`, so plain
/// closures can be used as custom parsers.
pub trait Decoder: Send + Sync {
    /// Decode the full text of one file.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed for this format.
    fn decode(&self, text: &str) -> anyhow::Result<Value>;
}

impl<F> Decoder for F
where
    F: Fn(&str) -> anyhow::Result<Value> + Send + Sync,
{
    fn decode(&self, text: &str) -> anyhow::Result<Value> {
        self(text)
    }
}

/// A shareable handle to a [`Decoder`], as stored in options.
///
/// # Examples
///
/// ```
/// use confwatch::format::Parser;
/// use serde_json::{json, Value};
///
/// let upper = Parser::from_fn(|text| Ok(Value::String(text.to_uppercase())));
/// assert_eq!(upper.decode("abc").unwrap(), json!("ABC"));
/// ```
#[derive(Clone)]
pub struct Parser(Arc<dyn Decoder>);

impl Parser {
    /// Wrap a decoder.
    pub fn new(decoder: impl Decoder + 'static) -> Self {
        Self(Arc::new(decoder))
    }

    /// Wrap a closure. Unlike [`Parser::new`], the closure's signature is
    /// inferred, so `|text| Ok(...)` needs no annotations.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Decode text with the wrapped decoder.
    ///
    /// # Errors
    ///
    /// Propagates the decoder's error.
    pub fn decode(&self, text: &str) -> anyhow::Result<Value> {
        self.0.decode(text)
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Parser(..)")
    }
}

/// Strict JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, text: &str) -> anyhow::Result<Value> {
        Ok(serde_json::from_str(text)?)
    }
}

/// JSON with `//` and `/* */` comments.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsoncDecoder;

impl Decoder for JsoncDecoder {
    fn decode(&self, text: &str) -> anyhow::Result<Value> {
        let stripped = json_comments::StripComments::new(text.as_bytes());
        Ok(serde_json::from_reader(stripped)?)
    }
}

/// YAML.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlDecoder;

impl Decoder for YamlDecoder {
    fn decode(&self, text: &str) -> anyhow::Result<Value> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// TOML. Datetimes are rendered as their RFC 3339 strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlDecoder;

impl Decoder for TomlDecoder {
    fn decode(&self, text: &str) -> anyhow::Result<Value> {
        let table: toml::Table = toml::from_str(text)?;
        Ok(toml_to_json(toml::Value::Table(table)))
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// The fallback decoder: the text itself, as a string value.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawTextDecoder;

impl Decoder for RawTextDecoder {
    fn decode(&self, text: &str) -> anyhow::Result<Value> {
        Ok(Value::String(text.to_owned()))
    }
}

/// Give an extension its leading dot.
fn dotted(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_owned()
    } else {
        format!(".{extension}")
    }
}

/// Key for the override table: lowercase, with a leading dot.
fn extension_key(extension: &str) -> String {
    dotted(&extension.to_ascii_lowercase())
}

/// Extension-keyed decoder table with global overrides and a raw-text
/// fallback.
#[derive(Clone)]
pub struct FormatRegistry {
    builtin: HashMap<&'static str, Parser>,
    overrides: HashMap<String, Parser>,
    fallback: Parser,
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builtin: Vec<_> = self.builtin.keys().collect();
        builtin.sort();
        let mut overrides: Vec<_> = self.overrides.keys().collect();
        overrides.sort();
        f.debug_struct("FormatRegistry")
            .field("builtin", &builtin)
            .field("overrides", &overrides)
            .finish_non_exhaustive()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// A registry holding only the built-in decoders.
    #[must_use]
    pub fn new() -> Self {
        let builtin = HashMap::from([
            (".json", Parser::new(JsonDecoder)),
            (".jsonc", Parser::new(JsoncDecoder)),
            (".ini", Parser::new(IniDecoder)),
            (".yaml", Parser::new(YamlDecoder)),
            (".yml", Parser::new(YamlDecoder)),
            (".toml", Parser::new(TomlDecoder)),
            (".xml", Parser::new(XmlDecoder)),
        ]);

        Self {
            builtin,
            overrides: HashMap::new(),
            fallback: Parser::new(RawTextDecoder),
        }
    }

    /// A registry with global per-extension overrides on top of the
    /// built-ins. Keys may be given with or without the leading dot.
    #[must_use]
    pub fn with_overrides(overrides: &HashMap<String, Parser>) -> Self {
        let mut registry = Self::new();
        for (extension, parser) in overrides {
            registry.register(extension, parser.clone());
        }
        registry
    }

    /// Register (or replace) the global parser for an extension.
    pub fn register(&mut self, extension: &str, parser: Parser) {
        self.overrides.insert(extension_key(extension), parser);
    }

    /// Select the decoder for an extension, ignoring per-source parsers.
    ///
    /// Overrides match regardless of case; built-ins only match the
    /// lowercase extension, so `APP.JSON` falls back to raw text.
    #[must_use]
    pub fn resolve(&self, extension: &str) -> &Parser {
        self.overrides
            .get(&extension_key(extension))
            .or_else(|| self.builtin.get(dotted(extension).as_str()))
            .unwrap_or(&self.fallback)
    }

    /// Decode `text` using the first matching decoder.
    ///
    /// # Errors
    ///
    /// Propagates the selected decoder's error.
    pub fn dispatch(
        &self,
        text: &str,
        extension: &str,
        per_source: Option<&Parser>,
    ) -> anyhow::Result<Value> {
        per_source
            .unwrap_or_else(|| self.resolve(extension))
            .decode(text)
    }
}

//! Validation of decoded configuration values.
//!
//! Three validator shapes are supported and normalized into a single
//! [`Verdict`]:
//!
//! - [`Validator::Schema`]: a schema whose `validate` call returns the value
//!   or a [`SchemaError`]; the rejection reason is the error message.
//! - [`Validator::SafeParse`]: a schema whose `safe_parse` call returns the
//!   value or a list of [`Issue`]s; the rejection reason lists every issue
//!   as `path: message`.
//! - [`Validator::Predicate`]: a plain boolean function; rejections carry no
//!   reason.
//!
//! The shape is chosen when the validator is constructed, so any validation
//! library can be adapted by implementing [`SchemaValidate`] or
//! [`SafeParse`] for it.
//!
//! # Examples
//!
//! ```
//! use confwatch::validation::{TypedSchema, Validator, Verdict};
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct Server {
//!     #[allow(dead_code)]
//!     port: u16,
//! }
//!
//! let validator = Validator::schema(TypedSchema::<Server>::new());
//! assert_eq!(validator.check(&json!({ "port": 8080 })), Verdict::Accept);
//! assert!(validator.check(&json!({ "port": "high" })).is_reject());
//!
//! let positive = Validator::predicate(|v| v.as_i64().is_some_and(|n| n > 0));
//! assert_eq!(positive.check(&json!(-3)), Verdict::Reject { reason: None });
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Error reported by a [`SchemaValidate`] schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Human-readable description of what is wrong.
    pub message: String,
}

impl SchemaError {
    /// Create a schema error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// One problem reported by a [`SafeParse`] schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Location of the offending field, outermost first. Empty for the root.
    pub path: Vec<String>,
    /// What is wrong with it.
    pub message: String,
}

impl Issue {
    /// Create an issue at a dotted path (`"server.port"`, or `""` for the
    /// root).
    pub fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path.join("."), self.message)
        }
    }
}

/// Schema with a `validate` call (value or error).
pub trait SchemaValidate: Send + Sync {
    /// Validate a value.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] describing why the value is rejected.
    fn validate(&self, value: &Value) -> Result<Value, SchemaError>;
}

/// Schema with a `safe_parse` call (value or list of issues).
pub trait SafeParse: Send + Sync {
    /// Parse a value without panicking.
    ///
    /// # Errors
    ///
    /// Returns every [`Issue`] found in the value.
    fn safe_parse(&self, value: &Value) -> Result<Value, Vec<Issue>>;
}

type PredicateFn = dyn Fn(&Value) -> bool + Send + Sync;

/// A validator in one of the three supported shapes.
#[derive(Clone)]
pub enum Validator {
    /// A schema exposing `validate`.
    Schema(Arc<dyn SchemaValidate>),
    /// A schema exposing `safe_parse`.
    SafeParse(Arc<dyn SafeParse>),
    /// A boolean predicate.
    Predicate(Arc<PredicateFn>),
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            Self::Schema(_) => "Schema",
            Self::SafeParse(_) => "SafeParse",
            Self::Predicate(_) => "Predicate",
        };
        write!(f, "Validator::{shape}(..)")
    }
}

/// Outcome of running a validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The value may be committed.
    Accept,
    /// The value must not be committed.
    Reject {
        /// Why, when the validator says.
        reason: Option<String>,
    },
}

impl Verdict {
    /// Whether this is a rejection.
    #[must_use]
    pub fn is_reject(&self) -> bool {
        matches!(self, Self::Reject { .. })
    }
}

impl Validator {
    /// Wrap a `validate`-style schema.
    pub fn schema(schema: impl SchemaValidate + 'static) -> Self {
        Self::Schema(Arc::new(schema))
    }

    /// Wrap a `safe_parse`-style schema.
    pub fn safe_parse(schema: impl SafeParse + 'static) -> Self {
        Self::SafeParse(Arc::new(schema))
    }

    /// Wrap a predicate.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    /// Run the validator against a decoded value.
    #[must_use]
    pub fn check(&self, value: &Value) -> Verdict {
        match self {
            Self::Schema(schema) => match schema.validate(value) {
                Ok(_) => Verdict::Accept,
                Err(err) => Verdict::Reject {
                    reason: Some(err.message),
                },
            },
            Self::SafeParse(schema) => match schema.safe_parse(value) {
                Ok(_) => Verdict::Accept,
                Err(issues) => Verdict::Reject {
                    reason: Some(
                        issues
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join("; "),
                    ),
                },
            },
            Self::Predicate(predicate) => {
                if predicate(value) {
                    Verdict::Accept
                } else {
                    Verdict::Reject { reason: None }
                }
            }
        }
    }
}

/// A `validate`-style schema accepting any value that deserializes into `T`.
pub struct TypedSchema<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    /// Create the schema.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SchemaValidate for TypedSchema<T>
where
    T: DeserializeOwned,
{
    fn validate(&self, value: &Value) -> Result<Value, SchemaError> {
        T::deserialize(value)
            .map(|_| value.clone())
            .map_err(|e| SchemaError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    #[allow(dead_code)]
    struct Database {
        host: String,
        port: u16,
    }

    struct RequiredKeys(&'static [&'static str]);

    impl SafeParse for RequiredKeys {
        fn safe_parse(&self, value: &Value) -> Result<Value, Vec<Issue>> {
            let issues: Vec<Issue> = self
                .0
                .iter()
                .filter(|key| value.get(**key).is_none())
                .map(|key| Issue::new(key, "Required"))
                .collect();
            if issues.is_empty() {
                Ok(value.clone())
            } else {
                Err(issues)
            }
        }
    }

    #[test]
    fn test_typed_schema_accepts_matching_value() {
        let validator = Validator::schema(TypedSchema::<Database>::new());
        let verdict = validator.check(&json!({ "host": "localhost", "port": 5432 }));
        assert_eq!(verdict, Verdict::Accept);
    }

    #[test]
    fn test_typed_schema_reports_serde_message() {
        let validator = Validator::schema(TypedSchema::<Database>::new());
        let Verdict::Reject { reason: Some(reason) } = validator.check(&json!({ "host": "x" }))
        else {
            panic!("expected a rejection with a reason");
        };
        assert!(reason.contains("port"), "unexpected reason: {reason}");
    }

    #[test]
    fn test_safe_parse_joins_issues() {
        let validator = Validator::safe_parse(RequiredKeys(&["host", "port"]));
        let verdict = validator.check(&json!({}));
        assert_eq!(
            verdict,
            Verdict::Reject {
                reason: Some("host: Required; port: Required".to_string())
            }
        );
    }

    #[test]
    fn test_safe_parse_accepts() {
        let validator = Validator::safe_parse(RequiredKeys(&["host"]));
        assert_eq!(validator.check(&json!({ "host": "a" })), Verdict::Accept);
    }

    #[test]
    fn test_predicate_has_no_reason() {
        let validator = Validator::predicate(Value::is_object);
        assert_eq!(validator.check(&json!({})), Verdict::Accept);
        assert_eq!(validator.check(&json!("text")), Verdict::Reject { reason: None });
    }

    #[test]
    fn test_issue_display() {
        assert_eq!(Issue::new("server.port", "Expected number").to_string(), "server.port: Expected number");
        assert_eq!(Issue::new("", "Expected object").to_string(), "(root): Expected object");
    }

    #[test]
    fn test_debug_names_the_shape() {
        let validator = Validator::predicate(|_| true);
        assert_eq!(format!("{validator:?}"), "Validator::Predicate(..)");
    }
}

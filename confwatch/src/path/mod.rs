//! Path handling: source identity, key derivation and binary detection.
//!
//! # Source identity
//!
//! A file declared explicitly and the same file discovered through a folder
//! pattern must be recognized as one source. Identity is decided by comparing
//! normalized absolute forms (see [`normalize`](normalize::normalize)):
//!
//! ```
//! use confwatch::path::same_source;
//! use std::path::Path;
//!
//! assert!(same_source(Path::new("/srv/conf/app.json"), Path::new("/srv/conf/./x/../app.json")));
//! assert!(!same_source(Path::new("/srv/conf/app.json"), Path::new("/srv/app.json")));
//! ```
//!
//! # Keys
//!
//! Files discovered through folders are stored under a key derived from
//! their path according to a [`KeyStyle`]; see [`derive_key`].

mod binary;
mod key;
pub mod normalize;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use binary::is_binary_path;
pub use key::{derive_key, extension_of, KeyStyle};
pub use normalize::{normalize, normalize_lossy, real_alias};

use std::path::Path;

/// Whether two paths denote the same source once normalized.
#[must_use]
pub fn same_source(a: &Path, b: &Path) -> bool {
    normalize_lossy(a) == normalize_lossy(b)
}

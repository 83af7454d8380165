//! Property-based tests for key derivation and source identity.

use super::*;
use proptest::prelude::*;
use std::path::{Path, PathBuf};

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,8}"
}

fn file_name() -> impl Strategy<Value = (String, Option<String>)> {
    (segment(), prop::option::of("[a-z]{1,5}"))
}

fn absolute_dir() -> impl Strategy<Value = PathBuf> {
    prop::collection::vec(segment(), 1..=4).prop_map(|parts| PathBuf::from(format!("/{}", parts.join("/"))))
}

proptest! {
    // The default key is the file name without its last extension.
    #[test]
    fn default_key_is_stem((stem, ext) in file_name(), dir in absolute_dir()) {
        let name = ext.as_ref().map_or_else(|| stem.clone(), |e| format!("{stem}.{e}"));
        let path = dir.join(&name);
        prop_assert_eq!(derive_key(&path, KeyStyle::default()), stem);
    }

    // Conserving extensions yields the full file name.
    #[test]
    fn conserved_key_is_file_name((stem, ext) in file_name(), dir in absolute_dir()) {
        let name = ext.as_ref().map_or_else(|| stem.clone(), |e| format!("{stem}.{e}"));
        let style = KeyStyle { conserve_extensions: true, conserve_paths: false };
        prop_assert_eq!(derive_key(&dir.join(&name), style), name);
    }

    // Path keys distinguish files that share a name.
    #[test]
    fn path_keys_are_unique(a in absolute_dir(), b in absolute_dir(), name in segment()) {
        prop_assume!(a != b);
        let style = KeyStyle { conserve_extensions: false, conserve_paths: true };
        prop_assert_ne!(derive_key(&a.join(&name), style), derive_key(&b.join(&name), style));
    }

    // Inserting `./` and `x/..` does not change a path's identity.
    #[test]
    fn dotted_forms_are_the_same_source(dir in absolute_dir(), name in segment(), detour in segment()) {
        let plain = dir.join(&name);
        let dotted = dir.join(".").join(&detour).join("..").join(&name);
        prop_assert!(same_source(&plain, &dotted));
        prop_assert!(same_source(Path::new(&plain), &plain));
    }
}

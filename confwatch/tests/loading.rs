//! Integration tests for the initial load pass.
//!
//! These cover how declared files and folder patterns end up in the live
//! map: keys, decoders, validation, binary handling and failure isolation.
//! Tests that change the current directory are `#[serial]`.

mod common;

use std::fs;

use serde::Deserialize;
use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;

use common::{quiet_options, write_file, CapturingSink, CwdGuard};
use confwatch::{
    ConfigParser, Encoding, FileSource, FolderSource, LoggingOptions, Parser, TypedSchema,
    Validator,
};

fn open(options: confwatch::ConfigParserOptions) -> ConfigParser {
    ConfigParser::open(options.hot_reload(false)).unwrap()
}

#[test]
fn test_declared_json_file() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "app.json", r#"{"port": 8080}"#);

    let parser = open(quiet_options().file("app", FileSource::new(&path)));

    assert_eq!(parser.configs().keys(), vec!["app".to_string()]);
    assert_eq!(parser.get("app"), Some(json!({ "port": 8080 })));
}

#[test]
#[serial]
fn test_relative_folder_pattern() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "conf/db.yaml", "host: localhost\nport: 5432\n");
    write_file(temp.path(), "conf/notes.txt", "ignored by the pattern");
    let _cwd = CwdGuard::enter(temp.path());

    let parser = open(quiet_options().folder(FolderSource::new("./conf/*.yaml")));

    assert_eq!(parser.configs().keys(), vec!["db".to_string()]);
    assert_eq!(parser.get("db"), Some(json!({ "host": "localhost", "port": 5432 })));
}

#[test]
fn test_conserve_extensions_and_paths() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "conf/db.yaml", "host: a\n");
    let pattern = format!("{}/conf/*.yaml", temp.path().display());

    let parser = open(
        quiet_options()
            .folder(FolderSource::new(pattern.clone()))
            .conserve_extensions(true),
    );
    assert_eq!(parser.configs().keys(), vec!["db.yaml".to_string()]);

    let parser = open(
        quiet_options()
            .folder(FolderSource::new(pattern))
            .conserve_paths(true),
    );
    assert_eq!(
        parser.configs().keys(),
        vec![path.to_string_lossy().into_owned()]
    );
}

#[test]
fn test_same_file_name_in_two_folders_keeps_both_under_path_keys() {
    let temp = TempDir::new().unwrap();
    let primary = write_file(temp.path(), "primary/db.yaml", "host: a\n");
    let replica = write_file(temp.path(), "replica/db.yaml", "host: b\n");

    let parser = open(
        quiet_options()
            .folder(FolderSource::new(format!("{}/primary/*.yaml", temp.path().display())))
            .folder(FolderSource::new(format!("{}/replica/*.yaml", temp.path().display())))
            .conserve_paths(true),
    );

    let primary_key = primary.to_string_lossy().into_owned();
    let replica_key = replica.to_string_lossy().into_owned();
    let mut expected = vec![primary_key.clone(), replica_key.clone()];
    expected.sort();
    assert_eq!(parser.configs().keys(), expected);
    assert_eq!(parser.get(&primary_key), Some(json!({ "host": "a" })));
    assert_eq!(parser.get(&replica_key), Some(json!({ "host": "b" })));
}

#[test]
fn test_uppercase_extension_is_raw_text() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "APP.JSON", r#"{"v": 1}"#);

    let parser = open(quiet_options().file("app", FileSource::new(&path)));
    assert_eq!(parser.get("app"), Some(json!(r#"{"v": 1}"#)));
}

#[test]
fn test_every_builtin_format() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "a.json", r#"{"v": 1}"#);
    write_file(temp.path(), "b.jsonc", "{ /* c */ \"v\": 2 }");
    write_file(temp.path(), "c.ini", "v = true\n[s]\nk = x\n");
    write_file(temp.path(), "d.yml", "v: 4\n");
    write_file(temp.path(), "e.toml", "v = 5\n");
    write_file(temp.path(), "f.xml", "<root><v>6</v></root>");
    write_file(temp.path(), "g.txt", "plain");
    write_file(temp.path(), "h.js", "module.exports = {}");

    let pattern = format!("{}/*", temp.path().display());
    let parser = open(quiet_options().folder(FolderSource::new(pattern)));
    let configs = parser.configs();

    assert_eq!(configs.get("a"), Some(json!({ "v": 1 })));
    assert_eq!(configs.get("b"), Some(json!({ "v": 2 })));
    assert_eq!(configs.get("c"), Some(json!({ "v": true, "s": { "k": "x" } })));
    assert_eq!(configs.get("d"), Some(json!({ "v": 4 })));
    assert_eq!(configs.get("e"), Some(json!({ "v": 5 })));
    assert_eq!(configs.get("f"), Some(json!({ "root": { "v": 6 } })));
    assert_eq!(configs.get("g"), Some(json!("plain")));
    assert_eq!(configs.get("h"), Some(json!("module.exports = {}")));
}

#[test]
fn test_parser_precedence() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "app.json", r#"{"v": 1}"#);
    let other = write_file(temp.path(), "other.json", r#"{"v": 2}"#);

    let parser = open(
        quiet_options()
            .parser("json", Parser::from_fn(|_| Ok(json!("global"))))
            .file(
                "app",
                FileSource::new(&path).parser(Parser::from_fn(|_| Ok(json!("per-file")))),
            )
            .file("other", FileSource::new(&other)),
    );

    assert_eq!(parser.get("app"), Some(json!("per-file")));
    assert_eq!(parser.get("other"), Some(json!("global")));
}

#[test]
fn test_validation_failure_logged_once_and_not_stored() {
    #[derive(Deserialize)]
    #[allow(dead_code)]
    struct Database {
        host: String,
        port: u16,
    }

    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "db.json", r#"{"host": "x"}"#);
    let sink = CapturingSink::new();

    let parser = open(
        quiet_options()
            .logging(LoggingOptions::default())
            .log_sink(sink.clone())
            .file(
                "db",
                FileSource::new(&path).validator(Validator::schema(TypedSchema::<Database>::new())),
            ),
    );

    assert!(parser.get("db").is_none());
    let errors = sink.errors();
    assert_eq!(errors.len(), 1, "errors: {errors:?}");
    assert!(errors[0].starts_with("[ConfigParser] validation error in file "));
    assert!(errors[0].contains("port"));
}

#[test]
fn test_decode_failure_does_not_abort_other_files() {
    let temp = TempDir::new().unwrap();
    let broken = write_file(temp.path(), "broken.json", "{ nope");
    let good = write_file(temp.path(), "good.yaml", "ok: true\n");
    let sink = CapturingSink::new();

    let parser = open(
        quiet_options()
            .logging(LoggingOptions::default())
            .log_sink(sink.clone())
            .file("broken", FileSource::new(&broken))
            .file("good", FileSource::new(&good)),
    );

    assert!(parser.get("broken").is_none());
    assert_eq!(parser.get("good"), Some(json!({ "ok": true })));
    let errors = sink.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("failed to parse"));
}

#[test]
fn test_missing_file_is_silent() {
    let temp = TempDir::new().unwrap();
    let sink = CapturingSink::new();

    let parser = open(
        quiet_options()
            .logging(LoggingOptions::default())
            .log_sink(sink.clone())
            .file("absent", FileSource::new(temp.path().join("absent.json"))),
    );

    assert!(parser.is_running());
    assert!(parser.configs().is_empty());
    assert!(sink.errors().is_empty());
}

#[test]
fn test_binary_files() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
    write_file(temp.path(), "app.json", "{}");
    let pattern = format!("{}/*", temp.path().display());

    let parser = open(quiet_options().folder(FolderSource::new(pattern.clone())));
    assert_eq!(parser.configs().keys(), vec!["app".to_string()]);

    let parser = open(quiet_options().folder(FolderSource::new(pattern).allow_binary(true)));
    assert_eq!(
        parser.configs().keys(),
        vec!["app".to_string(), "logo".to_string()]
    );
}

#[test]
fn test_folder_tables_by_name_and_stem() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "db.yaml", "host: a\n");
    write_file(temp.path(), "cache.yaml", "size: 1\n");
    let pattern = format!("{}/*.yaml", temp.path().display());

    let parser = open(
        quiet_options().folder(
            FolderSource::new(pattern)
                .parser("cache.yaml", Parser::from_fn(|_| Ok(json!("custom"))))
                .validator("db", Validator::predicate(|v| v.get("port").is_some())),
        ),
    );

    assert!(parser.get("db").is_none());
    assert_eq!(parser.get("cache"), Some(json!("custom")));
}

#[test]
fn test_latin1_encoding() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("motd.txt");
    fs::write(&path, [b'c', b'a', b'f', 0xe9]).unwrap();

    let parser = open(
        quiet_options()
            .encoding(Encoding::Latin1)
            .file("motd", FileSource::new(&path)),
    );
    assert_eq!(parser.get("motd"), Some(json!("café")));
}

#[test]
fn test_explicit_reload_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "app.toml", "port = 1\n");

    let parser = open(quiet_options().file("app", FileSource::new(&path)));
    let before = parser.configs().snapshot();

    let outcome = parser.reload(&path).unwrap();
    assert_eq!(outcome.key(), Some("app"));
    assert_eq!(parser.configs().snapshot(), before);
}

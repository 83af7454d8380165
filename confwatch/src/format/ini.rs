//! INI decoding.
//!
//! Keys outside any section land at the top level, `[section]` becomes a
//! nested object and dotted section names (`[a.b]`) nest further. Keys
//! ending in `[]` collect their values into an array. `true`, `false` and
//! `null` are converted; every other value stays a string.

use anyhow::Context;
use ini::Ini;
use serde_json::{Map, Value};

use super::Decoder;

/// INI decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct IniDecoder;

impl Decoder for IniDecoder {
    fn decode(&self, text: &str) -> anyhow::Result<Value> {
        let parsed = Ini::load_from_str(text).context("malformed INI")?;
        let mut root = Map::new();

        for (section, properties) in &parsed {
            let target = match section {
                None => &mut root,
                Some(name) => section_object(&mut root, name)?,
            };
            for (key, raw) in properties.iter() {
                insert_property(target, key, raw);
            }
        }

        Ok(Value::Object(root))
    }
}

/// Walk (creating as needed) the object for a possibly dotted section name.
fn section_object<'a>(root: &'a mut Map<String, Value>, name: &str) -> anyhow::Result<&'a mut Map<String, Value>> {
    let mut current = root;
    for part in name.split('.') {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match entry {
            Value::Object(map) => map,
            _ => anyhow::bail!("section [{name}] collides with key '{part}'"),
        };
    }
    Ok(current)
}

fn insert_property(target: &mut Map<String, Value>, key: &str, raw: &str) {
    let value = scalar(raw);
    if let Some(list_key) = key.strip_suffix("[]") {
        match target
            .entry(list_key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(items) => items.push(value),
            other => *other = Value::Array(vec![other.take(), value]),
        }
    } else {
        target.insert(key.to_string(), value);
    }
}

fn scalar(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        other => Value::String(other.to_string()),
    }
}

//! XML decoding into an element tree.
//!
//! The document becomes an object keyed by root element name. Within an
//! element, child elements become members (repeated names collect into an
//! array), text-only elements become scalars, and text mixed with child
//! elements is kept under `#text`. Attributes, comments, processing
//! instructions and the XML declaration are ignored.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Number, Value};

use super::Decoder;

/// Key under which text mixed with child elements is stored.
const TEXT_KEY: &str = "#text";

/// XML decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlDecoder;

struct Element {
    name: String,
    text: String,
    children: Map<String, Value>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Map::new(),
        }
    }

    fn into_value(mut self) -> Value {
        let text = self.text.trim();
        if self.children.is_empty() {
            return scalar(text);
        }
        if !text.is_empty() {
            self.children.insert(TEXT_KEY.to_string(), scalar(text));
        }
        Value::Object(self.children)
    }
}

impl Decoder for XmlDecoder {
    fn decode(&self, text: &str) -> anyhow::Result<Value> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut root = Map::new();
        let mut stack: Vec<Element> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    stack.push(Element::new(name));
                }
                Event::Empty(empty) => {
                    let name = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                    let parent = stack.last_mut().map_or(&mut root, |e| &mut e.children);
                    attach(parent, name, Value::String(String::new()));
                }
                Event::Text(content) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&content.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::End(_) => {
                    let Some(element) = stack.pop() else {
                        anyhow::bail!("unexpected closing tag");
                    };
                    let name = element.name.clone();
                    let value = element.into_value();
                    let parent = stack.last_mut().map_or(&mut root, |e| &mut e.children);
                    attach(parent, name, value);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(unclosed) = stack.last() {
            anyhow::bail!("unclosed element <{}>", unclosed.name);
        }

        Ok(Value::Object(root))
    }
}

/// Add a child, turning repeated names into arrays.
fn attach(parent: &mut Map<String, Value>, name: String, value: Value) {
    match parent.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.insert(name, value);
        }
    }
}

/// Coerce element text: booleans and plain decimal numbers are converted,
/// everything else (including numbers with leading zeros) stays a string.
fn scalar(text: &str) -> Value {
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    let digits = text.trim_start_matches('-');
    let leading_zero = digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.");
    if !leading_zero {
        if let Ok(int) = text.parse::<i64>() {
            return Value::from(int);
        }
        let looks_decimal = !text.is_empty()
            && text
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
        if looks_decimal {
            if let Some(number) = text.parse::<f64>().ok().and_then(Number::from_f64) {
                return Value::Number(number);
            }
        }
    }

    Value::String(text.to_string())
}

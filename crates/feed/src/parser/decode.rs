//! Wire-format decoding into a generic tree.
//!
//! Both formats decode into `serde_json::Value` so the extraction rules
//! downstream are format-agnostic. The XML walk maps attributes to
//! `@`-prefixed keys, element text to a string (or a `$text` key when the
//! element also has children), and repeated sibling elements to arrays.
//! A single child stays a plain value; the path resolver unwraps that
//! ambiguity in one place.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

use super::{FeedFormat, ParseError};

/// Decode feed bytes into a generic tree.
pub fn decode(bytes: &[u8], format: FeedFormat) -> Result<Value, ParseError> {
    match format {
        FeedFormat::Json => decode_json(bytes),
        FeedFormat::Xml => decode_xml(bytes),
    }
}

fn decode_json(bytes: &[u8]) -> Result<Value, ParseError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| ParseError::Json(e.to_string()))?;
    if value.is_object() || value.is_array() {
        Ok(value)
    } else {
        Err(ParseError::Json("top-level value must be an object or array".into()))
    }
}

struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

fn decode_xml(bytes: &[u8]) -> Result<Value, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    let config = reader.config_mut();
    config.trim_text_start = true;
    config.trim_text_end = true;

    let mut stack: Vec<Frame> = Vec::new();
    let mut root = Map::new();
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| ParseError::Xml(e.to_string()))?
        {
            Event::Start(start) => stack.push(open_frame(&start)?),
            Event::Empty(start) => {
                let (name, value) = seal_frame(open_frame(&start)?);
                insert_into(&mut stack, &mut root, name, value);
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame
                        .text
                        .push_str(&text.unescape().map_err(|e| ParseError::Xml(e.to_string()))?);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| ParseError::Xml("unbalanced closing tag".into()))?;
                let (name, value) = seal_frame(frame);
                insert_into(&mut stack, &mut root, name, value);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ParseError::Xml("unexpected end of document".into()));
    }
    Ok(Value::Object(root))
}

fn open_frame(start: &BytesStart<'_>) -> Result<Frame, ParseError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut children = Map::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| ParseError::Xml(e.to_string()))?;
        let key = format!("@{}", String::from_utf8_lossy(attribute.key.local_name().as_ref()));
        let value = attribute
            .unescape_value()
            .map_err(|e| ParseError::Xml(e.to_string()))?
            .into_owned();
        children.insert(key, Value::String(value));
    }
    Ok(Frame { name, children, text: String::new() })
}

fn seal_frame(frame: Frame) -> (String, Value) {
    let Frame { name, mut children, text } = frame;
    let text = text.trim();
    let value = if children.is_empty() {
        if text.is_empty() { Value::Null } else { Value::String(text.to_owned()) }
    } else {
        if !text.is_empty() {
            children.insert("$text".to_owned(), Value::String(text.to_owned()));
        }
        Value::Object(children)
    };
    (name, value)
}

fn insert_into(stack: &mut [Frame], root: &mut Map<String, Value>, name: String, value: Value) {
    let target = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => root,
    };
    insert_child(target, name, value);
}

/// A repeated key promotes the slot to an array; later occurrences append.
fn insert_child(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        None => {
            map.insert(name, value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

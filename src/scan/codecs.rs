//! Decoders from raw text to [`Document`].
//!
//! Every decoder returns either a complete document or an error message; the
//! caller wraps the message into a parse error naming the file and format.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::{Map, Number, Value};

use super::format::FileType;
use crate::models::Document;

pub(crate) fn decode(file_type: FileType, contents: &str) -> Result<Document, String> {
    match file_type {
        FileType::Json => decode_json(contents),
        FileType::Yaml => decode_yaml(contents),
        FileType::Dotenv => decode_dotenv(contents),
        FileType::Properties => decode_properties(contents),
        FileType::Xml => decode_xml(contents),
    }
}

fn decode_json(contents: &str) -> Result<Document, String> {
    serde_json::from_str(contents).map_err(|e| e.to_string())
}

fn decode_yaml(contents: &str) -> Result<Document, String> {
    let value: serde_yaml::Value = serde_yaml::from_str(contents).map_err(|e| e.to_string())?;
    Ok(yaml_to_document(value))
}

/// Convert YAML into a document, turning every mapping key into a string
pub(crate) fn yaml_to_document(value: serde_yaml::Value) -> Document {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => yaml_number(&n),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_document).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping.into_iter().map(|(k, v)| (yaml_key(k), yaml_to_document(v))).collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_document(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or_else(|| Value::String(n.to_string()), Value::Number)
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Null => String::new(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        complex => serde_yaml::to_string(&complex)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn decode_dotenv(contents: &str) -> Result<Document, String> {
    let mut map = Map::new();
    for item in dotenvy::from_read_iter(contents.as_bytes()) {
        let (key, value) = item.map_err(|e| e.to_string())?;
        map.insert(key, Value::String(value));
    }
    Ok(Value::Object(map))
}

fn decode_properties(contents: &str) -> Result<Document, String> {
    let mut map = Map::new();
    let mut lines = contents.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = trimmed.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_property(&logical);
        let key = unescape_property(key).map_err(|e| format!("line {}: {e}", index + 1))?;
        let value = unescape_property(value).map_err(|e| format!("line {}: {e}", index + 1))?;
        map.insert(key, Value::String(value));
    }

    Ok(Value::Object(map))
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split at the first unescaped `=`, `:` or whitespace
fn split_property(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..index], line[index + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[index..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (&line[..index], rest.trim_start());
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape_property(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("invalid unicode escape '\\u{hex}'"))?;
                out.push(code);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

struct XmlElement {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

/// Decode XML the way config files are usually read: the root element is the
/// single top-level key, text-only elements are strings, repeated siblings
/// become lists and attributes become keys.
fn decode_xml(contents: &str) -> Result<Document, String> {
    let mut reader = Reader::from_str(contents);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(start) => stack.push(open_element(&start)?),
            Event::Empty(start) => {
                let element = open_element(&start)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or("unexpected closing tag")?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&text.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::CData(data) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element '{}'", open.name));
    }

    let (name, value) = root.ok_or("document has no root element")?;
    let mut map = Map::new();
    map.insert(name, value);
    Ok(Value::Object(map))
}

fn open_element(start: &BytesStart<'_>) -> Result<XmlElement, String> {
    let mut fields = Map::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).to_string();
        let value = attribute.unescape_value().map_err(|e| e.to_string())?;
        fields.insert(key, Value::String(value.to_string()));
    }

    Ok(XmlElement {
        name: String::from_utf8_lossy(start.name().as_ref()).to_string(),
        fields,
        text: String::new(),
    })
}

fn close_element(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<(String, Value)>,
) -> Result<(), String> {
    let XmlElement {
        name,
        mut fields,
        text,
    } = element;

    let value = if fields.is_empty() {
        if text.is_empty() { Value::Null } else { Value::String(text) }
    } else {
        if !text.is_empty() {
            fields.insert("__content__".to_string(), Value::String(text));
        }
        Value::Object(fields)
    };

    match stack.last_mut() {
        Some(parent) => {
            match parent.fields.remove(&name) {
                None => {
                    parent.fields.insert(name, value);
                }
                Some(Value::Array(mut items)) => {
                    items.push(value);
                    parent.fields.insert(name, Value::Array(items));
                }
                Some(existing) => {
                    parent.fields.insert(name, Value::Array(vec![existing, value]));
                }
            }
            Ok(())
        }
        None if root.is_some() => Err(format!("multiple root elements, found '{name}'")),
        None => {
            *root = Some((name, value));
            Ok(())
        }
    }
}

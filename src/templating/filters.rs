//! Domain filters for transform templates.
//!
//! Filters are plain functions with Tera's filter signature, grouped into a
//! [`FilterLibrary`] that the renderer registers on its engine. Arguments
//! are keyword arguments:
//!
//! ```text
//! {{ name | dns_safe }}
//! {{ data | to_yaml(no_header=true) | nindent(width=4) }}
//! {{ data | deflate(delimiter="_") }}
//! {{ key | re_replace(pattern="(\w+)-(\w+)", replacement="\2_\1", flags="i") }}
//! ```
//!
//! | filter | arguments |
//! |---|---|
//! | `dns_safe`, `env_safe`, `key_safe` | |
//! | `indent`, `nindent` | `width` |
//! | `to_json`, `stringify` | |
//! | `to_yaml` | `no_header` (default `false`) |
//! | `sha256`, `encode64`, `decode64` | |
//! | `deflate` | `delimiter` (default `.`) |
//! | `inflate` | `delimiter` regex (default `\.`) |
//! | `typify` | `parser` (`json` or `yaml`, default `json`) |
//! | `merge` | `with` |
//! | `re_replace` | `pattern`, `replacement`, `flags` |
//! | `re_contains` | `pattern`, `flags` |
//!
//! Regex flags: `i` case-insensitive, `m` multi-line, `s` dot matches
//! newline, `x` extended (whitespace and comments ignored).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

use crate::scan::yaml_to_document;

/// Signature shared by every filter
pub type FilterFn = fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>;

const STANDARD_FILTERS: &[(&str, FilterFn)] = &[
    ("dns_safe", dns_safe),
    ("env_safe", env_safe),
    ("key_safe", key_safe),
    ("indent", indent),
    ("nindent", nindent),
    ("to_json", to_json),
    ("stringify", stringify),
    ("to_yaml", to_yaml),
    ("sha256", sha256),
    ("encode64", encode64),
    ("decode64", decode64),
    ("deflate", deflate),
    ("inflate", inflate),
    ("typify", typify),
    ("merge", merge),
    ("re_replace", re_replace),
    ("re_contains", re_contains),
];

/// The set of filters a template may use.
///
/// The renderer registers exactly these; a template using a filter outside
/// the set fails to render.
#[derive(Clone)]
pub struct FilterLibrary {
    filters: Vec<(&'static str, FilterFn)>,
}

impl FilterLibrary {
    /// Every domain filter
    #[must_use]
    pub fn standard() -> Self {
        Self {
            filters: STANDARD_FILTERS.to_vec(),
        }
    }

    /// The named subset of the standard filters; unknown names are ignored
    #[must_use]
    pub fn only(names: &[&str]) -> Self {
        Self {
            filters: STANDARD_FILTERS
                .iter()
                .filter(|(name, _)| names.contains(name))
                .copied()
                .collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.filters.iter().map(|(name, _)| *name)
    }

    pub(crate) fn register(&self, tera: &mut tera::Tera) {
        for (name, filter) in &self.filters {
            tera.register_filter(name, *filter);
        }
    }
}

impl Default for FilterLibrary {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for FilterLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// String form of a value: strings as-is, null as empty, everything else as
/// JSON
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn pattern(filter: &str, source: &str) -> tera::Result<Regex> {
    Regex::new(source)
        .map_err(|e| tera::Error::msg(format!("{filter}: invalid pattern '{source}': {e}")))
}

fn string_arg(
    filter: &str,
    args: &HashMap<String, Value>,
    name: &str,
) -> tera::Result<Option<String>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(tera::Error::msg(format!(
            "{filter}: argument `{name}` must be a string, got {other}"
        ))),
    }
}

fn required_string_arg(
    filter: &str,
    args: &HashMap<String, Value>,
    name: &str,
) -> tera::Result<String> {
    string_arg(filter, args, name)?
        .ok_or_else(|| tera::Error::msg(format!("{filter}: missing required argument `{name}`")))
}

fn bool_arg(filter: &str, args: &HashMap<String, Value>, name: &str) -> tera::Result<bool> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(tera::Error::msg(format!(
            "{filter}: argument `{name}` must be a boolean, got {other}"
        ))),
    }
}

fn mapping<'a>(filter: &str, value: &'a Value) -> tera::Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        tera::Error::msg(format!("{filter}: expected a mapping, got {value}"))
    })
}

pub fn dns_safe(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value_to_string(value);
    let label = r"[a-z0-9]([a-z0-9-]*[a-z0-9])?";
    if pattern("dns_safe", &format!(r"^{label}(\.{label})*$"))?.is_match(&s) {
        return Ok(Value::String(s));
    }

    let lower = s.to_lowercase();
    let replaced = pattern("dns_safe", "[^-.a-z0-9]+")?.replace_all(&lower, "-");
    Ok(Value::String(replaced.trim_matches(|c: char| !c.is_ascii_alphanumeric()).to_string()))
}

pub fn env_safe(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value_to_string(value);
    if pattern("env_safe", "^[A-Z_][A-Z0-9_]*$")?.is_match(&s) {
        return Ok(Value::String(s));
    }

    let upper = s.to_uppercase();
    let stripped = pattern("env_safe", r"(\A[^A-Za-z0-9_]+)|([^A-Za-z0-9_]+\z)")?.replace_all(&upper, "");
    let joined = pattern("env_safe", "[^A-Za-z0-9_]+")?.replace_all(&stripped, "_");
    let result = if joined.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{joined}")
    } else {
        joined.into_owned()
    };
    Ok(Value::String(result))
}

pub fn key_safe(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value_to_string(value);
    if pattern("key_safe", r"^[A-Za-z0-9_.-]*$")?.is_match(&s) {
        return Ok(Value::String(s));
    }
    Ok(Value::String(pattern("key_safe", r"[^A-Za-z0-9_.-]+")?.replace_all(&s, "_").into_owned()))
}

fn indent_lines(filter: &str, value: &Value, args: &HashMap<String, Value>) -> tera::Result<String> {
    let width = args
        .get("width")
        .and_then(Value::as_u64)
        .ok_or_else(|| tera::Error::msg(format!("{filter}: `width` must be a non-negative integer")))?;
    let prefix = " ".repeat(usize::try_from(width).unwrap_or_default());

    let s = value_to_string(value);
    if s.is_empty() {
        return Ok(prefix);
    }
    Ok(s.split_inclusive('\n').map(|line| format!("{prefix}{line}")).collect())
}

pub fn indent(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    indent_lines("indent", value, args).map(Value::String)
}

pub fn nindent(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    indent_lines("nindent", value, args).map(|s| Value::String(format!("\n{s}")))
}

pub fn to_json(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    serde_json::to_string(value).map(Value::String).map_err(tera::Error::json)
}

/// The string form of the value as a JSON string literal, safe to embed in
/// YAML or JSON output
pub fn stringify(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    serde_json::to_string(&Value::String(value_to_string(value)))
        .map(Value::String)
        .map_err(tera::Error::json)
}

pub fn to_yaml(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let no_header = bool_arg("to_yaml", args, "no_header")?;
    let body = serde_yaml::to_string(value)
        .map_err(|e| tera::Error::msg(format!("to_yaml: {e}")))?;
    Ok(Value::String(if no_header { body } else { format!("---\n{body}") }))
}

pub fn sha256(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let digest = Sha256::digest(value_to_string(value).as_bytes());
    Ok(Value::String(hex::encode(digest)))
}

pub fn encode64(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(STANDARD.encode(value_to_string(value))))
}

pub fn decode64(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let bytes = STANDARD
        .decode(value_to_string(value))
        .map_err(|e| tera::Error::msg(format!("decode64: invalid base64: {e}")))?;
    String::from_utf8(bytes)
        .map(Value::String)
        .map_err(|e| tera::Error::msg(format!("decode64: decoded bytes are not UTF-8: {e}")))
}

fn flatten_into(prefix: Option<&str>, value: &Value, delimiter: &str, out: &mut Map<String, Value>) {
    if let Value::Object(map) = value {
        if map.is_empty() {
            if let Some(path) = prefix {
                out.insert(path.to_string(), Value::Object(Map::new()));
            }
            return;
        }
        for (key, child) in map {
            let path = prefix.map_or_else(|| key.clone(), |p| format!("{p}{delimiter}{key}"));
            flatten_into(Some(&path), child, delimiter, out);
        }
        return;
    }

    let leaf = match value {
        Value::Array(_) => Value::String(value.to_string()),
        Value::Null => Value::String(String::new()),
        scalar => scalar.clone(),
    };
    out.insert(prefix.unwrap_or_default().to_string(), leaf);
}

/// Flatten nested mappings into one level of delimiter-joined keys
pub fn deflate(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    mapping("deflate", value)?;
    let delimiter = string_arg("deflate", args, "delimiter")?.unwrap_or_else(|| ".".to_string());

    let mut out = Map::new();
    flatten_into(None, value, &delimiter, &mut out);
    Ok(Value::Object(out))
}

/// Nest a flat mapping by splitting keys on the delimiter regex
pub fn inflate(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let flat = mapping("inflate", value)?;
    let delimiter = string_arg("inflate", args, "delimiter")?.unwrap_or_else(|| r"\.".to_string());
    let splitter = pattern("inflate", &delimiter)?;

    let mut root = Map::new();
    for (key, leaf) in flat {
        let parts: Vec<&str> = splitter.split(key).collect();
        let Some((last, parents)) = parts.split_last() else {
            continue;
        };

        let mut node = &mut root;
        for part in parents {
            let slot = node.entry(part.to_string()).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            node = slot
                .as_object_mut()
                .ok_or_else(|| tera::Error::msg(format!("inflate: cannot nest under '{part}'")))?;
        }
        node.insert((*last).to_string(), leaf.clone());
    }
    Ok(Value::Object(root))
}

#[derive(Clone, Copy)]
enum EmbeddedParser {
    Json,
    Yaml,
}

impl EmbeddedParser {
    fn parse_structured(self, s: &str) -> Option<Value> {
        let parsed = match self {
            Self::Json => serde_json::from_str::<Value>(s).ok()?,
            Self::Yaml => yaml_to_document(serde_yaml::from_str(s).ok()?),
        };
        matches!(parsed, Value::Object(_) | Value::Array(_)).then_some(parsed)
    }
}

struct Typifier {
    parser: EmbeddedParser,
    integer: Regex,
    float: Regex,
}

impl Typifier {
    fn typify(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => self.typify_str(s),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.typify(v)).collect()),
            Value::Object(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), self.typify(v))).collect())
            }
            other => other.clone(),
        }
    }

    fn typify_str(&self, s: &str) -> Value {
        if self.integer.is_match(s) {
            if let Ok(i) = s.parse::<i64>() {
                return Value::Number(i.into());
            }
            if let Ok(u) = s.parse::<u64>() {
                return Value::Number(u.into());
            }
        }
        if self.float.is_match(s) {
            if let Some(n) = s.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                return Value::Number(n);
            }
        }
        if s.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if s.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        match self.parser.parse_structured(s) {
            Some(structured) => self.typify(&structured),
            None => Value::String(s.to_string()),
        }
    }
}

/// Coerce numeric and boolean strings and expand embedded structured data
pub fn typify(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let parser = match string_arg("typify", args, "parser")?.as_deref() {
        None | Some("json") => EmbeddedParser::Json,
        Some("yaml" | "yml") => EmbeddedParser::Yaml,
        Some(other) => {
            return Err(tera::Error::msg(format!(
                "typify: invalid parser '{other}', expected 'json' or 'yaml'"
            )));
        }
    };

    let typifier = Typifier {
        parser,
        integer: pattern("typify", r"^[-+]?\d+$")?,
        float: pattern("typify", r"^[-+]?(\d+\.\d*|\.\d+|\d+)([eE][-+]?\d+)?$")?,
    };
    Ok(typifier.typify(value))
}

/// Shallow right-biased merge
pub fn merge(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let other = match args.get("with") {
        None | Some(Value::Null) => return Ok(value.clone()),
        Some(other) => mapping("merge", other)?,
    };
    let mut merged = if value.is_null() { Map::new() } else { mapping("merge", value)?.clone() };
    for (key, v) in other {
        merged.insert(key.clone(), v.clone());
    }
    Ok(Value::Object(merged))
}

fn build_regex(filter: &str, args: &HashMap<String, Value>) -> tera::Result<Regex> {
    let source = required_string_arg(filter, args, "pattern")?;
    let flags = string_arg(filter, args, "flags")?.unwrap_or_default();

    let mut builder = RegexBuilder::new(&source);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => {
                return Err(tera::Error::msg(format!(
                    "{filter}: unsupported regex flag '{other}', expected any of 'imsx'"
                )));
            }
        };
    }
    builder
        .build()
        .map_err(|e| tera::Error::msg(format!("{filter}: invalid pattern '{source}': {e}")))
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

/// Rewrite a user replacement into `regex` expansion syntax.
///
/// `\N`, `$N` and `${name}` expand only when the group exists in `regex`;
/// `\\` is a literal backslash and every other `$` is literal.
fn expansion(replacement: &str, regex: &Regex) -> String {
    let group_count = regex.captures_len();
    let has_group = |name: &str| match name.parse::<usize>() {
        Ok(index) => index < group_count,
        Err(_) => regex.capture_names().flatten().any(|n| n == name),
    };

    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'\\') => {
                chars.next();
                out.push('\\');
            }
            '\\' if chars.peek().is_some_and(char::is_ascii_digit) => {
                let digits = take_digits(&mut chars);
                if has_group(&digits) {
                    out.push_str(&format!("${{{digits}}}"));
                } else {
                    out.push('\\');
                    out.push_str(&digits);
                }
            }
            '$' if chars.peek().is_some_and(char::is_ascii_digit) => {
                let digits = take_digits(&mut chars);
                if has_group(&digits) {
                    out.push_str(&format!("${{{digits}}}"));
                } else {
                    out.push_str("$$");
                    out.push_str(&digits);
                }
            }
            '$' if chars.peek() == Some(&'{') => {
                let rest: String = chars.clone().collect();
                match rest.find('}') {
                    Some(end) if has_group(&rest[1..end]) => {
                        out.push_str(&format!("${}", &rest[..=end]));
                        for _ in rest[..=end].chars() {
                            chars.next();
                        }
                    }
                    _ => out.push_str("$$"),
                }
            }
            '$' => out.push_str("$$"),
            other => out.push(other),
        }
    }
    out
}

/// Replace every match; `\1` and `$1` both refer to capture groups
pub fn re_replace(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let regex = build_regex("re_replace", args)?;
    let replacement = required_string_arg("re_replace", args, "replacement")?;
    let replacement = expansion(&replacement, &regex);

    let input = value_to_string(value);
    Ok(Value::String(regex.replace_all(&input, replacement.as_str()).into_owned()))
}

pub fn re_contains(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let regex = build_regex("re_contains", args)?;
    Ok(Value::Bool(regex.is_match(&value_to_string(value))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    fn no_args() -> HashMap<String, Value> {
        HashMap::new()
    }

    fn s(value: Value) -> String {
        value.as_str().unwrap().to_string()
    }

    #[test]
    fn test_library_subsets() {
        let all: Vec<_> = FilterLibrary::standard().names().collect();
        assert_eq!(all.len(), STANDARD_FILTERS.len());
        assert!(all.contains(&"typify"));

        let some: Vec<_> = FilterLibrary::only(&["dns_safe", "to_json", "bogus"]).names().collect();
        assert_eq!(some, vec!["dns_safe", "to_json"]);
    }

    #[test]
    fn test_dns_safe() {
        for valid in ["foo", "foo-bar", "foo.bar-baz", "a1.b2"] {
            assert_eq!(s(dns_safe(&json!(valid), &no_args()).unwrap()), valid);
        }
        assert_eq!(s(dns_safe(&json!("Foo_Bar"), &no_args()).unwrap()), "foo-bar");
        assert_eq!(s(dns_safe(&json!("--My App!!"), &no_args()).unwrap()), "my-app");
        assert_eq!(s(dns_safe(&json!("a  b__c"), &no_args()).unwrap()), "a-b-c");
    }

    #[test]
    fn test_env_safe() {
        for valid in ["FOO", "FOO_BAR", "_X1"] {
            assert_eq!(s(env_safe(&json!(valid), &no_args()).unwrap()), valid);
        }
        assert_eq!(s(env_safe(&json!("foo.bar-baz"), &no_args()).unwrap()), "FOO_BAR_BAZ");
        assert_eq!(s(env_safe(&json!("-foo bar-"), &no_args()).unwrap()), "FOO_BAR");
        assert_eq!(s(env_safe(&json!("1foo"), &no_args()).unwrap()), "_1FOO");
    }

    #[test]
    fn test_key_safe() {
        assert_eq!(s(key_safe(&json!("foo.bar-baz_1"), &no_args()).unwrap()), "foo.bar-baz_1");
        assert_eq!(s(key_safe(&json!("foo bar/@baz"), &no_args()).unwrap()), "foo_bar_baz");
    }

    #[test]
    fn test_indent_and_nindent() {
        let width = args(&[("width", json!(2))]);
        assert_eq!(s(indent(&json!("a\nb\n"), &width).unwrap()), "  a\n  b\n");
        assert_eq!(s(indent(&json!("a\nb"), &width).unwrap()), "  a\n  b");
        assert_eq!(s(nindent(&json!("a\nb"), &width).unwrap()), "\n  a\n  b");
        assert!(indent(&json!("a"), &no_args()).is_err());
    }

    #[test]
    fn test_to_json_and_stringify() {
        let data = json!({"a": [1, true, null]});
        assert_eq!(s(to_json(&data, &no_args()).unwrap()), r#"{"a":[1,true,null]}"#);
        assert_eq!(s(stringify(&json!("he said \"hi\"\n"), &no_args()).unwrap()), r#""he said \"hi\"\n""#);
        assert_eq!(s(stringify(&json!(42), &no_args()).unwrap()), r#""42""#);
        assert_eq!(s(stringify(&Value::Null, &no_args()).unwrap()), r#""""#);
    }

    #[test]
    fn test_to_yaml_header() {
        let data = json!({"foo": "bar"});
        assert_eq!(s(to_yaml(&data, &no_args()).unwrap()), "---\nfoo: bar\n");
        let bare = args(&[("no_header", json!(true))]);
        assert_eq!(s(to_yaml(&data, &bare).unwrap()), "foo: bar\n");
    }

    #[test]
    fn test_sha256_and_base64() {
        assert_eq!(
            s(sha256(&json!("foo"), &no_args()).unwrap()),
            "2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae"
        );
        assert_eq!(s(encode64(&json!("foo"), &no_args()).unwrap()), "Zm9v");
        assert_eq!(s(decode64(&json!("Zm9v"), &no_args()).unwrap()), "foo");
        assert!(decode64(&json!("Zm9"), &no_args()).is_err());
        assert!(decode64(&json!("not base64!"), &no_args()).is_err());
    }

    #[test]
    fn test_deflate() {
        let nested = json!({
            "a": {"b": {"c": "x"}, "d": 1},
            "list": [1, 2],
            "none": null,
            "flag": true
        });
        let flat = deflate(&nested, &no_args()).unwrap();
        assert_eq!(
            flat,
            json!({"a.b.c": "x", "a.d": 1, "list": "[1,2]", "none": "", "flag": true})
        );

        let underscore = deflate(&nested, &args(&[("delimiter", json!("_"))])).unwrap();
        assert_eq!(underscore["a_b_c"], json!("x"));
        assert!(deflate(&json!("scalar"), &no_args()).is_err());
    }

    #[test]
    fn test_inflate() {
        let flat = json!({"a.b.c": "x", "a.d": 1, "e": false});
        assert_eq!(
            inflate(&flat, &no_args()).unwrap(),
            json!({"a": {"b": {"c": "x"}, "d": 1}, "e": false})
        );

        let custom = inflate(&json!({"a__b": 1}), &args(&[("delimiter", json!("__"))])).unwrap();
        assert_eq!(custom, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_inflate_reverses_deflate() {
        let original = json!({
            "server": {"host": "localhost", "port": 8080, "tls": {"enabled": false}},
            "name": "app",
            "extra": {}
        });
        let flat = deflate(&original, &no_args()).unwrap();
        assert_eq!(flat["extra"], json!({}));
        assert_eq!(inflate(&flat, &no_args()).unwrap(), original);
    }

    #[test]
    fn test_typify() {
        let input = json!({
            "int": "42",
            "neg": "-7",
            "float": "1.5",
            "yes": "TRUE",
            "no": "false",
            "text": "hello",
            "embedded": "{\"port\": \"8080\", \"list\": [\"1\", \"x\"]}",
            "list": ["3", "true"]
        });
        assert_eq!(
            typify(&input, &no_args()).unwrap(),
            json!({
                "int": 42,
                "neg": -7,
                "float": 1.5,
                "yes": true,
                "no": false,
                "text": "hello",
                "embedded": {"port": 8080, "list": [1, "x"]},
                "list": [3, true]
            })
        );
    }

    #[test]
    fn test_typify_leaves_padded_strings() {
        let input = json!([" 42 ", "true ", "\t1.5"]);
        assert_eq!(typify(&input, &no_args()).unwrap(), input);
    }

    #[test]
    fn test_typify_yaml_parser() {
        let input = json!({"embedded": "port: '8080'\nhosts:\n  - a\n"});
        let result = typify(&input, &args(&[("parser", json!("yaml"))])).unwrap();
        assert_eq!(result, json!({"embedded": {"port": 8080, "hosts": ["a"]}}));

        // JSON parser leaves YAML text alone
        let result = typify(&input, &no_args()).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_typify_rejects_unknown_parser() {
        let err = typify(&json!("1"), &args(&[("parser", json!("toml"))])).unwrap_err();
        assert!(err.to_string().contains("invalid parser 'toml'"));
    }

    #[test]
    fn test_merge() {
        let a = json!({"x": 1, "y": 2});
        assert_eq!(
            merge(&a, &args(&[("with", json!({"y": 3, "z": 4}))])).unwrap(),
            json!({"x": 1, "y": 3, "z": 4})
        );
        assert_eq!(merge(&a, &no_args()).unwrap(), a);
        assert_eq!(merge(&a, &args(&[("with", Value::Null)])).unwrap(), a);
        assert!(merge(&a, &args(&[("with", json!("str"))])).is_err());
    }

    #[test]
    fn test_re_replace_backreferences() {
        let a = args(&[
            ("pattern", json!(r"(\w+)-(\w+)")),
            ("replacement", json!(r"\2_\1")),
        ]);
        assert_eq!(s(re_replace(&json!("foo-bar baz-qux"), &a).unwrap()), "bar_foo qux_baz");

        let dollar = args(&[("pattern", json!(r"(\d+)")), ("replacement", json!("<$1>"))]);
        assert_eq!(s(re_replace(&json!("a1b22"), &dollar).unwrap()), "a<1>b<22>");

        let named = args(&[("pattern", json!(r"(?<word>\w+)")), ("replacement", json!("[${word}]"))]);
        assert_eq!(s(re_replace(&json!("hi"), &named).unwrap()), "[hi]");
    }

    #[test]
    fn test_re_replace_keeps_literal_dollars() {
        let a = args(&[("pattern", json!("price")), ("replacement", json!("cost $5 $HOME ${x}"))]);
        assert_eq!(s(re_replace(&json!("price"), &a).unwrap()), "cost $5 $HOME ${x}");

        let escaped = args(&[("pattern", json!("(a)")), ("replacement", json!(r"\\1 \1 \9"))]);
        assert_eq!(s(re_replace(&json!("a"), &escaped).unwrap()), r"\1 a \9");
    }

    #[test]
    fn test_re_replace_flags() {
        let a = args(&[
            ("pattern", json!("^foo")),
            ("replacement", json!("X")),
            ("flags", json!("im")),
        ]);
        assert_eq!(s(re_replace(&json!("FOO\nfoo\nbar"), &a).unwrap()), "X\nX\nbar");

        let bad = args(&[("pattern", json!("a")), ("replacement", json!("b")), ("flags", json!("q"))]);
        assert!(re_replace(&json!("a"), &bad).is_err());
    }

    #[test]
    fn test_re_contains() {
        let a = args(&[("pattern", json!("PROD")), ("flags", json!("i"))]);
        assert_eq!(re_contains(&json!("config/prod/app.yaml"), &a).unwrap(), json!(true));
        let a = args(&[("pattern", json!("staging"))]);
        assert_eq!(re_contains(&json!("config/prod/app.yaml"), &a).unwrap(), json!(false));

        let dotall = args(&[("pattern", json!("a.b")), ("flags", json!("s"))]);
        assert_eq!(re_contains(&json!("a\nb"), &dotall).unwrap(), json!(true));
        assert!(re_contains(&json!("x"), &no_args()).is_err());
    }
}

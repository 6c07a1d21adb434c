//! Render context for transform templates.
//!
//! Every render sees the same top-level variables:
//!
//! ```text
//! environment   global --environment, unless a capture overrides it
//! project       global --project, unless a capture overrides it
//! filename      scanned path, or "stdin"
//! <captures>    named selector captures, null when unmatched
//! data          the decoded document
//! ```
//!
//! Captures are merged in pattern order after the globals, so a capture named
//! `environment` or `project` replaces the global value.

use serde_json::{Map, Value};
use tera::Context as TeraContext;

use crate::models::{Document, PathCaptures};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformContext {
    values: Map<String, Value>,
}

impl TransformContext {
    /// Context holding only the global options and the file name
    pub fn new(environment: &str, project: &str, filename: &str) -> Self {
        let mut values = Map::new();
        values.insert("environment".to_string(), Value::String(environment.to_string()));
        values.insert("project".to_string(), Value::String(project.to_string()));
        values.insert("filename".to_string(), Value::String(filename.to_string()));
        Self {
            values,
        }
    }

    #[must_use]
    pub fn with_captures(mut self, captures: &PathCaptures) -> Self {
        for (name, value) in captures {
            let value = value.clone().map_or(Value::Null, Value::String);
            self.values.insert(name.clone(), value);
        }
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Document) -> Self {
        self.values.insert("data".to_string(), data);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Dotted paths one level below `root`, used for "did you mean" hints
    pub(crate) fn nested_names(&self, root: &str) -> Vec<String> {
        match self.values.get(root) {
            Some(Value::Object(map)) => map.keys().map(|k| format!("{root}.{k}")).collect(),
            _ => Vec::new(),
        }
    }

    pub fn to_tera(&self) -> TeraContext {
        let mut context = TeraContext::new();
        for (name, value) in &self.values {
            context.insert(name.as_str(), value);
        }
        context
    }

    /// The whole context as pretty JSON, for error reports and debug logs
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.values).unwrap_or_default()
    }
}

//! Compiled transform templates.
//!
//! [`TransformTemplate`] wraps a Tera instance holding exactly one template
//! plus the registered [`FilterLibrary`]. It is compiled once per run and
//! rendered once per input file.

use regex::Regex;
use std::error::Error as _;
use strsim::levenshtein;
use tera::Tera;

use super::context::TransformContext;
use super::error::{RenderReport, TemplateError};
use super::filters::FilterLibrary;

const TEMPLATE_NAME: &str = "transform";

/// Maximum allowed Levenshtein distance as a percentage of the name length
/// for a variable suggestion
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

pub struct TransformTemplate {
    source: String,
    tera: Tera,
    filters: FilterLibrary,
}

impl std::fmt::Debug for TransformTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformTemplate")
            .field("source", &self.source)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

impl TransformTemplate {
    /// Compile `source` with the standard filter library.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::SyntaxError`] if the template does not parse.
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        Self::compile_with(source, FilterLibrary::standard())
    }

    /// Compile `source` with a specific filter library
    pub fn compile_with(source: &str, filters: FilterLibrary) -> Result<Self, TemplateError> {
        tracing::debug!("Parsing template: {}", source);

        let mut tera = Tera::default();
        filters.register(&mut tera);
        tera.add_raw_template(TEMPLATE_NAME, source).map_err(|e| TemplateError::SyntaxError {
            message: format_tera_error(&e),
            line_number: extract_line_number(&e),
        })?;

        Ok(Self {
            source: source.to_string(),
            tera,
            filters,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterLibrary {
        &self.filters
    }

    /// Render against `context`.
    ///
    /// Undefined variables and filters outside the library are errors; the
    /// error carries the template source and the full context.
    pub fn render(&self, context: &TransformContext) -> Result<String, TemplateError> {
        tracing::debug!("Evaluating template with context: {}", context.to_json_pretty());

        self.tera
            .render(TEMPLATE_NAME, &context.to_tera())
            .map_err(|e| self.render_error(&e, context))
    }

    fn render_error(&self, error: &tera::Error, context: &TransformContext) -> TemplateError {
        let report = Box::new(RenderReport {
            template: self.source.clone(),
            context: context.to_json_pretty(),
        });
        let message = format_tera_error(error);

        match extract_variable_name(&message) {
            Some(variable) => {
                let suggestions = find_similar_variables(&variable, context);
                TemplateError::VariableNotFound {
                    variable,
                    suggestions,
                    report,
                }
            }
            None => TemplateError::RenderFailed {
                message,
                report,
            },
        }
    }
}

/// Join the messages of a Tera error chain, dropping the internal template
/// name wrappers
fn format_tera_error(error: &tera::Error) -> String {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(err) = current {
        messages.push(err.to_string());
        current = err.source();
    }

    let cleaned: Vec<String> = messages
        .into_iter()
        .map(|msg| {
            msg.replace(&format!("Failed to render '{TEMPLATE_NAME}'"), "")
                .replace(&format!("Failed to parse '{TEMPLATE_NAME}'"), "")
                .replace(&format!(" while rendering '{TEMPLATE_NAME}'"), "")
                .trim()
                .to_string()
        })
        .filter(|msg| !msg.is_empty())
        .collect();

    if cleaned.is_empty() {
        error.to_string()
    } else {
        cleaned.join("\n")
    }
}

fn extract_variable_name(message: &str) -> Option<String> {
    let re = Regex::new(r"Variable `([^`]+)` not found").ok()?;
    re.captures(message).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
}

/// Tera reports parse errors with a `line:column` position
fn extract_line_number(error: &tera::Error) -> Option<usize> {
    let re = Regex::new(r"(\d+):(\d+)").ok()?;
    let text = format_tera_error(error);
    re.captures(&text)?.get(1)?.as_str().parse().ok()
}

fn find_similar_variables(target: &str, context: &TransformContext) -> Vec<String> {
    let mut candidates: Vec<String> = context.variable_names().map(str::to_string).collect();
    if let Some((root, _)) = target.split_once('.') {
        candidates.extend(context.nested_names(root));
    }

    let mut scored: Vec<_> = candidates
        .into_iter()
        .map(|name| {
            let distance = levenshtein(target, &name);
            (name, distance)
        })
        .filter(|(_, distance)| *distance <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .collect();
    scored.sort_by_key(|(_, distance)| *distance);
    scored.into_iter().take(3).map(|(name, _)| name).collect()
}

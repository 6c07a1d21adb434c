//! Structured errors for transform templates
//!
//! Render failures carry everything needed to debug a template without
//! re-running it: the full template source, the engine's message and the
//! complete variable context the template was rendered against.

use std::fmt;

const INDENT: &str = "  ";

/// What was being rendered when a render error occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    /// Full template source
    pub template: String,
    /// The render context as pretty-printed JSON
    pub context: String,
}

/// Template errors with the context needed to fix them
#[derive(Debug)]
pub enum TemplateError {
    /// The template could not be compiled
    SyntaxError {
        message: String,
        line_number: Option<usize>,
    },

    /// The template referenced a variable missing from the context
    VariableNotFound {
        variable: String,
        suggestions: Vec<String>,
        report: Box<RenderReport>,
    },

    /// Any other failure while rendering, including filter errors and
    /// undefined filters
    RenderFailed {
        message: String,
        report: Box<RenderReport>,
    },
}

impl TemplateError {
    /// One-line description for the CLI error line
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::SyntaxError {
                message,
                line_number: Some(line),
            } => format!("Template syntax error on line {line}: {message}"),
            Self::SyntaxError {
                message,
                line_number: None,
            } => format!("Template syntax error: {message}"),
            Self::VariableNotFound {
                variable,
                suggestions,
                ..
            } if suggestions.is_empty() => format!("Template variable not found: '{variable}'"),
            Self::VariableNotFound {
                variable,
                suggestions,
                ..
            } => format!(
                "Template variable not found: '{variable}' (did you mean {}?)",
                suggestions.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(", ")
            ),
            Self::RenderFailed {
                message,
                ..
            } => format!("Template failed to render: {}", first_line(message)),
        }
    }

    /// The engine's message
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::SyntaxError {
                message,
                ..
            }
            | Self::RenderFailed {
                message,
                ..
            } => message.clone(),
            Self::VariableNotFound {
                variable,
                ..
            } => format!("Variable `{variable}` not found in context"),
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}

fn push_indented(out: &mut String, text: &str, depth: usize) {
    let prefix = INDENT.repeat(depth);
    for line in text.lines() {
        out.push_str(&prefix);
        out.push_str(line);
        out.push('\n');
    }
}

fn format_render_failure(message: &str, report: &RenderReport) -> String {
    let mut msg = String::from("Template failed to render:\n");
    push_indented(&mut msg, &report.template, 2);
    msg.push_str(INDENT);
    msg.push_str("with error message:\n");
    push_indented(&mut msg, message, 2);
    msg.push_str(INDENT);
    msg.push_str("and variable context:\n");
    push_indented(&mut msg, &report.context, 2);
    msg.truncate(msg.trim_end().len());
    msg
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SyntaxError {
                ..
            } => f.write_str(&self.summary()),
            Self::VariableNotFound {
                report,
                ..
            }
            | Self::RenderFailed {
                report,
                ..
            } => f.write_str(&format_render_failure(&self.message(), report)),
        }
    }
}

impl std::error::Error for TemplateError {}

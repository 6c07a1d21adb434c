//! Error handling for the importer
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** ([`ImporterError`]) so the pipeline can tell a
//!    fatal failure from a tolerated one (for example a read-only store query
//!    during a dry run)
//! 2. **User-friendly messages** ([`ErrorContext`]) with details and suggestions
//!    for the single error line printed by the CLI
//!
//! # Error Categories
//!
//! - **Input**: [`ImporterError::Parse`], [`ImporterError::FileSystem`],
//!   [`ImporterError::InvalidSelector`]
//! - **Transformation**: [`ImporterError::Template`], [`ImporterError::Validation`]
//! - **Hierarchy**: [`ImporterError::CircularHierarchy`]
//! - **Store**: [`ImporterError::ExternalCommand`], [`ImporterError::StoreUnavailable`]
//!
//! Unknown file types and empty parameter listings are *not* errors; they are
//! valid empty outcomes and never surface here.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cloudtruth_importer::core::{ImporterError, user_friendly_error};
//!
//! let error = ImporterError::Validation {
//!     message: "key is required".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::templating::TemplateError;

/// The main error type for importer operations
#[derive(Error, Debug)]
pub enum ImporterError {
    /// A file of a known type could not be decoded
    ///
    /// Raised only for recognized formats; the dispatcher never returns a
    /// partially decoded document.
    #[error("Failed to parse file '{filename}' as type '{file_type}': {reason}")]
    Parse {
        /// File name (or `stdin`) being decoded
        filename: String,
        /// Format identifier that was attempted
        file_type: String,
        /// Message from the underlying codec
        reason: String,
    },

    /// Reading an input failed
    #[error("Failed to {operation} '{}'", path.display())]
    FileSystem {
        /// What was being attempted ("read", "scan", ...)
        operation: String,
        /// Path involved in the failure
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The `--path-selector` regex did not compile
    #[error("Invalid path selector '{pattern}': {reason}")]
    InvalidSelector {
        /// The selector as given
        pattern: String,
        /// Message from the regex compiler
        reason: String,
    },

    /// Transformation template failed to compile or render
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A parameter definition broke its invariants
    #[error("Invalid parameter: {message}")]
    Validation {
        /// The violated rule
        message: String,
    },

    /// Parent references among environments or projects form a cycle
    #[error("Circular {kind} hierarchy detected: {cycle}")]
    CircularHierarchy {
        /// "environment" or "project"
        kind: String,
        /// The cycle rendered as `a -> b -> a`
        cycle: String,
    },

    /// The external store command exited with a non-zero status
    #[error("Cloudtruth CLI exited with non-zero exit code: {}", exit_code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    ExternalCommand {
        /// The command line that failed
        command: String,
        /// Exit code, when the process was not killed by a signal
        exit_code: Option<i32>,
        /// Captured standard error output
        stderr: String,
    },

    /// The external store command could not be started at all
    #[error("Unable to run '{program}': {reason}")]
    StoreUnavailable {
        /// Program that was invoked
        program: String,
        /// Why spawning failed
        reason: String,
    },
}

impl ImporterError {
    /// Shorthand for a [`ImporterError::Validation`] error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether this error came from the store process rather than local input
    #[must_use]
    pub const fn is_store_failure(&self) -> bool {
        matches!(self, Self::ExternalCommand { .. } | Self::StoreUnavailable { .. })
    }
}

/// Error wrapper that carries user-facing details and a suggestion
#[derive(Debug)]
pub struct ErrorContext {
    /// Primary message shown on the error line
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details about the error
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colours
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] suitable for the CLI.
///
/// Known [`ImporterError`] variants get tailored suggestions. Template errors
/// keep their full multi-line message (source and context) in the details so
/// authoring problems can be diagnosed without a debugger.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(importer_error) = error.downcast_ref::<ImporterError>() {
        return create_error_context(importer_error, &error);
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        return ErrorContext::new(error.to_string())
            .with_details(io_error.to_string())
            .with_suggestion("Check that the path exists and is readable");
    }

    ErrorContext::new(format_chain(&error))
}

fn create_error_context(error: &ImporterError, chain: &anyhow::Error) -> ErrorContext {
    match error {
        ImporterError::Parse { .. } => ErrorContext::new(error.to_string())
            .with_suggestion("Fix the file syntax or narrow the scan with --path-selector"),
        ImporterError::FileSystem { source, .. } => ErrorContext::new(error.to_string())
            .with_details(source.to_string())
            .with_suggestion("Check that the path exists and is readable"),
        ImporterError::InvalidSelector { .. } => ErrorContext::new(error.to_string())
            .with_suggestion("Named groups use the (?<name>...) or (?P<name>...) syntax"),
        ImporterError::Template(template_error) => {
            ErrorContext::new(template_error.summary()).with_details(template_error.to_string())
        }
        ImporterError::Validation { .. } => ErrorContext::new(format_chain(chain)).with_suggestion(
            "Each parameter needs environment, project, key and either value or fqn",
        ),
        ImporterError::CircularHierarchy { .. } => ErrorContext::new(error.to_string())
            .with_suggestion("Check the environment_parent/project_parent fields produced by the transform"),
        ImporterError::ExternalCommand { command, stderr, .. } => {
            let ctx = ErrorContext::new(error.to_string());
            let ctx = if stderr.trim().is_empty() {
                ctx.with_details(format!("command: {command}"))
            } else {
                ctx.with_details(format!("command: {command}\n{}", stderr.trim()))
            };
            ctx.with_suggestion("Run with --dry-run to see the commands without executing them")
        }
        ImporterError::StoreUnavailable { .. } => ErrorContext::new(error.to_string())
            .with_suggestion(
                "Install the cloudtruth CLI or point --cloudtruth-cli at the executable",
            ),
    }
}

fn format_chain(error: &anyhow::Error) -> String {
    error.chain().map(ToString::to_string).collect::<Vec<_>>().join(": ")
}

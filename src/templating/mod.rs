//! Tera-based transform templates for scanned documents.
//!
//! A transform template turns one decoded input file into YAML describing
//! a list of parameters. It is compiled once per run and rendered once per
//! file.
//!
//! # Template Context
//!
//! - `environment`, `project`: the global options, unless a path capture of
//!   the same name overrides them
//! - `filename`: the scanned path, or `stdin`
//! - any named capture from `--path-selector` (null when unmatched)
//! - `data`: the decoded document
//!
//! # Strictness
//!
//! Undefined variables and filters are render errors, never empty output.
//! Render errors include the template source and the full context.
//!
//! # Example
//!
//! ```rust,no_run
//! use cloudtruth_importer::templating::{TransformContext, TransformTemplate};
//!
//! # fn example() -> Result<(), cloudtruth_importer::templating::TemplateError> {
//! let template = TransformTemplate::compile(
//!     "{% for k, v in data %}\n- {key: {{ k | key_safe | stringify }}, value: {{ v | stringify }}}\n{% endfor %}",
//! )?;
//! let context = TransformContext::new("production", "web", "config.yaml")
//!     .with_data(serde_json::json!({"db host": "localhost"}));
//! let yaml = template.render(&context)?;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod filters;
pub mod renderer;

pub use context::TransformContext;
pub use error::{RenderReport, TemplateError};
pub use filters::FilterLibrary;
pub use renderer::TransformTemplate;

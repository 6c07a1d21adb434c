//! Shared data models for the importer
//!
//! - [`Document`] - the format-agnostic value tree every codec produces
//! - [`Parameter`] - one validated configuration entry
//! - [`PathCaptures`] - named selector captures for a scanned file

pub mod parameter;

pub use parameter::{Parameter, ParameterDraft, ValueSource, decode_parameters};

/// Normalized document produced from any supported input format.
///
/// Mapping keys are always strings and keep insertion order (`serde_json` is
/// built with `preserve_order`).
pub type Document = serde_json::Value;

/// Named captures from the path selector, in pattern order.
///
/// A capture group that did not participate in the match has a `None` value.
pub type PathCaptures = Vec<(String, Option<String>)>;

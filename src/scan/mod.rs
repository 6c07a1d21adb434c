//! Input discovery and decoding
//!
//! - [`format`] - format detection and [`detect_and_parse`]
//! - [`scanner`] - [`PathScanner`], the directory walk with selector captures
//!
//! The codecs themselves are private to this module.

mod codecs;
pub mod format;
pub mod scanner;

pub(crate) use codecs::yaml_to_document;
pub use format::{FileType, detect_and_parse};
pub use scanner::{PathScanner, ScannedFile};

//! Format detection and dispatch to the codecs.
//!
//! [`detect_and_parse`] resolves a format for a file and decodes it into a
//! [`Document`]. Resolution order:
//!
//! 1. the declared type (`--stdin TYPE`), which is final even when unknown
//! 2. the MIME type implied by the file extension
//! 3. a `.env` / `-env` basename prefix, meaning dotenv
//! 4. a `.properties` extension
//!
//! A file whose type cannot be resolved is skipped with a warning and never
//! read. A file of a known type either decodes completely or fails with
//! [`ImporterError::Parse`].

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use super::codecs;
use crate::core::ImporterError;
use crate::models::Document;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum FileType {
    Json,
    #[value(alias = "yml")]
    Yaml,
    Dotenv,
    Properties,
    Xml,
}

impl FileType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Dotenv => "dotenv",
            Self::Properties => "properties",
            Self::Xml => "xml",
        }
    }

    /// Map a declared type or MIME type to a format.
    ///
    /// Matching is by case-insensitive substring, so `application/json`,
    /// `JSON` and `text/x-yaml` all resolve.
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("json") {
            Some(Self::Json)
        } else if lower.contains("yaml") || lower.contains("yml") {
            Some(Self::Yaml)
        } else if lower.contains("dotenv") {
            Some(Self::Dotenv)
        } else if lower.contains("properties") {
            Some(Self::Properties)
        } else if lower.contains("xml") {
            Some(Self::Xml)
        } else {
            None
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MIME type implied by a file name's extension
#[must_use]
pub fn mime_type_for_path(filename: &str) -> Option<&'static str> {
    let extension = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "json" => Some("application/json"),
        "yaml" | "yml" => Some("application/x-yaml"),
        "xml" => Some("application/xml"),
        _ => None,
    }
}

fn has_dotenv_prefix(filename: &str) -> bool {
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(".env") || name.starts_with("-env"))
}

fn has_properties_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("properties"))
}

/// Resolve the type name for a file; `None` when nothing applies.
///
/// The returned name is either the declared type verbatim, a MIME type, or
/// a format identifier.
#[must_use]
pub fn resolve_type_name(filename: &str, declared_type: Option<&str>) -> Option<String> {
    if let Some(declared) = declared_type {
        return Some(declared.to_string());
    }
    if let Some(mime) = mime_type_for_path(filename) {
        return Some(mime.to_string());
    }
    if has_dotenv_prefix(filename) {
        return Some(FileType::Dotenv.as_str().to_string());
    }
    if has_properties_extension(filename) {
        return Some(FileType::Properties.as_str().to_string());
    }
    None
}

/// Detect the format of `filename` and decode it.
///
/// `contents` is used when given; otherwise the file is read, but only once
/// its type is known to be supported.
///
/// # Errors
///
/// - [`ImporterError::Parse`] if a supported format fails to decode or
///   the file is not UTF-8
/// - [`ImporterError::FileSystem`] if the file cannot be read
pub fn detect_and_parse(
    filename: &str,
    contents: Option<&str>,
    declared_type: Option<&str>,
) -> Result<Option<Document>, ImporterError> {
    let type_name = resolve_type_name(filename, declared_type);
    let Some(file_type) = type_name.as_deref().and_then(FileType::from_type_name) else {
        tracing::warn!(
            "Skipping file '{}' due to unknown mime type '{}'",
            filename,
            type_name.unwrap_or_default()
        );
        return Ok(None);
    };

    let parse_error = |reason: String| ImporterError::Parse {
        filename: filename.to_string(),
        file_type: file_type.to_string(),
        reason,
    };

    let contents = match contents {
        Some(contents) => Cow::Borrowed(contents),
        None => {
            let bytes = std::fs::read(filename).map_err(|source| ImporterError::FileSystem {
                operation: "read".to_string(),
                path: filename.into(),
                source,
            })?;
            let text = String::from_utf8(bytes)
                .map_err(|e| parse_error(format!("content is not valid UTF-8: {e}")))?;
            Cow::Owned(text)
        }
    };

    tracing::debug!("Attempting to parse {} as {}", filename, file_type);
    codecs::decode(file_type, &contents).map(Some).map_err(parse_error)
}

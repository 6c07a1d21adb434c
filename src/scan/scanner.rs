//! Directory traversal with regex selection and named captures.
//!
//! [`PathScanner`] walks a root (a directory or a single file) in file-name
//! order and yields every selected file of a known format as a
//! [`ScannedFile`].
//!
//! # Traversal Rules
//!
//! - Directories whose name starts with `.` are pruned with their whole
//!   subtree. The root itself is never pruned, so `.` can be scanned.
//! - Hidden *files* (`.env`, `.env.local`) are still visited.
//! - The selector is matched (unanchored) against the full path string; paths
//!   below a `.` root are reported without the leading `./`.
//! - Named capture groups become [`PathCaptures`] in pattern order, with
//!   `None` for groups that did not take part in the match.
//! - Files of unknown type are skipped (see [`detect_and_parse`]).

use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use super::format::detect_and_parse;
use crate::core::{ImporterError, RunContext};
use crate::models::{Document, PathCaptures};

/// One decoded file together with the captures its path produced
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub data: Document,
    pub captures: PathCaptures,
}

impl ScannedFile {
    /// The path as used in messages and the render context
    #[must_use]
    pub fn filename(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

#[derive(Debug, Clone)]
pub struct PathScanner {
    root: PathBuf,
    selector: Regex,
}

impl PathScanner {
    /// Create a scanner for `root` using `selector`.
    ///
    /// An empty selector matches every file.
    ///
    /// # Errors
    ///
    /// Returns [`ImporterError::InvalidSelector`] if the selector is not a
    /// valid regex.
    pub fn new(root: impl Into<PathBuf>, selector: &str) -> Result<Self, ImporterError> {
        let selector = Regex::new(selector).map_err(|e| ImporterError::InvalidSelector {
            pattern: selector.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            root: root.into(),
            selector,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Named captures of `path` against the selector, or `None` when the
    /// path is not selected
    #[must_use]
    pub fn captures_for(&self, path: &str) -> Option<PathCaptures> {
        let captures = self.selector.captures(path)?;
        Some(
            self.selector
                .capture_names()
                .flatten()
                .map(|name| (name.to_string(), captures.name(name).map(|m| m.as_str().to_string())))
                .collect(),
        )
    }

    /// Walk the root lazily, yielding each selected and decoded file.
    ///
    /// Files are decoded one at a time as the iterator advances. Errors are
    /// yielded in place; the caller decides whether to stop.
    pub fn scan<'a>(
        &'a self,
        ctx: &'a RunContext,
    ) -> impl Iterator<Item = Result<ScannedFile, ImporterError>> + 'a {
        debug!("Scanning {} with selector '{}'", self.root.display(), self.selector.as_str());

        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_pruned(entry))
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => None,
                Ok(entry) => self.visit(&entry, ctx).transpose(),
                Err(err) => {
                    let path = err.path().map_or_else(|| self.root.clone(), Path::to_path_buf);
                    Some(Err(ImporterError::FileSystem {
                        operation: "scan".to_string(),
                        path,
                        source: err.into(),
                    }))
                }
            })
    }

    fn visit(
        &self,
        entry: &DirEntry,
        ctx: &RunContext,
    ) -> Result<Option<ScannedFile>, ImporterError> {
        let path = display_path(entry.path());
        let filename = path.to_string_lossy().into_owned();

        let Some(captures) = self.captures_for(&filename) else {
            debug!("Skipping non-matching file: {}", filename);
            return Ok(None);
        };
        debug!("Processing matching file '{}' with captures: {:?}", filename, captures);

        match detect_and_parse(&filename, None, None)? {
            Some(data) => {
                ctx.record_file_scanned();
                Ok(Some(ScannedFile {
                    path,
                    data,
                    captures,
                }))
            }
            None => {
                ctx.record_file_skipped();
                Ok(None)
            }
        }
    }
}

fn is_pruned(entry: &DirEntry) -> bool {
    let hidden = entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| name.starts_with('.'));
    if hidden {
        trace!("Ignoring path: {}", entry.path().display());
    }
    hidden
}

fn display_path(path: &Path) -> PathBuf {
    path.strip_prefix(".").map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
}

//! Reading every input source into parameters.
//!
//! The [`Importer`] owns the compiled transform and the global options. It
//! turns standard input or a scanned path into [`Parameter`]s: each decoded
//! document is rendered through the transform with the globals, the path
//! captures and the data, and the rendered text is decoded strictly.
//!
//! Sources are processed one after another and the first failure stops the
//! run; nothing has been written to the store at that point.

use std::io::Read;
use std::path::Path;

use crate::constants::{DEFAULT_ENVIRONMENT, DEFAULT_PROJECT, STDIN_FILENAME};
use crate::core::{ImporterError, RunContext};
use crate::models::{Document, Parameter, PathCaptures, decode_parameters};
use crate::scan::{FileType, PathScanner, detect_and_parse};
use crate::templating::{TransformContext, TransformTemplate};

#[derive(Debug)]
pub struct Importer {
    template: TransformTemplate,
    environment: String,
    project: String,
    selector: String,
}

impl Importer {
    /// Importer with the default environment, project and an empty selector
    pub fn new(template: TransformTemplate) -> Self {
        Self {
            template,
            environment: DEFAULT_ENVIRONMENT.to_string(),
            project: DEFAULT_PROJECT.to_string(),
            selector: String::new(),
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Regex matched against every scanned path; named groups become
    /// template variables
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    #[must_use]
    pub const fn template(&self) -> &TransformTemplate {
        &self.template
    }

    /// Render one document and decode the result.
    ///
    /// # Errors
    ///
    /// Template failures and invalid parameter definitions.
    pub fn transform(
        &self,
        filename: &str,
        captures: &PathCaptures,
        data: Document,
    ) -> Result<Vec<Parameter>, ImporterError> {
        let context = TransformContext::new(&self.environment, &self.project, filename)
            .with_captures(captures)
            .with_data(data);
        let rendered = self.template.render(&context)?;
        tracing::debug!("Transformed data: {}", rendered);

        decode_parameters(&rendered)
    }

    /// Read all of `reader` as one document of `file_type`
    pub fn read_stdin<R: Read>(
        &self,
        mut reader: R,
        file_type: FileType,
        ctx: &RunContext,
    ) -> Result<Vec<Parameter>, ImporterError> {
        tracing::info!("Reading parameter data from stdin");
        let mut contents = String::new();
        reader.read_to_string(&mut contents).map_err(|source| ImporterError::FileSystem {
            operation: "read".to_string(),
            path: STDIN_FILENAME.into(),
            source,
        })?;

        let Some(data) = detect_and_parse(STDIN_FILENAME, Some(&contents), Some(file_type.as_str()))?
        else {
            return Ok(Vec::new());
        };
        ctx.record_file_scanned();

        let params = self.transform(STDIN_FILENAME, &PathCaptures::new(), data)?;
        ctx.record_parameters(params.len());
        Ok(params)
    }

    /// Scan `path` (a directory or a single file) and transform every
    /// selected file in name order
    pub fn read_path(&self, path: &Path, ctx: &RunContext) -> Result<Vec<Parameter>, ImporterError> {
        let scanner = PathScanner::new(path, &self.selector)?;
        let mut params = Vec::new();

        for file in scanner.scan(ctx) {
            let file = file?;
            let filename = file.filename();
            let produced = self.transform(&filename, &file.captures, file.data)?;
            tracing::debug!("{} parameters from {}", produced.len(), filename);
            ctx.record_parameters(produced.len());
            params.extend(produced);
        }

        Ok(params)
    }
}

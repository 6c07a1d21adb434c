//! Builder for invocations of the external store CLI
//!
//! [`StoreCommand`] collects the argument list for one call of the store
//! executable, runs it with `tokio::process` and maps failures onto
//! [`ImporterError`]:
//!
//! - the program could not be started: [`ImporterError::StoreUnavailable`]
//! - the program exited non-zero: [`ImporterError::ExternalCommand`] with the
//!   exit code and captured stderr
//!
//! # Examples
//!
//! ```rust,no_run
//! use cloudtruth_importer::store::StoreCommand;
//!
//! # async fn example() -> Result<(), cloudtruth_importer::core::ImporterError> {
//! let names = StoreCommand::new("cloudtruth")
//!     .args(["--project", "web", "param", "ls"])
//!     .with_context("web")
//!     .execute_stdout()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::process::Stdio;
use tokio::process::Command;

use crate::core::ImporterError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCommand {
    program: String,
    args: Vec<String>,
    context: Option<String>,
}

impl StoreCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            context: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Label included in log lines, usually the project or environment
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// The full command line as an argument vector, program first
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone()).chain(self.args.iter().cloned()).collect()
    }

    /// The command line rendered for logs and error messages
    #[must_use]
    pub fn display(&self) -> String {
        format!("{:?}", self.argv())
    }

    /// Run the command and capture its output
    pub async fn execute(self) -> Result<StoreCommandOutput, ImporterError> {
        let start = std::time::Instant::now();
        let rendered = self.display();

        match &self.context {
            Some(ctx) => tracing::debug!(target: "store", "({}) Running Cloudtruth CLI: {}", ctx, rendered),
            None => tracing::debug!(target: "store", "Running Cloudtruth CLI: {}", rendered),
        }

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ImporterError::StoreUnavailable {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            tracing::debug!(
                target: "store",
                "Command failed with exit code: {:?}",
                output.status.code()
            );
            if !stderr.is_empty() {
                tracing::debug!(target: "store", "Error: {}", stderr.trim());
            }
            return Err(ImporterError::ExternalCommand {
                command: rendered,
                exit_code: output.status.code(),
                stderr,
            });
        }

        if !stdout.is_empty() {
            tracing::trace!(target: "store", "{}", stdout.trim());
        }
        if !stderr.is_empty() {
            tracing::debug!(target: "store", "{}", stderr.trim());
        }

        let elapsed = start.elapsed();
        if elapsed.as_millis() > 500 {
            tracing::debug!(target: "store::perf", "{} took {}ms", rendered, elapsed.as_millis());
        }

        Ok(StoreCommandOutput {
            stdout,
            stderr,
        })
    }

    /// Run the command and return its standard output
    pub async fn execute_stdout(self) -> Result<String, ImporterError> {
        Ok(self.execute().await?.stdout)
    }

    /// Run the command, discarding its output
    pub async fn execute_success(self) -> Result<(), ImporterError> {
        self.execute().await?;
        Ok(())
    }
}

/// Captured output of a successful store command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

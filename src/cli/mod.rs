//! Command-line interface for the importer.
//!
//! A single command: scan the given paths (and/or standard input), transform
//! each document through the template and apply the resulting parameters to
//! CloudTruth.
//!
//! # Usage
//!
//! ```bash
//! # Import every top-level key of a dotenv file into the dev environment
//! cloudtruth-importer --environment dev --project web .env
//!
//! # Derive project and environment from the directory layout
//! cloudtruth-importer --path-selector '(?<project>[^/]+)/(?<environment>[^/]+)/.+' \
//!     --create-projects --create-environments .
//!
//! # Preview what would be written
//! cat config.json | cloudtruth-importer --stdin json --dry-run
//! ```
//!
//! # Logging
//!
//! Logs go to stderr through `tracing-subscriber`. The level is `info` by
//! default, `debug` with `--debug` and `error` with `--quiet` (which wins over
//! `--debug`). Directives in `RUST_LOG` are layered on top.

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use crate::apply::{ApplyOptions, apply};
use crate::constants::{
    CLI_PROGRAM_ENV, DEFAULT_CLI_PROGRAM, DEFAULT_ENVIRONMENT, DEFAULT_PROJECT, DEFAULT_TRANSFORM,
};
use crate::core::{ImporterError, RunContext, Verbosity};
use crate::importer::Importer;
use crate::scan::FileType;
use crate::store::CloudTruthCli;
use crate::templating::TransformTemplate;

/// Runtime configuration derived from the output flags.
///
/// Kept separate from [`Cli`] so tests can run the pipeline without touching
/// the global subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliConfig {
    pub verbosity: Verbosity,
    pub color: bool,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The subscriber filter: the verbosity level plus any `RUST_LOG`
    /// directives
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::new(self.verbosity.directive());
        if let Ok(extra) = std::env::var("RUST_LOG") {
            for directive in extra.split(',').filter_map(|d| d.trim().parse::<Directive>().ok()) {
                filter = filter.add_directive(directive);
            }
        }
        filter
    }

    /// Install the global `tracing` subscriber and colour override.
    ///
    /// Only the first call in a process has an effect.
    pub fn init_logging(&self) {
        colored::control::set_override(self.color);
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_writer(std::io::stderr)
            .with_ansi(self.color)
            .with_target(false)
            .without_time()
            .try_init();
    }
}

/// Scans the given directories and files (or stdin) to extract parameters
/// and add them to CloudTruth.
///
/// Each data file is parsed and passed into the `--transform` template to
/// generate a list of parameter definitions that are created within
/// CloudTruth. By default only new parameters are added unless `--override`
/// is given.
#[derive(Parser, Debug)]
#[command(name = "cloudtruth-importer", version)]
pub struct Cli {
    /// The CloudTruth environment to use if the transform does not determine one
    #[arg(long, value_name = "ENV", default_value = DEFAULT_ENVIRONMENT)]
    environment: String,

    /// The CloudTruth project to use if the transform does not determine one
    #[arg(long, value_name = "PROJECT", default_value = DEFAULT_PROJECT)]
    project: String,

    /// Regex selecting paths; named captures are passed to the transform.
    /// e.g. '(?<environment>[^/]+)/(?<project>[^/]+).yaml'
    #[arg(long, value_name = "REGEX", default_value = "")]
    path_selector: String,

    /// Template converting each file's data into a YAML list of parameters.
    ///
    /// Each item is a mapping of environment, environment_parent, project,
    /// project_parent, key, value, secret, fqn and jmes. The template sees
    /// environment, project, filename, data and any named captures from the
    /// path selector. Defaults to one parameter per top-level key.
    #[arg(long, value_name = "TMPL")]
    transform: Option<String>,

    /// File containing the transform template, takes precedence over --transform
    #[arg(long, value_name = "FILE")]
    transform_file: Option<PathBuf>,

    /// Read data from stdin as the given type
    #[arg(short = 's', long, value_name = "TYPE")]
    stdin: Option<FileType>,

    /// Create projects if they don't exist
    #[arg(long)]
    create_projects: bool,

    /// Create environments if they don't exist
    #[arg(long)]
    create_environments: bool,

    /// Overwrite parameters that already exist in CloudTruth
    #[arg(short = 'o', long = "override")]
    override_existing: bool,

    /// Send each environment/project group through one `import parameters` call
    #[arg(long)]
    bulk_import: bool,

    /// Mark bulk imported values as not inherited
    #[arg(long, requires = "bulk_import")]
    no_inherit: bool,

    /// Log mutating commands instead of running them
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,

    /// Debug output
    #[arg(short, long)]
    debug: bool,

    /// Colorize output (default: when stderr is a terminal)
    #[arg(short = 'c', long, overrides_with = "no_color")]
    color: bool,

    /// Never colorize output
    #[arg(long, overrides_with = "color")]
    no_color: bool,

    /// The cloudtruth executable to run
    #[arg(long, value_name = "PATH", env = CLI_PROGRAM_ENV, default_value = DEFAULT_CLI_PROGRAM)]
    cloudtruth_cli: String,

    /// The directories and/or files to scan for data
    #[arg(value_name = "PATH", required_unless_present = "stdin")]
    paths: Vec<PathBuf>,
}

impl Cli {
    /// Install logging and run the import
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.run().await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let verbosity = if self.quiet {
            Verbosity::Quiet
        } else if self.debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        };
        let color = if self.color {
            true
        } else if self.no_color {
            false
        } else {
            std::io::stderr().is_terminal()
        };

        CliConfig {
            verbosity,
            color,
        }
    }

    #[must_use]
    pub const fn apply_options(&self) -> ApplyOptions {
        ApplyOptions {
            override_existing: self.override_existing,
            create_environments: self.create_environments,
            create_projects: self.create_projects,
            bulk_import: self.bulk_import,
            no_inherit: self.no_inherit,
        }
    }

    /// The transform source: `--transform-file`, then `--transform`, then the
    /// default
    pub fn transform_source(&self) -> Result<String, ImporterError> {
        if let Some(path) = &self.transform_file {
            return std::fs::read_to_string(path).map_err(|source| ImporterError::FileSystem {
                operation: "read".to_string(),
                path: path.clone(),
                source,
            });
        }
        Ok(self.transform.clone().unwrap_or_else(|| DEFAULT_TRANSFORM.to_string()))
    }

    /// Run the scan, transform and apply pipeline; logging is left to the
    /// caller
    pub async fn run(self) -> Result<()> {
        let ctx = RunContext::new().with_dry_run(self.dry_run);
        if ctx.dry_run() {
            tracing::info!("Performing dry run, no changes will be made to CloudTruth");
        }

        let template = TransformTemplate::compile(&self.transform_source()?)?;
        let importer = Importer::new(template)
            .with_environment(&self.environment)
            .with_project(&self.project)
            .with_selector(&self.path_selector);

        let mut params = Vec::new();
        if let Some(file_type) = self.stdin {
            params.extend(importer.read_stdin(std::io::stdin().lock(), file_type, &ctx)?);
        }
        for path in &self.paths {
            params.extend(importer.read_path(path, &ctx)?);
        }
        tracing::info!(
            "Read {} parameters from {} files ({} skipped)",
            ctx.parameters_read(),
            ctx.files_scanned(),
            ctx.files_skipped()
        );

        let store = CloudTruthCli::for_run(&self.cloudtruth_cli, &ctx);
        let summary = apply(&store, &params, &self.apply_options(), &ctx).await?;
        tracing::info!("{}", summary);

        Ok(())
    }
}

//! Run-scoped context threaded through scan, transform and apply.
//!
//! The [`RunContext`] is created once by the CLI from its flags and passed by
//! reference to every stage, so no stage consults process-wide state to find
//! out whether it is running dry. Verbosity only configures the subscriber
//! and stays with the CLI.
//!
//! It also owns the per-run scan counters reported at the end of a run.
//!
//! # Example
//!
//! ```rust,no_run
//! use cloudtruth_importer::core::RunContext;
//!
//! let ctx = RunContext::new().with_dry_run(true);
//! assert!(ctx.dry_run());
//!
//! ctx.record_file_scanned();
//! assert_eq!(ctx.files_scanned(), 1);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

/// How much the run reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only (`--quiet`)
    Quiet,
    /// Informational output
    #[default]
    Normal,
    /// Debug output (`--debug`)
    Debug,
}

impl Verbosity {
    /// The `tracing` filter directive for this verbosity
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "info",
            Self::Debug => "debug",
        }
    }
}

#[derive(Debug, Default)]
pub struct RunContext {
    dry_run: bool,
    files_scanned: AtomicUsize,
    files_skipped: AtomicUsize,
    parameters_read: AtomicUsize,
}

impl RunContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Mutating store calls are logged instead of executed
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn record_file_scanned(&self) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// A selected file produced no data (unknown type)
    pub fn record_file_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parameters(&self, count: usize) {
        self.parameters_read.fetch_add(count, Ordering::Relaxed);
    }

    #[must_use]
    pub fn files_scanned(&self) -> usize {
        self.files_scanned.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn files_skipped(&self) -> usize {
        self.files_skipped.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn parameters_read(&self) -> usize {
        self.parameters_read.load(Ordering::Relaxed)
    }
}

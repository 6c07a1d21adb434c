//! CloudTruth importer
//!
//! Discovers structured configuration data in files (or standard input),
//! renders each document through a user-supplied template into parameter
//! definitions and applies those parameters idempotently to CloudTruth by
//! driving the `cloudtruth` command line tool.
//!
//! # Pipeline
//!
//! ```text
//! PathScanner -> (path, data, captures) -> TransformTemplate -> Vec<Parameter>
//!     -> HierarchyResolver (optional) -> apply -> ParameterStore
//! ```
//!
//! Each invocation performs one full scan, transform and apply pass. Nothing
//! is cached or persisted between runs.
//!
//! # Modules
//!
//! - [`scan`] - format detection, codecs and the directory walk
//! - [`templating`] - the transform engine and its filter library
//! - [`models`] - [`models::Parameter`] and strict decoding of transform output
//! - [`hierarchy`] - parent-first creation order for environments and projects
//! - [`apply`] - grouping, existing-key suppression and dispatch
//! - [`store`] - the [`store::ParameterStore`] boundary and the CLI adapter
//! - [`importer`] - reading every input source into parameters
//! - [`cli`] - the command-line front end
//! - [`core`] - errors and the per-run context
//!
//! # Transform Example
//!
//! Given `proj1/dev/a.yaml` containing `foo: bar`, the selector
//! `(?<project>[^/]+)/(?<environment>[^/]+)/.+` and the default transform,
//! one parameter `foo=bar` is produced for environment `dev` of project
//! `proj1`.

pub mod apply;
pub mod cli;
pub mod constants;
pub mod core;
pub mod hierarchy;
pub mod importer;
pub mod models;
pub mod scan;
pub mod store;
pub mod templating;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

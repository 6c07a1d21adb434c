//! The boundary to the configuration store.
//!
//! Everything that reads or writes CloudTruth state goes through
//! [`ParameterStore`]. The production implementation is [`CloudTruthCli`],
//! which shells out to the `cloudtruth` executable one call at a time; tests
//! use the recording double from `test_utils`.
//!
//! Dry-run behaviour belongs to the implementation: mutating calls are
//! logged instead of executed, and failed read-only queries degrade to empty
//! results with a warning.

mod cloudtruth;
mod command_builder;

use std::collections::HashSet;

pub use cloudtruth::CloudTruthCli;
pub use command_builder::{StoreCommand, StoreCommandOutput};

use crate::core::ImporterError;
use crate::models::Parameter;

/// Operations the importer needs from a configuration store.
///
/// Calls are awaited one at a time; implementations need not be `Sync`.
#[allow(async_fn_in_trait)]
pub trait ParameterStore {
    /// Names of all environments
    async fn list_environments(&self) -> Result<HashSet<String>, ImporterError>;

    /// Create or update an environment; `None` or a blank parent leaves the
    /// parent unspecified
    async fn ensure_environment(&self, name: &str, parent: Option<&str>)
    -> Result<(), ImporterError>;

    /// Names of all projects
    async fn list_projects(&self) -> Result<HashSet<String>, ImporterError>;

    async fn ensure_project(&self, name: &str, parent: Option<&str>) -> Result<(), ImporterError>;

    /// Keys of the parameters already defined in `project`
    async fn parameter_names(&self, project: &str) -> Result<HashSet<String>, ImporterError>;

    async fn set_parameter(&self, param: &Parameter) -> Result<(), ImporterError>;

    /// Set each parameter in order, stopping at the first failure
    async fn set_parameters(&self, params: &[Parameter]) -> Result<(), ImporterError> {
        for param in params {
            self.set_parameter(param).await?;
        }
        Ok(())
    }

    /// Import value-sourced parameters for one environment and project in a
    /// single call
    async fn import_parameters(
        &self,
        project: &str,
        environment: &str,
        params: &[Parameter],
        no_inherit: bool,
    ) -> Result<(), ImporterError>;
}

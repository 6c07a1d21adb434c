//! Test utilities for the importer
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite:
//!
//! - [`init_test_logging`] - one-time `tracing` setup honouring `RUST_LOG`
//! - [`RecordingStore`] - an in-memory [`ParameterStore`] that records calls
//! - [`FakeCli`] (unix) - a shell script standing in for the `cloudtruth`
//!   executable, logging its arguments and answering canned output
//!
//! # Example
//!
//! ```rust,no_run
//! use cloudtruth_importer::test_utils::{RecordingStore, StoreCall};
//! use cloudtruth_importer::store::ParameterStore;
//!
//! # async fn example() {
//! let store = RecordingStore::new().with_existing("web", ["PORT"]);
//! let names = store.parameter_names("web").await.unwrap();
//! assert!(names.contains("PORT"));
//! assert_eq!(store.calls(), vec![StoreCall::ParameterNames("web".to_string())]);
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, Once, PoisonError};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::core::ImporterError;
use crate::models::Parameter;
use crate::store::ParameterStore;

#[cfg(unix)]
mod fake_cli;
#[cfg(unix)]
pub use fake_cli::FakeCli;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging stays
/// off.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// One call received by a [`RecordingStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListEnvironments,
    EnsureEnvironment {
        name: String,
        parent: Option<String>,
    },
    ListProjects,
    EnsureProject {
        name: String,
        parent: Option<String>,
    },
    ParameterNames(String),
    SetParameter(Parameter),
    Import {
        project: String,
        environment: String,
        keys: Vec<String>,
        no_inherit: bool,
    },
}

impl StoreCall {
    /// An ensure call as the apply engine issues it, with the parent always given
    pub fn ensure_environment(name: &str, parent: &str) -> Self {
        Self::EnsureEnvironment {
            name: name.to_string(),
            parent: Some(parent.to_string()),
        }
    }

    pub fn ensure_project(name: &str, parent: &str) -> Self {
        Self::EnsureProject {
            name: name.to_string(),
            parent: Some(parent.to_string()),
        }
    }
}

/// In-memory store that records every call in order.
///
/// Existing parameter names are configured per project with
/// [`RecordingStore::with_existing`]; ensured environments and projects are
/// added to the lists it reports.
#[derive(Debug, Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<StoreCall>>,
    existing: HashMap<String, HashSet<String>>,
    environments: Mutex<HashSet<String>>,
    projects: Mutex<HashSet<String>>,
    fail_key: Option<String>,
}

impl RecordingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_existing<I, S>(mut self, project: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.existing.entry(project.to_string()).or_default().extend(keys.into_iter().map(Into::into));
        self
    }

    /// Make `set_parameter` fail (after recording) for parameters with `key`
    #[must_use]
    pub fn fail_on_key(mut self, key: &str) -> Self {
        self.fail_key = Some(key.to_string());
        self
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }
}

impl ParameterStore for RecordingStore {
    async fn list_environments(&self) -> Result<HashSet<String>, ImporterError> {
        self.record(StoreCall::ListEnvironments);
        Ok(self.environments.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn ensure_environment(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<(), ImporterError> {
        self.record(StoreCall::EnsureEnvironment {
            name: name.to_string(),
            parent: parent.map(str::to_string),
        });
        self.environments.lock().unwrap_or_else(PoisonError::into_inner).insert(name.to_string());
        Ok(())
    }

    async fn list_projects(&self) -> Result<HashSet<String>, ImporterError> {
        self.record(StoreCall::ListProjects);
        Ok(self.projects.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn ensure_project(&self, name: &str, parent: Option<&str>) -> Result<(), ImporterError> {
        self.record(StoreCall::EnsureProject {
            name: name.to_string(),
            parent: parent.map(str::to_string),
        });
        self.projects.lock().unwrap_or_else(PoisonError::into_inner).insert(name.to_string());
        Ok(())
    }

    async fn parameter_names(&self, project: &str) -> Result<HashSet<String>, ImporterError> {
        self.record(StoreCall::ParameterNames(project.to_string()));
        Ok(self.existing.get(project).cloned().unwrap_or_default())
    }

    async fn set_parameter(&self, param: &Parameter) -> Result<(), ImporterError> {
        self.record(StoreCall::SetParameter(param.clone()));
        if self.fail_key.as_deref() == Some(param.key()) {
            return Err(ImporterError::ExternalCommand {
                command: format!("param set {}", param.key()),
                exit_code: Some(1),
                stderr: "simulated failure".to_string(),
            });
        }
        Ok(())
    }

    async fn import_parameters(
        &self,
        project: &str,
        environment: &str,
        params: &[Parameter],
        no_inherit: bool,
    ) -> Result<(), ImporterError> {
        self.record(StoreCall::Import {
            project: project.to_string(),
            environment: environment.to_string(),
            keys: params.iter().map(|p| p.key().to_string()).collect(),
            no_inherit,
        });
        Ok(())
    }
}

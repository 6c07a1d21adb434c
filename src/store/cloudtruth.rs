//! [`ParameterStore`] backed by the `cloudtruth` command line tool.

use std::collections::HashSet;
use std::io::Write;

use super::ParameterStore;
use super::command_builder::StoreCommand;
use crate::constants::{DEFAULT_CLI_PROGRAM, NO_PARAMETERS_MARKER};
use crate::core::{ImporterError, RunContext};
use crate::models::{Parameter, ValueSource};

/// Drives the `cloudtruth` executable.
///
/// In dry-run mode every mutating command is logged at info level with its
/// full argument vector and not executed. Read-only queries still run; if one
/// fails during a dry run the failure is logged as a warning and treated as
/// an empty result, since the entity it asks about may not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudTruthCli {
    program: String,
    dry_run: bool,
}

impl Default for CloudTruthCli {
    fn default() -> Self {
        Self::new(DEFAULT_CLI_PROGRAM)
    }
}

impl CloudTruthCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            dry_run: false,
        }
    }

    /// Adapter for one run; mutations are previewed when `ctx` is a dry run
    pub fn for_run(program: impl Into<String>, ctx: &RunContext) -> Self {
        Self::new(program).with_dry_run(ctx.dry_run())
    }

    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn command(&self) -> StoreCommand {
        StoreCommand::new(&self.program)
    }

    pub(crate) fn ensure_command(&self, noun: &str, name: &str, parent: Option<&str>) -> StoreCommand {
        let mut cmd = self.command().args([noun, "set"]);
        if let Some(parent) = parent.filter(|p| !p.trim().is_empty()) {
            cmd = cmd.args(["--parent", parent]);
        }
        cmd.arg(name).with_context(name)
    }

    pub(crate) fn parameter_names_command(&self, project: &str) -> StoreCommand {
        self.command().args(["--project", project, "param", "ls"]).with_context(project)
    }

    pub(crate) fn set_parameter_command(&self, param: &Parameter) -> StoreCommand {
        let mut cmd = self.command().args([
            "--env",
            param.environment(),
            "--project",
            param.project(),
            "param",
            "set",
        ]);
        if param.is_secret() {
            cmd = cmd.args(["--secret", "true"]);
        }
        cmd = match param.source() {
            ValueSource::Value(value) => cmd.args(["--value", value]),
            ValueSource::Reference {
                fqn,
                jmes,
            } => {
                let cmd = cmd.args(["--fqn", fqn]);
                match jmes {
                    Some(jmes) => cmd.args(["--jmes", jmes]),
                    None => cmd,
                }
            }
        };
        cmd.arg(param.key()).with_context(format!("{}/{}", param.project(), param.environment()))
    }

    pub(crate) fn import_command(
        &self,
        project: &str,
        environment: &str,
        file: &str,
        secrets: &[&str],
        no_inherit: bool,
    ) -> StoreCommand {
        let mut cmd = self.command().args([
            "import",
            "parameters",
            "--environment",
            environment,
            project,
            file,
        ]);
        for key in secrets {
            cmd = cmd.args(["--secret", key]);
        }
        if self.dry_run {
            cmd = cmd.arg("--preview");
        }
        if no_inherit {
            cmd = cmd.arg("--no-inherit");
        }
        cmd.with_context(format!("{project}/{environment}"))
    }

    async fn mutate(&self, cmd: StoreCommand) -> Result<(), ImporterError> {
        if self.dry_run {
            tracing::info!("{}", cmd.display());
            return Ok(());
        }
        cmd.execute_success().await
    }

    async fn query(&self, cmd: StoreCommand, what: &str) -> Result<String, ImporterError> {
        match cmd.execute_stdout().await {
            Ok(stdout) => Ok(stdout),
            Err(e) if self.dry_run && e.is_store_failure() => {
                tracing::warn!("Ignoring failure in {} lookup due to dry run: {}", what, e);
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }
}

fn split_names(output: &str) -> HashSet<String> {
    output.split_whitespace().map(str::to_string).collect()
}

/// The `key: value` document sent to `import parameters`
pub(crate) fn import_document(params: &[Parameter]) -> Result<String, ImporterError> {
    let mut doc = serde_yaml::Mapping::new();
    for param in params {
        if let ValueSource::Value(value) = param.source() {
            doc.insert(param.key().into(), value.into());
        }
    }
    serde_yaml::to_string(&doc).map_err(|e| {
        ImporterError::validation(format!("unable to encode parameters for import: {e}"))
    })
}

impl ParameterStore for CloudTruthCli {
    async fn list_environments(&self) -> Result<HashSet<String>, ImporterError> {
        let out = self.query(self.command().args(["environments", "list"]), "environment").await?;
        Ok(split_names(&out))
    }

    async fn ensure_environment(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<(), ImporterError> {
        self.mutate(self.ensure_command("environments", name, parent)).await
    }

    async fn list_projects(&self) -> Result<HashSet<String>, ImporterError> {
        let out = self.query(self.command().args(["projects", "list"]), "project").await?;
        Ok(split_names(&out))
    }

    async fn ensure_project(&self, name: &str, parent: Option<&str>) -> Result<(), ImporterError> {
        self.mutate(self.ensure_command("projects", name, parent)).await
    }

    async fn parameter_names(&self, project: &str) -> Result<HashSet<String>, ImporterError> {
        let out = self.query(self.parameter_names_command(project), "param").await?;
        if out.contains(NO_PARAMETERS_MARKER) {
            return Ok(HashSet::new());
        }
        Ok(split_names(&out))
    }

    async fn set_parameter(&self, param: &Parameter) -> Result<(), ImporterError> {
        self.mutate(self.set_parameter_command(param)).await
    }

    async fn import_parameters(
        &self,
        project: &str,
        environment: &str,
        params: &[Parameter],
        no_inherit: bool,
    ) -> Result<(), ImporterError> {
        let document = import_document(params)?;
        let secrets: Vec<&str> = params.iter().filter(|p| p.is_secret()).map(Parameter::key).collect();

        let mut file = tempfile::Builder::new()
            .prefix("importer")
            .suffix(".yml")
            .tempfile()
            .map_err(|e| ImporterError::FileSystem {
                operation: "create".to_string(),
                path: std::env::temp_dir(),
                source: e,
            })?;
        let written = file.write_all(document.as_bytes()).and_then(|()| file.flush());
        written.map_err(|e| ImporterError::FileSystem {
            operation: "write".to_string(),
            path: file.path().to_path_buf(),
            source: e,
        })?;
        tracing::debug!("Import document for {}/{}:\n{}", project, environment, document);

        let path = file.path().to_string_lossy().into_owned();
        let cmd = self.import_command(project, environment, &path, &secrets, no_inherit);
        if self.dry_run {
            tracing::info!("{}", cmd.display());
        }
        // --preview makes the import read-only, so it runs in dry-run too
        cmd.execute_success().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParameterDraft;

    fn param(draft: ParameterDraft) -> Parameter {
        draft.build().unwrap()
    }

    #[test]
    fn test_for_run_takes_dry_run_from_context() {
        let cli = CloudTruthCli::for_run("ct", &RunContext::new().with_dry_run(true));
        assert_eq!(cli.program(), "ct");
        assert!(cli.dry_run());
        assert!(!CloudTruthCli::for_run("ct", &RunContext::new()).dry_run());
    }

    #[test]
    fn test_set_parameter_value_arguments() {
        let cli = CloudTruthCli::default();
        let cmd = cli.set_parameter_command(&param(ParameterDraft::new("dev", "web", "k").value("v")));
        assert_eq!(cmd.argv(), [
            "cloudtruth", "--env", "dev", "--project", "web", "param", "set", "--value", "v", "k"
        ]);
    }

    #[test]
    fn test_set_parameter_secret_and_reference_arguments() {
        let cli = CloudTruthCli::new("ct");
        let cmd = cli.set_parameter_command(&param(
            ParameterDraft::new("dev", "web", "k").fqn("github://a/b").jmes("x.y").secret(true),
        ));
        assert_eq!(cmd.get_args(), [
            "--env", "dev", "--project", "web", "param", "set", "--secret", "true", "--fqn",
            "github://a/b", "--jmes", "x.y", "k"
        ]);

        let cmd = cli.set_parameter_command(&param(ParameterDraft::new("dev", "web", "k").fqn("f")));
        assert_eq!(cmd.get_args(), [
            "--env", "dev", "--project", "web", "param", "set", "--fqn", "f", "k"
        ]);
    }

    #[test]
    fn test_empty_value_is_still_a_value() {
        let cli = CloudTruthCli::default();
        let cmd = cli.set_parameter_command(&param(ParameterDraft::new("dev", "web", "k").value("")));
        assert!(cmd.get_args().windows(2).any(|w| w[0] == "--value" && w[1].is_empty()));
    }

    #[test]
    fn test_ensure_arguments() {
        let cli = CloudTruthCli::default();
        assert_eq!(cli.ensure_command("environments", "dev", Some("default")).get_args(), [
            "environments", "set", "--parent", "default", "dev"
        ]);
        assert_eq!(cli.ensure_command("projects", "web", Some("")).get_args(), [
            "projects", "set", "web"
        ]);
        assert_eq!(cli.ensure_command("projects", "web", None).get_args(), ["projects", "set", "web"]);
    }

    #[test]
    fn test_import_arguments() {
        let cli = CloudTruthCli::default();
        let cmd = cli.import_command("web", "dev", "/tmp/importer.yml", &["pass"], true);
        assert_eq!(cmd.get_args(), [
            "import", "parameters", "--environment", "dev", "web", "/tmp/importer.yml",
            "--secret", "pass", "--no-inherit"
        ]);

        let cmd = cli.with_dry_run(true).import_command("web", "dev", "f.yml", &[], false);
        assert_eq!(cmd.get_args().last().map(String::as_str), Some("--preview"));
    }

    #[test]
    fn test_import_document_skips_references() {
        let params = vec![
            param(ParameterDraft::new("dev", "web", "a").value("1")),
            param(ParameterDraft::new("dev", "web", "b").fqn("f")),
            param(ParameterDraft::new("dev", "web", "c").value("x: y")),
        ];
        let doc = import_document(&params).unwrap();
        let parsed: serde_yaml::Mapping = serde_yaml::from_str(&doc).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("a").and_then(|v| v.as_str()), Some("1"));
        assert_eq!(parsed.get("c").and_then(|v| v.as_str()), Some("x: y"));
    }

    #[tokio::test]
    async fn test_dry_run_mutations_do_not_execute() {
        let cli = CloudTruthCli::new("/nonexistent/cloudtruth-importer-test").with_dry_run(true);
        cli.ensure_environment("dev", Some("default")).await.unwrap();
        cli.ensure_project("web", None).await.unwrap();
        cli.set_parameter(&param(ParameterDraft::new("dev", "web", "k").value("v"))).await.unwrap();
    }

    #[tokio::test]
    async fn test_dry_run_query_failure_is_empty() {
        let cli = CloudTruthCli::new("/nonexistent/cloudtruth-importer-test").with_dry_run(true);
        assert!(cli.parameter_names("web").await.unwrap().is_empty());
        assert!(cli.list_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_without_dry_run_is_fatal() {
        let cli = CloudTruthCli::new("/nonexistent/cloudtruth-importer-test");
        let err = cli.parameter_names("web").await.unwrap_err();
        assert!(matches!(err, ImporterError::StoreUnavailable { .. }));
    }

    #[cfg(unix)]
    mod with_fake_cli {
        use super::*;
        use crate::test_utils::FakeCli;
        use tempfile::TempDir;

        #[tokio::test]
        async fn test_parameter_names() {
            let temp = TempDir::new().unwrap();
            let fake = FakeCli::new(temp.path())
                .respond("--project web param ls", "one\ntwo\n")
                .install()
                .unwrap();
            let cli = CloudTruthCli::new(fake.program());

            let names = cli.parameter_names("web").await.unwrap();
            assert_eq!(names, HashSet::from(["one".to_string(), "two".to_string()]));
            assert_eq!(fake.invocations(), ["--project web param ls"]);
        }

        #[tokio::test]
        async fn test_no_parameters_found_is_empty() {
            let temp = TempDir::new().unwrap();
            let fake = FakeCli::new(temp.path())
                .respond("param ls", "No parameters found in project web\n")
                .install()
                .unwrap();
            let cli = CloudTruthCli::new(fake.program());
            assert!(cli.parameter_names("web").await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_lists() {
            let temp = TempDir::new().unwrap();
            let fake = FakeCli::new(temp.path())
                .respond("environments list", "default\ndev\n")
                .respond("projects list", "web\n")
                .install()
                .unwrap();
            let cli = CloudTruthCli::new(fake.program());
            assert_eq!(cli.list_environments().await.unwrap().len(), 2);
            assert!(cli.list_projects().await.unwrap().contains("web"));
        }

        #[tokio::test]
        async fn test_failed_mutation_reports_exit_code() {
            let temp = TempDir::new().unwrap();
            let fake = FakeCli::new(temp.path()).fail_on("param set").install().unwrap();
            let cli = CloudTruthCli::new(fake.program());

            let err = cli
                .set_parameter(&param(ParameterDraft::new("dev", "web", "k").value("v")))
                .await
                .unwrap_err();
            match err {
                ImporterError::ExternalCommand {
                    exit_code,
                    stderr,
                    ..
                } => {
                    assert_eq!(exit_code, Some(1));
                    assert!(stderr.contains("simulated failure"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_dry_run_query_failure_is_ignored() {
            let temp = TempDir::new().unwrap();
            let fake = FakeCli::new(temp.path()).fail_on("param ls").install().unwrap();
            let cli = CloudTruthCli::new(fake.program()).with_dry_run(true);

            assert!(cli.parameter_names("web").await.unwrap().is_empty());
            cli.set_parameter(&param(ParameterDraft::new("dev", "web", "k").value("v")))
                .await
                .unwrap();
            assert_eq!(fake.invocations(), ["--project web param ls"]);
        }

        #[tokio::test]
        async fn test_import_sends_document() {
            let temp = TempDir::new().unwrap();
            let fake = FakeCli::new(temp.path()).install().unwrap();
            let cli = CloudTruthCli::new(fake.program()).with_dry_run(true);
            let params = vec![
                param(ParameterDraft::new("dev", "web", "a").value("1")),
                param(ParameterDraft::new("dev", "web", "b").value("2").secret(true)),
            ];

            cli.import_parameters("web", "dev", &params, false).await.unwrap();

            let calls = fake.invocations();
            assert_eq!(calls.len(), 1);
            assert!(calls[0].starts_with("import parameters --environment dev web "));
            assert!(calls[0].ends_with("--secret b --preview"));
            let imported: serde_yaml::Mapping =
                serde_yaml::from_str(&fake.imported_documents()).unwrap();
            assert_eq!(imported.get("a").and_then(|v| v.as_str()), Some("1"));
            assert_eq!(imported.get("b").and_then(|v| v.as_str()), Some("2"));
        }
    }
}

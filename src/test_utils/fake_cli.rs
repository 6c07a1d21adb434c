//! Shell script standing in for the `cloudtruth` executable

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// A fake `cloudtruth` installed as an executable script.
///
/// Each invocation appends its arguments (space separated) as one line to a
/// log file. Responses and failures are selected by substring match against
/// the argument line, first rule wins. For `import parameters` the imported
/// file is appended to a second log so tests can inspect it after the
/// temporary file is gone.
#[derive(Debug, Clone)]
pub struct FakeCli {
    script: PathBuf,
    log: PathBuf,
    imports: PathBuf,
    responses: Vec<(String, String)>,
    failures: Vec<String>,
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

impl FakeCli {
    /// Describe a fake living in `dir`; nothing is written until
    /// [`FakeCli::install`]
    pub fn new(dir: &Path) -> Self {
        Self {
            script: dir.join("cloudtruth"),
            log: dir.join("cloudtruth.log"),
            imports: dir.join("cloudtruth-imports.log"),
            responses: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Print `stdout` when the arguments contain `args_contain`
    #[must_use]
    pub fn respond(mut self, args_contain: &str, stdout: &str) -> Self {
        self.responses.push((args_contain.to_string(), stdout.to_string()));
        self
    }

    /// Exit 1 with a message on stderr when the arguments contain `args_contain`
    #[must_use]
    pub fn fail_on(mut self, args_contain: &str) -> Self {
        self.failures.push(args_contain.to_string());
        self
    }

    fn script_body(&self) -> String {
        let mut body = String::from("#!/bin/sh\n");
        let _ = writeln!(body, "printf '%s\\n' \"$*\" >> {}", quote(&self.log.to_string_lossy()));
        let _ = writeln!(
            body,
            "if [ \"$1 $2\" = \"import parameters\" ]; then cat \"$6\" >> {}; fi",
            quote(&self.imports.to_string_lossy())
        );
        body.push_str("case \"$*\" in\n");
        for pattern in &self.failures {
            let _ = writeln!(
                body,
                "  *{}*) echo 'simulated failure' >&2; exit 1 ;;",
                quote(pattern)
            );
        }
        for (pattern, stdout) in &self.responses {
            let _ = writeln!(body, "  *{}*) printf '%s' {} ;;", quote(pattern), quote(stdout));
        }
        body.push_str("esac\nexit 0\n");
        body
    }

    /// Write the script and make it executable
    pub fn install(self) -> Result<Self> {
        std::fs::write(&self.script, self.script_body())
            .with_context(|| format!("Failed to write {}", self.script.display()))?;
        std::fs::set_permissions(&self.script, std::fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to chmod {}", self.script.display()))?;
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        &self.script
    }

    /// The script path as a program name for the store adapter
    pub fn program(&self) -> String {
        self.script.to_string_lossy().into_owned()
    }

    /// Argument lines of every invocation so far
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Concatenated contents of every imported document
    pub fn imported_documents(&self) -> String {
        std::fs::read_to_string(&self.imports).unwrap_or_default()
    }
}

//! Shared helpers for the integration suite
//!
//! [`TestWorkspace`] owns a temporary directory with two halves: `data/`,
//! where input files are written and the binary runs, and `bin/`, holding a
//! fake `cloudtruth` that records its arguments.

use assert_cmd::Command;
use cloudtruth_importer::test_utils::FakeCli;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestWorkspace {
    _temp: TempDir,
    data: PathBuf,
    fake: FakeCli,
}

impl TestWorkspace {
    /// Workspace with a fake CLI that answers nothing and always succeeds
    pub fn new() -> Self {
        Self::with_fake(|fake| fake)
    }

    /// Workspace whose fake CLI is configured by `configure`
    pub fn with_fake(configure: impl FnOnce(FakeCli) -> FakeCli) -> Self {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        let data = temp.path().join("data");
        fs::create_dir_all(&bin).unwrap();
        fs::create_dir_all(&data).unwrap();

        let fake = configure(FakeCli::new(&bin)).install().unwrap();
        Self {
            _temp: temp,
            data,
            fake,
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.data
    }

    /// Write `contents` to `relative` under `data/`, creating directories
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.data.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    /// The importer binary, run in `data/` against the fake CLI
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cloudtruth-importer").unwrap();
        cmd.current_dir(&self.data)
            .env("CLOUDTRUTH_IMPORTER_CLI", self.fake.program())
            .env_remove("RUST_LOG")
            .arg("--no-color");
        cmd
    }

    /// Argument lines the fake CLI received, with the program path omitted
    pub fn invocations(&self) -> Vec<String> {
        self.fake.invocations()
    }

    /// Invocations that changed state (everything except lookups)
    pub fn mutations(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .filter(|line| !line.ends_with("param ls") && !line.ends_with(" list"))
            .collect()
    }

    pub fn imported_documents(&self) -> String {
        self.fake.imported_documents()
    }
}

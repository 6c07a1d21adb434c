use predicates::prelude::*;

use crate::common::TestWorkspace;

#[test]
fn test_dry_run_logs_mutations_without_running_them() {
    let ws = TestWorkspace::new();
    ws.write("proj1/dev/a.yaml", "foo: bar\n");

    ws.command()
        .args([
            "--path-selector",
            "(?<project>[^/]+)/(?<environment>[^/]+)/.+",
            "--create-environments",
            "--dry-run",
            ".",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains(r#""environments", "set", "--parent", "default", "dev""#))
        .stderr(predicate::str::contains(
            r#""--env", "dev", "--project", "proj1", "param", "set", "--value", "bar", "foo""#,
        ));

    // Only the read-only lookup reached the store
    assert_eq!(ws.invocations(), vec!["--project proj1 param ls"]);
}

#[test]
fn test_dry_run_tolerates_failed_lookup() {
    let ws = TestWorkspace::with_fake(|fake| fake.fail_on("param ls"));
    ws.write("a.json", r#"{"foo": "bar"}"#);

    ws.command()
        .args(["-n", "a.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Ignoring failure in param lookup due to dry run"));
}

#[test]
fn test_failed_lookup_is_fatal_without_dry_run() {
    let ws = TestWorkspace::with_fake(|fake| fake.fail_on("param ls"));
    ws.write("a.json", r#"{"foo": "bar"}"#);

    ws.command()
        .arg("a.json")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cloudtruth CLI exited with non-zero exit code: 1"));

    assert!(ws.mutations().is_empty());
}

#[test]
fn test_dry_run_bulk_import_uses_preview() {
    let ws = TestWorkspace::new();
    ws.write("a.yaml", "foo: bar\n");

    ws.command().args(["--bulk-import", "--dry-run", "-o", "a.yaml"]).assert().success();

    let invocations = ws.invocations();
    assert_eq!(invocations.len(), 1);
    assert!(invocations[0].starts_with("import parameters --environment default default "));
    assert!(invocations[0].ends_with(" --preview"));
}

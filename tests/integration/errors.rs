use predicates::prelude::*;

use crate::common::TestWorkspace;

#[test]
fn test_path_or_stdin_is_required() {
    let ws = TestWorkspace::new();

    ws.command().assert().failure().stderr(predicate::str::contains("PATH"));
    assert!(ws.invocations().is_empty());
}

#[test]
fn test_parse_failure_stops_before_any_store_call() {
    let ws = TestWorkspace::new();
    ws.write("a.json", r#"{"foo": "bar"}"#);
    ws.write("b.json", "{not json");

    ws.command()
        .arg(".")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: Failed to parse file 'b.json' as type 'json'"));

    assert!(ws.invocations().is_empty());
}

#[test]
fn test_undefined_template_variable() {
    let ws = TestWorkspace::new();
    ws.write("a.json", r#"{"foo": "bar"}"#);

    ws.command()
        .args(["--transform", "{{ envirnment }}", "a.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Template variable not found: 'envirnment' (did you mean 'environment'?)",
        ))
        .stderr(predicate::str::contains("and variable context:"));
}

#[test]
fn test_invalid_parameter_definition() {
    let ws = TestWorkspace::new();
    ws.write("a.json", r#"{"foo": "bar"}"#);

    ws.command()
        .args(["--transform", "- {environment: e, project: p, key: k}", "a.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("A parameter value or fqn is required for key 'k'"));
}

#[test]
fn test_invalid_path_selector() {
    let ws = TestWorkspace::new();
    ws.write("a.json", r#"{"foo": "bar"}"#);

    ws.command()
        .args(["--path-selector", "(unclosed", "a.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid path selector '(unclosed'"));
}

#[test]
fn test_environment_cycle_is_rejected() {
    let ws = TestWorkspace::new();
    ws.write("a.json", "{}");
    let transform = "\
- {environment: a, environment_parent: b, project: p, key: k, value: v}
- {environment: b, environment_parent: a, project: p, key: k, value: v}
";

    ws.command()
        .args(["--transform", transform, "--create-environments", "a.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Circular environment hierarchy detected"));

    assert!(ws.invocations().is_empty());
}

#[test]
fn test_store_failure_reports_command() {
    let ws = TestWorkspace::with_fake(|fake| fake.fail_on("param set"));
    ws.write("a.json", r#"{"foo": "bar"}"#);

    ws.command()
        .args(["-o", "a.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cloudtruth CLI exited with non-zero exit code: 1"))
        .stderr(predicate::str::contains("simulated failure"));
}

#[test]
fn test_version() {
    let ws = TestWorkspace::new();
    ws.command()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

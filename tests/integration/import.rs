use predicates::prelude::*;

use crate::common::TestWorkspace;

const LAYOUT_SELECTOR: &str = "(?<project>[^/]+)/(?<environment>[^/]+)/.+";

/// proj1/dev/a.yaml becomes parameter foo=bar in project proj1, environment dev
#[test]
fn test_directory_layout_drives_project_and_environment() {
    let ws = TestWorkspace::new();
    ws.write("proj1/dev/a.yaml", "foo: bar\n");

    ws.command()
        .args(["--path-selector", LAYOUT_SELECTOR, "--create-environments", "--create-projects", "."])
        .assert()
        .success();

    assert_eq!(ws.invocations(), vec![
        "environments set --parent default dev",
        "projects set proj1",
        "--project proj1 param ls",
        "--env dev --project proj1 param set --value bar foo",
    ]);
}

#[test]
fn test_existing_keys_are_not_overwritten() {
    let ws = TestWorkspace::with_fake(|fake| fake.respond("--project proj1 param ls", "foo\n"));
    ws.write("proj1/dev/a.yaml", "foo: bar\nbaz: boo\n");

    ws.command()
        .args(["--path-selector", LAYOUT_SELECTOR, "."])
        .assert()
        .success()
        .stderr(predicate::str::contains("No new parameters").not());

    assert_eq!(ws.mutations(), vec!["--env dev --project proj1 param set --value boo baz"]);
}

#[test]
fn test_override_writes_existing_keys() {
    let ws = TestWorkspace::with_fake(|fake| fake.respond("--project proj1 param ls", "foo\n"));
    ws.write("proj1/dev/a.yaml", "foo: bar\nbaz: boo\n");

    ws.command().args(["--path-selector", LAYOUT_SELECTOR, "--override", "."]).assert().success();

    assert_eq!(ws.invocations(), vec![
        "--env dev --project proj1 param set --value bar foo",
        "--env dev --project proj1 param set --value boo baz",
    ]);
}

#[test]
fn test_group_with_only_existing_keys_is_reported() {
    let ws = TestWorkspace::with_fake(|fake| fake.respond("--project web param ls", "foo\n"));
    ws.write("a.json", r#"{"foo": "bar"}"#);

    ws.command()
        .args(["--project", "web", "--environment", "dev", "a.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "No new parameters for {environment: dev, project: web}",
        ));

    assert!(ws.mutations().is_empty());
}

#[test]
fn test_environment_chain_is_created_parents_first() {
    let ws = TestWorkspace::new();
    ws.write("data.json", r#"{"ignored": true}"#);
    let transform = "\
- environment: env3
  environment_parent: env2
  project: p
  key: k3
  value: v
- environment: env2
  environment_parent: env1
  project: p
  key: k2
  value: v
";

    ws.command()
        .args(["--transform", transform, "--create-environments", "-o", "data.json"])
        .assert()
        .success();

    assert_eq!(ws.invocations(), vec![
        "environments set --parent default env1",
        "environments set --parent env1 env2",
        "environments set --parent env2 env3",
        "--env env3 --project p param set --value v k3",
        "--env env2 --project p param set --value v k2",
    ]);
}

#[test]
fn test_hidden_directories_are_pruned() {
    let ws = TestWorkspace::new();
    ws.write(".hidden/x.json", r#"{"hidden": "1"}"#);
    ws.write("visible/y.json", r#"{"shown": "2"}"#);

    ws.command().args(["-o", "."]).assert().success();

    assert_eq!(ws.invocations(), vec![
        "--env default --project default param set --value 2 shown"
    ]);
}

#[test]
fn test_files_are_processed_in_name_order() {
    let ws = TestWorkspace::new();
    ws.write("b.properties", "SECOND=2\n");
    ws.write("a.json", r#"{"first": "1"}"#);
    ws.write("readme.txt", "not data");

    ws.command()
        .args(["-o", "."])
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipping file 'readme.txt'"));

    assert_eq!(ws.invocations(), vec![
        "--env default --project default param set --value 1 first",
        "--env default --project default param set --value 2 SECOND",
    ]);
}

#[test]
fn test_transform_file_with_secrets_and_references() {
    let ws = TestWorkspace::new();
    ws.write("app/config.json", r#"{"db": {"password": "hunter2", "host": "db.local"}}"#);
    let transform = ws.write(
        "../transform.tmpl",
        r#"{% for key, value in data.db %}
- environment: {{ environment }}
  project: {{ project }}
  key: {{ key | env_safe }}
  value: {{ value | stringify }}
  secret: {{ key == "password" }}
{% endfor %}
- environment: {{ environment }}
  project: {{ project }}
  key: SHARED
  fqn: github://org/repo/main/shared.yaml
  jmes: a.b
"#,
    );

    ws.command()
        .args(["--transform-file", transform.to_str().unwrap(), "--project", "app", "-o", "app"])
        .assert()
        .success();

    assert_eq!(ws.invocations(), vec![
        "--env default --project app param set --secret true --value hunter2 PASSWORD",
        "--env default --project app param set --value db.local HOST",
        "--env default --project app param set --fqn github://org/repo/main/shared.yaml --jmes a.b SHARED",
    ]);
}

#[test]
fn test_bulk_import_sends_one_document_per_group() {
    let ws = TestWorkspace::new();
    ws.write("proj1/dev/a.yaml", "foo: bar\nbaz: boo\n");

    ws.command()
        .args(["--path-selector", LAYOUT_SELECTOR, "--bulk-import", "--no-inherit", "."])
        .assert()
        .success();

    let mutations = ws.mutations();
    assert_eq!(mutations.len(), 1);
    assert!(mutations[0].starts_with("import parameters --environment dev proj1 "));
    assert!(mutations[0].ends_with(" --no-inherit"));

    let imported = ws.imported_documents();
    assert!(imported.contains("foo: bar"));
    assert!(imported.contains("baz: boo"));
}

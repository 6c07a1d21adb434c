use predicates::prelude::*;

use crate::common::TestWorkspace;

#[test]
fn test_reads_dotenv_from_stdin() {
    let ws = TestWorkspace::new();

    ws.command()
        .args(["--stdin", "dotenv", "--environment", "dev", "--project", "web", "-o"])
        .write_stdin("PORT=8080\nHOST=localhost\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Reading parameter data from stdin"));

    assert_eq!(ws.invocations(), vec![
        "--env dev --project web param set --value 8080 PORT",
        "--env dev --project web param set --value localhost HOST",
    ]);
}

#[test]
fn test_stdin_is_read_before_paths() {
    let ws = TestWorkspace::new();
    ws.write("a.json", r#"{"from_file": "1"}"#);

    ws.command()
        .args(["-s", "yaml", "-o", "a.json"])
        .write_stdin("from_stdin: 2\n")
        .assert()
        .success();

    assert_eq!(ws.invocations(), vec![
        "--env default --project default param set --value 2 from_stdin",
        "--env default --project default param set --value 1 from_file",
    ]);
}

#[test]
fn test_stdin_filename_in_context() {
    let ws = TestWorkspace::new();

    ws.command()
        .args([
            "-s",
            "json",
            "-o",
            "--transform",
            "- {environment: e, project: p, key: source, value: {{ filename | stringify }}}",
        ])
        .write_stdin(r#"{"a": 1}"#)
        .assert()
        .success();

    assert_eq!(ws.invocations(), vec!["--env e --project p param set --value stdin source"]);
}

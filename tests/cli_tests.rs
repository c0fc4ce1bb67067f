#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use std::path::Path;
use tempfile::{NamedTempFile, tempdir};

#[allow(deprecated)]
fn run_cli(data_dir: &Path, script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env("TASKSET_TOOL_DATA_DIR", data_dir)
        .env_remove("TASKSET_TOOL_CONFIG")
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_reports_validation_errors() {
    let dir = tempdir().unwrap();
    run_cli(dir.path(), "new demo\nadd T1 0 5 1 1\nquit\n")
        .success()
        .stdout(str_contains("Period must be strictly greater than 0"));
}

#[test]
fn cli_requires_a_selected_set() {
    let dir = tempdir().unwrap();
    run_cli(dir.path(), "add T1 10 10 2 1\nshow\nquit\n")
        .success()
        .stdout(str_contains("No task set selected."));
}

#[test]
fn cli_shows_tasks_in_insertion_order() {
    let dir = tempdir().unwrap();
    let assert = run_cli(
        dir.path(),
        "new demo\nadd T1 10 10 2 1\nadd T2 20 20 3 0 1 5 #00FF00\nadd T1 10 8 2 1\nshow\nquit\n",
    )
    .success()
    .stdout(str_contains("Registered task set 'demo'."))
    .stdout(str_contains("Task 'T1' replaced."));
    let output = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let table = output.split("Task set 'demo'").last().unwrap_or_default();
    let t1 = table.find("T1").expect("T1 listed");
    let t2 = table.find("T2").expect("T2 listed");
    assert!(t2 < t1, "re-inserted task should be listed last:\n{table}");
    assert!(table.contains("#00FF00"));
}

#[test]
fn cli_save_persists_across_runs() {
    let dir = tempdir().unwrap();
    run_cli(dir.path(), "new kept\nadd T1 10 10 2 1\nsave\nnew unsaved\nquit\n")
        .success()
        .stdout(str_contains("Saved 1 task set(s)"));
    assert!(dir.path().join("root.tasksets").is_file());

    run_cli(dir.path(), "sets\nuse kept\nshow\nquit\n")
        .success()
        .stdout(str_contains("1 task set(s) loaded"))
        .stdout(str_contains("0: kept"))
        .stdout(str_contains("T1"));
}

#[test]
fn cli_drop_removes_a_set() {
    let dir = tempdir().unwrap();
    run_cli(dir.path(), "new a\nnew b\ndrop a\nsets\ndrop a\nquit\n")
        .success()
        .stdout(str_contains("Removed task set 'a'."))
        .stdout(str_contains("0: b"))
        .stdout(str_contains("Task set 'a' not found."));
}

#[test]
fn cli_export_and_import_csv() {
    let dir = tempdir().unwrap();
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!(
        "new source\nadd T1 10 10 2 1 -\nexport csv {path}\nimport csv {path} copy\nshow\nquit\n"
    );
    run_cli(dir.path(), &script)
        .success()
        .stdout(str_contains("Task set exported to"))
        .stdout(str_contains("Registered task set 'copy'."))
        .stdout(str_contains("Task set 'copy' (1 tasks)"));
}

//! End-to-end tests for the `studyview` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DUMP: &str = r#"{
    "name": "toy",
    "directions": ["minimize"],
    "objective_names": ["loss"],
    "created_at": "2024-03-07T09:05:02Z",
    "trials": [
        {"number": 0, "state": "COMPLETE", "values": [1.0], "params": {"lr": 0.1}},
        {"number": 1, "state": "COMPLETE", "values": [2.0], "params": {"lr": 0.2}},
        {"number": 2, "state": "COMPLETE", "values": [3.0], "params": {"lr": 0.3}},
        {"number": 3, "state": "FAIL"}
    ]
}"#;

fn studyview() -> Command {
    Command::cargo_bin("studyview").unwrap()
}

fn import_toy(tmp: &TempDir) -> std::path::PathBuf {
    let studies = tmp.path().join("studies");
    let dump = tmp.path().join("toy.json");
    std::fs::write(&dump, DUMP).unwrap();
    studyview()
        .arg("import")
        .arg(&studies)
        .arg(&dump)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 'toy' with 4 trials"));
    studies
}

#[test]
fn test_list_empty_dir() {
    let tmp = TempDir::new().unwrap();
    studyview()
        .arg("list")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No studies found"));
}

#[test]
fn test_import_then_list_and_show() {
    let tmp = TempDir::new().unwrap();
    let studies = import_toy(&tmp);

    studyview()
        .arg("list")
        .arg(&studies)
        .assert()
        .success()
        .stdout(predicate::str::contains("toy").and(predicate::str::contains("minimize")));

    studyview()
        .arg("show")
        .arg(&studies)
        .arg("toy")
        .assert()
        .success()
        .stdout(predicate::str::contains("COMPLETE").and(predicate::str::contains("lr=0.2")));
}

#[test]
fn test_import_refuses_overwrite() {
    let tmp = TempDir::new().unwrap();
    import_toy(&tmp);
    studyview()
        .arg("import")
        .arg(tmp.path().join("studies"))
        .arg(tmp.path().join("toy.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_edf_json_output() {
    let tmp = TempDir::new().unwrap();
    let studies = import_toy(&tmp);

    let output = studyview()
        .arg("edf")
        .arg(&studies)
        .arg("toy")
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let curves: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let curve = curves[0]["curve"].as_array().unwrap();
    assert_eq!(curves[0]["label"], "toy");
    assert_eq!(curve.len(), 100);
    assert_eq!(curve[99]["y"], 1.0);
}

#[test]
fn test_edf_table_on_param() {
    let tmp = TempDir::new().unwrap();
    let studies = import_toy(&tmp);
    studyview()
        .arg("edf")
        .arg(&studies)
        .arg("toy")
        .args(["--target", "params:lr"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Param lr").and(predicate::str::contains("1.0000")));
}

#[test]
fn test_edf_rejects_unknown_target() {
    let tmp = TempDir::new().unwrap();
    let studies = import_toy(&tmp);
    studyview()
        .arg("edf")
        .arg(&studies)
        .arg("toy")
        .args(["--target", "objective:4"])
        .assert()
        .failure();
}

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// Stub solver: singular on the 24-bus case, diverges on the infinite grid,
// converges otherwise. Every request is appended to requests.log.
#[cfg(unix)]
const STUB_SOLVER: &str = r#"#!/bin/sh
request=$(cat)
printf '%s\n' "$request" >> "$(dirname "$0")/requests.log"
case "$request" in
  *case24_ieee_rts1996_MTDC*) echo "Matrix is singular" >&2; exit 2 ;;
  *case3_inf*) converged=0 ;;
  *) converged=1 ;;
esac
printf '{"baseMVA":100,"bus":[[1,3,0,0,1.06,0]],"gen":[[1,40]],"branch":[[1,2,0.02]],"busdc":[[1,1,345]],"convdc":[[1,2,60]],"branchdc":[[1,2,0.052]],"converged":%s,"elapsed_seconds":0.0123}' "$converged"
"#;

#[cfg(unix)]
fn stub_solver(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("stub-solver.sh");
    fs::write(&path, STUB_SOLVER).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[cfg(unix)]
#[test]
fn run_builtin_suite_writes_store_and_summary() {
    let dir = tempdir().unwrap();
    let solver = stub_solver(dir.path());
    let out = dir.path().join("results").join("acdc_results.json");
    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args([
        "run",
        "--solver",
        solver.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("test1_slack: PASS"))
    .stdout(predicate::str::contains("test2_droop: PASS"))
    .stdout(predicate::str::contains("test3_inf: NO CONVERGENCE"))
    .stdout(predicate::str::contains("test4_multi: FAILED"))
    .stdout(predicate::str::contains("Results saved to"))
    .stdout(predicate::str::contains("start").count(4))
    .stdout(predicate::str::contains("done").count(3))
    .stdout(predicate::str::contains("failed").count(1))
    .stdout(predicate::str::contains("elapsed_s").count(4));

    let doc = read_json(&out);
    let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, ["test1_slack", "test2_droop", "test3_inf", "test4_multi"]);
    assert_eq!(doc["test1_slack"]["case_ac"], "case5_stagg");
    assert_eq!(doc["test1_slack"]["case_dc"], "case5_stagg_MTDCslack");
    assert_eq!(doc["test1_slack"]["converged"], 1);
    assert_eq!(doc["test1_slack"]["timecalc"], 0.0123);
    assert_eq!(doc["test1_slack"]["resultsdc"]["busdc"], json!([[1.0, 1.0, 345.0]]));
    assert!(doc["test4_multi"]["error"]
        .as_str()
        .unwrap()
        .contains("Matrix is singular"));
    assert!(doc["test4_multi"].get("resultsac").is_none());

    let requests = fs::read_to_string(dir.path().join("requests.log")).unwrap();
    assert_eq!(requests.lines().count(), 4);
    assert!(requests.contains(r#""suppress_output":true"#));
}

#[cfg(unix)]
#[test]
fn verbose_solver_flag_reaches_solver() {
    let dir = tempdir().unwrap();
    let solver = stub_solver(dir.path());
    let out = dir.path().join("results.json");
    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args([
        "run",
        "--solver",
        solver.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--verbose-solver",
    ])
    .assert()
    .success();
    let requests = fs::read_to_string(dir.path().join("requests.log")).unwrap();
    assert!(requests.contains(r#""suppress_output":false"#));
    assert!(!requests.contains(r#""suppress_output":true"#));
}

#[cfg(unix)]
#[test]
fn unwritable_store_fails_the_run() {
    let dir = tempdir().unwrap();
    let solver = stub_solver(dir.path());
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let out = blocker.join("results.json");
    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args([
        "run",
        "--solver",
        solver.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ])
    .assert()
    .failure();
}

#[cfg(unix)]
#[test]
fn custom_suite_runs_in_file_order() {
    let dir = tempdir().unwrap();
    let solver = stub_solver(dir.path());
    let suite = dir.path().join("suite.yaml");
    fs::write(
        &suite,
        r#"
scenarios:
  - name: inf_first
    ac_case: case3_inf
    dc_case: case5_stagg_MTDCdroop
  - name: slack_second
    ac_case: case5_stagg
    dc_case: case5_stagg_MTDCslack
    options:
      itmax_acdc: 25
"#,
    )
    .unwrap();
    let out = dir.path().join("results.json");
    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args([
        "run",
        "--suite",
        suite.to_str().unwrap(),
        "--solver",
        solver.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("inf_first: NO CONVERGENCE"))
    .stdout(predicate::str::contains("slack_second: PASS"));
    let keys: Vec<_> = read_json(&out).as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, ["inf_first", "slack_second"]);
    let requests = fs::read_to_string(dir.path().join("requests.log")).unwrap();
    assert!(requests.contains(r#""itmax_acdc":25"#));
}

#[test]
fn missing_solver_binary_fails_every_scenario_but_not_the_run() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("results.json");
    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args([
        "run",
        "--solver",
        dir.path().join("no-such-solver").to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("test1_slack: FAILED"))
    .stdout(predicate::str::contains("test4_multi: FAILED"));
    let doc = read_json(&out);
    assert_eq!(doc.as_object().unwrap().len(), 4);
    assert!(doc["test2_droop"]["error"]
        .as_str()
        .unwrap()
        .contains("Failed to start solver process"));
}

#[test]
fn duplicate_suite_names_are_fatal() {
    let dir = tempdir().unwrap();
    let suite = dir.path().join("suite.json");
    fs::write(
        &suite,
        r#"{"scenarios": [
            {"name": "dup", "ac_case": "case5_stagg", "dc_case": "case5_stagg_MTDCslack"},
            {"name": "dup", "ac_case": "case5_stagg", "dc_case": "case5_stagg_MTDCdroop"}
        ]}"#,
    )
    .unwrap();
    let out = dir.path().join("results.json");
    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args([
        "run",
        "--suite",
        suite.to_str().unwrap(),
        "--solver",
        "/bin/true",
        "--out",
        out.to_str().unwrap(),
    ])
    .assert()
    .failure();
    assert!(!out.exists());
}

#[test]
fn summary_classifies_foreign_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("matlab_results.json");
    fs::write(
        &path,
        r#"{
            "test1_slack": {"converged": 1, "timecalc": 0.01},
            "test2_droop": {"converged": false},
            "test3_inf": {"error": "Matrix is singular", "converged": 1},
            "test4_multi": {"timecalc": 0.02}
        }"#,
    )
    .unwrap();
    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args(["summary", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("test1_slack: PASS"))
        .stdout(predicate::str::contains("test2_droop: NO CONVERGENCE"))
        .stdout(predicate::str::contains("test3_inf: FAILED"))
        .stdout(predicate::str::contains("test4_multi: UNKNOWN"));
}

fn stored_record(vm: f64) -> Value {
    json!({
        "resultsac": {
            "baseMVA": 100.0,
            "bus": [[1.0, 3.0, 0.0, 0.0, 0.0, 0.0, 1.0, vm, 0.0]],
            "gen": [[1.0, 40.0]],
            "branch": [[1.0, 2.0, 0.02]]
        },
        "resultsdc": {
            "busdc": [[1.0, 1.0, 345.0]],
            "convdc": [[1.0, 2.0, 60.0]],
            "branchdc": [[1.0, 2.0, 0.052]]
        },
        "converged": 1,
        "timecalc": 0.0123,
        "case_ac": "case5_stagg",
        "case_dc": "case5_stagg_MTDCslack"
    })
}

#[test]
fn compare_passes_on_identical_stores_and_fails_on_drift() {
    let dir = tempdir().unwrap();
    let reference = dir.path().join("reference.json");
    let same = dir.path().join("same.json");
    let drifted = dir.path().join("drifted.json");
    fs::write(&reference, json!({"test1_slack": stored_record(1.06)}).to_string()).unwrap();
    fs::write(&same, json!({"test1_slack": stored_record(1.06)}).to_string()).unwrap();
    fs::write(&drifted, json!({"test1_slack": stored_record(1.2)}).to_string()).unwrap();

    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args(["compare", reference.to_str().unwrap(), same.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("All scenarios match the reference"));

    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args(["compare", reference.to_str().unwrap(), drifted.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("DIFFERENCES_FOUND"));
}

#[test]
fn compare_writes_report_and_detailed_block() {
    let dir = tempdir().unwrap();
    let reference = dir.path().join("reference.json");
    let drifted = dir.path().join("drifted.json");
    let report = dir.path().join("comparison_report.txt");
    fs::write(&reference, json!({"test1_slack": stored_record(1.06)}).to_string()).unwrap();
    fs::write(&drifted, json!({"test1_slack": stored_record(1.2)}).to_string()).unwrap();

    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args([
        "compare",
        reference.to_str().unwrap(),
        drifted.to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
        "--detailed",
        "test1_slack",
    ])
    .assert()
    .failure()
    .stdout(predicate::str::contains("Report saved to"))
    .stdout(predicate::str::contains("Detailed comparison - test1_slack"))
    .stdout(predicate::str::contains("bus Voltage magnitude (VM):"))
    .stdout(predicate::str::contains("Bus 1: reference=1.060000, candidate=1.200000"))
    .stdout(predicate::str::contains("convdc Converter losses (PCLOSS):\n  unavailable"));

    let text = fs::read_to_string(&report).unwrap();
    assert!(text.contains("Scenario: test1_slack"));
    assert!(text.contains("Status: DIFFERENCES_FOUND"));
    assert!(text.contains("Reference converged: 1"));
}

#[test]
fn compare_detailed_unknown_scenario_is_an_error() {
    let dir = tempdir().unwrap();
    let reference = dir.path().join("reference.json");
    fs::write(&reference, json!({"test1_slack": stored_record(1.06)}).to_string()).unwrap();

    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args([
        "compare",
        reference.to_str().unwrap(),
        reference.to_str().unwrap(),
        "--detailed",
        "test9_missing",
    ])
    .assert()
    .failure()
    .stdout(predicate::str::contains("not found in both result stores"));
}

#[test]
fn compare_nan_cells_need_nan_equal() {
    let dir = tempdir().unwrap();
    let reference = dir.path().join("reference.json");
    let mut record = stored_record(1.06);
    record["resultsac"]["gen"] = json!([[1.0, "NaN"]]);
    fs::write(&reference, json!({"test1_slack": record}).to_string()).unwrap();

    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args(["compare", reference.to_str().unwrap(), reference.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("DIFFERENCES_FOUND"));

    let mut cmd = Command::cargo_bin("acdc-cli").unwrap();
    cmd.args([
        "compare",
        reference.to_str().unwrap(),
        reference.to_str().unwrap(),
        "--nan-equal",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("All scenarios match the reference"));
}

//! Integration tests for the hwatm CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ADMIN_PASSWORD: &str = "admin-secret";

const FMECA_CSV: &str = "\
ID,Component,Reference Designator,RPN
1,Resistor,R101,80
2,Capacitor,\"C5, C6\",45
3,Diode,D1,20
";

const COVERAGE_CSV: &str = "\
CRD,Result
R101,Pass
C6,Fail
U9,Pass
";

/// Helper to get an hwatm command isolated from the caller's environment
fn hwatm(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hwatm").unwrap();
    cmd.current_dir(dir)
        .env("HWATM_PASSWORD_ITERATIONS", "16")
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("HWATM_TOKEN")
        .env_remove("HWATM_WORKSPACE")
        .env_remove("HWATM_PASSWORD")
        .env_remove("HWATM_DEFAULT_FILTER");
    cmd
}

/// Helper to create a workspace with an admin account
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    hwatm(tmp.path())
        .args(["init", "--admin-password", ADMIN_PASSWORD])
        .assert()
        .success();
    tmp
}

fn login(tmp: &TempDir, username: &str, password: &str) {
    hwatm(tmp.path())
        .args(["login", "--username", username, "--password", password])
        .assert()
        .success();
}

/// Workspace with an admin session, one board and both sheets uploaded
fn setup_board() -> TempDir {
    let tmp = setup_workspace();
    login(&tmp, "admin", ADMIN_PASSWORD);

    hwatm(tmp.path())
        .args(["board", "add", "IMD"])
        .assert()
        .success();

    fs::write(tmp.path().join("fmeca.csv"), FMECA_CSV).unwrap();
    fs::write(tmp.path().join("coverage.csv"), COVERAGE_CSV).unwrap();

    hwatm(tmp.path())
        .args(["upload", "IMD", "--kind", "fmeca", "fmeca.csv"])
        .assert()
        .success();
    hwatm(tmp.path())
        .args(["upload", "IMD", "--kind", "coverage", "coverage.csv"])
        .assert()
        .success();
    tmp
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    hwatm(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("atm-check"))
        .stdout(predicate::str::contains("fmeca"));
}

#[test]
fn test_init_creates_workspace() {
    let tmp = setup_workspace();
    assert!(tmp.path().join(".hwatm").is_dir());

    hwatm(tmp.path())
        .args(["init", "--admin-password", ADMIN_PASSWORD])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_workspace_fail() {
    let tmp = TempDir::new().unwrap();
    hwatm(tmp.path())
        .args(["board", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an hwatm workspace"));
}

// ============================================================================
// Sessions and roles
// ============================================================================

#[test]
fn test_requires_login() {
    let tmp = setup_workspace();
    hwatm(tmp.path())
        .args(["board", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_wrong_password_rejected() {
    let tmp = setup_workspace();
    hwatm(tmp.path())
        .args(["login", "--username", "admin", "--password", "nope-nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Incorrect username or password"));
}

#[test]
fn test_login_whoami_logout() {
    let tmp = setup_workspace();
    login(&tmp, "admin", ADMIN_PASSWORD);

    let me = json_output(hwatm(tmp.path()).args(["whoami", "--format", "json"]));
    assert_eq!(me["username"], "admin");
    assert_eq!(me["role"], "admin");

    hwatm(tmp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    hwatm(tmp.path()).arg("whoami").assert().failure();
}

#[test]
fn test_token_from_environment() {
    let tmp = setup_workspace();
    let output = hwatm(tmp.path())
        .args([
            "login",
            "--username",
            "admin",
            "--password",
            ADMIN_PASSWORD,
            "--print-token",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    assert_eq!(token.len(), 64);

    hwatm(tmp.path())
        .args(["whoami"])
        .env("HWATM_TOKEN", &token)
        .assert()
        .success()
        .stdout(predicate::str::contains("admin"));
}

#[test]
fn test_registered_user_cannot_upload() {
    let tmp = setup_board();

    hwatm(tmp.path())
        .args(["register", "--username", "viewer", "--password", "viewer-pw"])
        .assert()
        .success();
    login(&tmp, "viewer", "viewer-pw");

    hwatm(tmp.path())
        .args(["upload", "IMD", "--kind", "fmeca", "fmeca.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("admin role required"));

    // Reading reports is open to every role
    hwatm(tmp.path())
        .args(["atm-check", "IMD"])
        .assert()
        .success();
}

#[test]
fn test_disabled_user_cannot_login() {
    let tmp = setup_workspace();
    login(&tmp, "admin", ADMIN_PASSWORD);

    hwatm(tmp.path())
        .args(["user", "new", "ops", "--password", "ops-pass"])
        .assert()
        .success();
    hwatm(tmp.path())
        .args(["user", "disable", "ops"])
        .assert()
        .success();

    hwatm(tmp.path())
        .args(["login", "--username", "ops", "--password", "ops-pass"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Inactive user"));
}

#[test]
fn test_user_list_json() {
    let tmp = setup_workspace();
    login(&tmp, "admin", ADMIN_PASSWORD);
    hwatm(tmp.path())
        .args(["user", "new", "tech", "--password", "tech-pass", "--role", "user"])
        .assert()
        .success();

    let users = json_output(hwatm(tmp.path()).args(["user", "list", "--format", "json"]));
    let names: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"admin"));
    assert!(names.contains(&"tech"));
}

// ============================================================================
// Boards and uploads
// ============================================================================

#[test]
fn test_board_status_after_upload() {
    let tmp = setup_board();

    let status = json_output(hwatm(tmp.path()).args([
        "board", "status", "IMD", "--format", "json",
    ]));
    assert_eq!(status["fmeca_in_db"], true);
    assert_eq!(status["coverage_in_db"], true);
    assert_eq!(status["fmeca_info"]["record_count"], 3);
    assert_eq!(status["fmeca_info"]["uploaded_by"], "admin");
}

#[test]
fn test_upload_rejects_other_extensions() {
    let tmp = setup_board();
    fs::write(tmp.path().join("fmeca.xlsx"), "binary").unwrap();

    hwatm(tmp.path())
        .args(["upload", "IMD", "--kind", "fmeca", "fmeca.xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(".csv"));
}

#[test]
fn test_upload_unknown_board() {
    let tmp = setup_board();
    hwatm(tmp.path())
        .args(["upload", "NOPE", "--kind", "fmeca", "fmeca.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Board not found"));
}

#[test]
fn test_data_list_and_delete() {
    let tmp = setup_board();

    let listing = json_output(hwatm(tmp.path()).args([
        "data",
        "list",
        "IMD",
        "--kind",
        "coverage",
        "--include-data",
        "--format",
        "json",
    ]));
    assert_eq!(listing["count"], 1);
    let entry = &listing["data"][0];
    assert_eq!(entry["original_filename"], "coverage.csv");
    assert_eq!(entry["data"][2]["CRD"], "U9");

    let id = entry["id"].as_str().unwrap().to_string();
    hwatm(tmp.path())
        .args(["data", "delete", &id])
        .assert()
        .success();

    let atm = json_output(hwatm(tmp.path()).args(["atm-check", "IMD", "--format", "json"]));
    assert_eq!(atm["message"], "No data found in database");
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn test_fmeca_red_band() {
    let tmp = setup_board();

    let report = json_output(hwatm(tmp.path()).args([
        "fmeca", "IMD", "--filter", "red", "--format", "json",
    ]));
    assert_eq!(report["count"], 1);
    assert_eq!(report["message"], "Found 1 records");
    assert_eq!(report["data"][0]["Reference_Designator"], "R101");
    assert_eq!(report["data"][0]["RPN"], "80");
    assert_eq!(report["data"][0]["ATM_Coverage"], "Pass");
}

#[test]
fn test_fmeca_all_sorted_by_rpn() {
    let tmp = setup_board();

    let report = json_output(hwatm(tmp.path()).args(["fmeca", "IMD", "--format", "json"]));
    let rpns: Vec<&str> = report["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["RPN"].as_str().unwrap())
        .collect();
    assert_eq!(rpns, vec!["80", "45", "20"]);
    assert_eq!(report["data"][1]["ATM_Coverage"], "Fail");
    assert_eq!(report["data"][2]["ATM_Coverage"], "Not Found");
}

#[test]
fn test_fmeca_table_output() {
    let tmp = setup_board();
    hwatm(tmp.path())
        .args(["fmeca", "IMD", "--filter", "green"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Capacitor"))
        .stdout(predicate::str::contains("Diode"))
        .stdout(predicate::str::contains("Found 2 records"));
}

#[test]
fn test_atm_check_lists_missing() {
    let tmp = setup_board();

    let atm = json_output(hwatm(tmp.path()).args(["atm-check", "IMD", "--format", "json"]));
    assert_eq!(
        atm["message"],
        "ATM Check: 1 values found in coverage but missing in FMECA"
    );
    assert_eq!(atm["missing_components"][0]["component"], "U9");
    assert_eq!(atm["missing_components"][0]["atm_coverage"], "Pass");
}

#[test]
fn test_atm_check_all_clear() {
    let tmp = setup_board();
    fs::write(tmp.path().join("coverage2.csv"), "CRD,Result\nR101,Pass\nC5,Pass\n").unwrap();
    hwatm(tmp.path())
        .args(["upload", "IMD", "--kind", "coverage", "coverage2.csv"])
        .assert()
        .success();

    hwatm(tmp.path())
        .args(["atm-check", "IMD"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ATM Check: All coverage values are present in FMECA",
        ));
}

#[test]
fn test_fmeca_without_sheets() {
    let tmp = setup_workspace();
    login(&tmp, "admin", ADMIN_PASSWORD);
    hwatm(tmp.path())
        .args(["board", "add", "SCR"])
        .assert()
        .success();

    let report = json_output(hwatm(tmp.path()).args(["fmeca", "SCR", "--format", "json"]));
    assert_eq!(report["count"], 0);
    assert_eq!(report["message"], "No FMECA data found in database");
}

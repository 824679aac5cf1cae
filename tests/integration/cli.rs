//! Integration tests for the `hse` command line.
//!
//! Each test writes register files into a temp data directory and runs the
//! binary against it with `--data-dir`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const INCIDENTS: &str = r#"[
    {"id": 1704100000000, "srno": "01", "incidentDate": "2024-01-02", "severity": "High",
     "description": "Dropped load near crane", "reportReference": "RPT-17"},
    {"id": 1704200000000, "srno": "02", "incidentDate": "2024-01-10", "severity": "Low",
     "description": "Near miss at loading bay"},
    {"id": 1704300000000, "srno": "03", "incidentDate": "2024-01-20", "type": "Fatality"},
    {"id": 1704400000000, "srno": "04", "incidentDate": "2023-11-01", "severity": "Critical"}
]"#;

const INJURIES: &str = r#"[
    {"id": 1704100000001, "srno": "01", "incidentDate": "2024-01-05", "isLTI": "true",
     "timeOffDays": "5"}
]"#;

const NCRS: &str = r#"[
    {"id": 1, "srno": "01", "issuedDate": "2024-01-03", "status": "Open"},
    {"id": 2, "srno": "02", "issuedDate": "2024-01-04", "status": "Closed"}
]"#;

/// Get a Command instance for the hse binary
#[allow(deprecated)]
fn hse_cmd(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hse").expect("Failed to find hse binary");
    cmd.arg("--data-dir").arg(data_dir).env_remove("HSE_LOG");
    cmd
}

fn seeded_dir() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("incident_report.json"), INCIDENTS).expect("incidents");
    fs::write(temp_dir.path().join("injury_details.json"), INJURIES).expect("injuries");
    fs::write(temp_dir.path().join("ncr_register.json"), NCRS).expect("ncrs");
    temp_dir
}

#[test]
fn test_snapshot_markdown() {
    let temp_dir = seeded_dir();

    hse_cmd(temp_dir.path())
        .args(["snapshot", "--from", "2024-01-01", "--to", "2024-02-01", "--as-of", "2024-02-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## HSE Metrics"))
        .stdout(predicate::str::contains("**Incidents**: 3 (1 reported, 2 critical)"))
        .stdout(predicate::str::contains("**LTIFR**: 1.00"))
        .stdout(predicate::str::contains("**LTISR**: 5.00"))
        .stdout(predicate::str::contains("**Open NCRs**: 1"));
}

#[test]
fn test_snapshot_json() {
    let temp_dir = seeded_dir();

    let output = hse_cmd(temp_dir.path())
        .args([
            "snapshot",
            "--from",
            "2024-01-01",
            "--to",
            "2024-02-01",
            "--as-of",
            "2024-02-01",
            "--json",
        ])
        .output()
        .expect("run hse");
    assert!(output.status.success());

    let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(snapshot["status"], "ready");
    assert_eq!(snapshot["kpis"]["leading_indicators"], 1);
    assert_eq!(snapshot["kpis"]["days_without_lti"], 27);
    assert_eq!(snapshot["kpis"]["lti_count"], 1);
    assert_eq!(snapshot["window"]["end"], "2024-02-01");
}

#[test]
fn test_snapshot_of_empty_store() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    hse_cmd(temp_dir.path())
        .args(["snapshot", "--from", "2024-01-01", "--to", "2024-01-31", "--as-of", "2024-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**Days Without LTI**: 30"))
        .stdout(predicate::str::contains("★☆☆☆☆"));
}

#[test]
fn test_snapshot_measures_lti_free_days_to_window_end() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    hse_cmd(temp_dir.path())
        .args(["snapshot", "--from", "2024-01-01", "--to", "2024-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**Days Without LTI**: 30"));
}

#[test]
fn test_oversized_default_window_is_an_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    hse_cmd(temp_dir.path())
        .env("HSE_DEFAULT_WINDOW_DAYS", "4000000000")
        .arg("snapshot")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid reporting window"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_corrupt_register_reads_as_empty() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("incident_report.json"), "{not json").expect("write");

    hse_cmd(temp_dir.path())
        .args(["snapshot", "--from", "2024-01-01", "--to", "2024-02-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**Incidents**: 0"));
}

#[test]
fn test_inverted_window_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    hse_cmd(temp_dir.path())
        .args(["snapshot", "--from", "2024-02-01", "--to", "2024-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid reporting window"));
}

#[test]
fn test_critical_lists_newest_first() {
    let temp_dir = seeded_dir();

    let output = hse_cmd(temp_dir.path())
        .args(["critical", "--json"])
        .output()
        .expect("run hse");
    assert!(output.status.success());

    let incidents: Vec<serde_json::Value> =
        serde_json::from_slice(&output.stdout).expect("json output");
    let ids: Vec<u64> = incidents
        .iter()
        .map(|incident| incident["id"].as_u64().expect("numeric id"))
        .collect();
    assert_eq!(ids, vec![1704300000000, 1704100000000, 1704400000000]);
}

#[test]
fn test_critical_limit() {
    let temp_dir = seeded_dir();

    hse_cmd(temp_dir.path())
        .args(["critical", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-20"))
        .stdout(predicate::str::contains("Dropped load").not());
}

#[test]
fn test_next_serial() {
    let temp_dir = seeded_dir();

    hse_cmd(temp_dir.path())
        .args(["next-serial", "incident_report"])
        .assert()
        .success()
        .stdout("05\n");

    hse_cmd(temp_dir.path())
        .args(["next-serial", "induction_records"])
        .assert()
        .success()
        .stdout("01\n");
}

#[test]
fn test_next_serial_rejects_unknown_domain() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    hse_cmd(temp_dir.path())
        .args(["next-serial", "payroll"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown domain key"));
}

#[test]
fn test_add_assigns_id_and_serial() {
    let temp_dir = seeded_dir();

    hse_cmd(temp_dir.path())
        .args(["add", "ncr_register", r#"{"issuedDate": "2024-01-09", "status": "Open"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("srno=\"03\""));

    let stored = fs::read_to_string(temp_dir.path().join("ncr_register.json")).expect("read");
    let records: Vec<serde_json::Value> = serde_json::from_str(&stored).expect("json array");
    assert_eq!(records.len(), 3);
    let added = &records[2];
    assert!(added["id"].is_number());
    assert!(added["createdAt"].is_string());
    assert_eq!(added["status"], "Open");
}

#[test]
fn test_add_rejects_non_object() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    hse_cmd(temp_dir.path())
        .args(["add", "ncr_register", "[1, 2]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a JSON object"));
}

#[test]
fn test_add_rejects_record_of_wrong_shape() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    hse_cmd(temp_dir.path())
        .args(["add", "induction_records", r#"{"sno": [1, 2], "date": "2024-03-01"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid induction_records record"));
    assert!(!temp_dir.path().join("induction_records.json").exists());
}

#[test]
fn test_add_accepts_alternate_field_spellings() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    hse_cmd(temp_dir.path())
        .args([
            "add",
            "incident_report",
            r#"{"incidentDate": "2024-01-05", "date": "2024-01-05", "severity": "High"}"#,
        ])
        .assert()
        .success();

    hse_cmd(temp_dir.path())
        .args(["snapshot", "--from", "2024-01-01", "--to", "2024-02-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**Incidents**: 1"));
}

#[test]
fn test_non_utf8_register_reads_as_empty() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("incident_report.json"), [0xff, 0xfe, b'[', b']'])
        .expect("write");

    hse_cmd(temp_dir.path())
        .args(["snapshot", "--from", "2024-01-01", "--to", "2024-02-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**Incidents**: 0"));
}

#[test]
fn test_settings_file_is_applied() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let settings_path = temp_dir.path().join("hse.toml");
    fs::write(&settings_path, "hours_worked = 50000.0\ndefault_window_days = 7\n").expect("write");

    hse_cmd(temp_dir.path())
        .arg("--config")
        .arg(&settings_path)
        .arg("settings")
        .assert()
        .success()
        .stdout(predicate::str::contains("hours_worked = 50000.0"))
        .stdout(predicate::str::contains("default_window_days = 7"));
}

#[test]
fn test_help_lists_commands() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    hse_cmd(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("snapshot"))
        .stdout(predicate::str::contains("next-serial"))
        .stdout(predicate::str::contains("watch"));
}

//! End-to-end tests of the `censo` binary
//!
//! These run the built binary against the fixtures and inspect its output and the
//! files it writes.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn censo_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("target/debug/censo")
}

fn censo(args: &[&str]) -> Output {
    Command::new(censo_binary())
        .args(args)
        .output()
        .expect("failed to execute censo")
}

fn fixture(name: &str) -> String {
    fixtures_dir().join(name).display().to_string()
}

fn report(records: &str, out: &Path, extra: &[&str]) -> Output {
    let topology = fixture("units.json");
    let records = fixture(records);
    let out = out.display().to_string();
    let mut args = vec![
        "report",
        "--topology",
        topology.as_str(),
        "--records",
        records.as_str(),
        "--date",
        "2024-01-03",
        "-o",
        out.as_str(),
    ];
    args.extend_from_slice(extra);
    censo(&args)
}

// =============================================================================
// report
// =============================================================================

#[test]
fn report_writes_workbook_under_default_name() {
    let out = tempfile::tempdir().unwrap();
    let output = report("records.json", out.path(), &[]);
    assert!(output.status.success());

    let path = out.path().join("Contagem-ALFA-03-01-2024.xlsx");
    assert!(path.exists(), "workbook not written");
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], b"PK");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Contagem-ALFA-03-01-2024.xlsx"));
    assert!(stdout.contains("PAMC: 7 record(s), 7 counted, 0 dropped"));
}

#[test]
fn report_writes_explicit_file() {
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("censo.xlsx");
    let target_arg = target.display().to_string();

    let topology = fixture("units.json");
    let records = fixture("records.json");
    let output = censo(&[
        "report",
        "--topology",
        &topology,
        "--records",
        &records,
        "--file",
        &target_arg,
    ]);

    assert!(output.status.success());
    assert!(target.exists());
}

#[test]
fn report_warns_about_dropped_records() {
    let out = tempfile::tempdir().unwrap();
    let output = report("records_unresolved.json", out.path(), &[]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning[W001]"), "stderr: {stderr}");
    assert!(stderr.contains("--> unit PAMC"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("PAMC: 2 record(s), 1 counted, 1 dropped"));
}

#[test]
fn report_quiet_hides_warnings() {
    let out = tempfile::tempdir().unwrap();
    let output = report("records_unresolved.json", out.path(), &["--quiet"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("W001"), "stderr: {stderr}");
}

#[test]
fn report_without_data_writes_nothing() {
    let out = tempfile::tempdir().unwrap();
    let output = report("records_unknown_unit.json", out.path(), &[]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error[E001]"));
    assert!(stderr.contains("error[E003]"));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn report_json_summary() {
    let out = tempfile::tempdir().unwrap();
    let output = report("records_unresolved.json", out.path(), &["--format", "json"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["date"], "2024-01-03");
    assert_eq!(value["shift"], "ALFA");
    assert!(value["workbook"]
        .as_str()
        .unwrap()
        .ends_with("Contagem-ALFA-03-01-2024.xlsx"));
    assert_eq!(value["units"][0]["unit"], "PAMC");
    assert_eq!(value["units"][0]["counted"], 1);
    assert_eq!(value["units"][0]["dropped"], 1);

    let codes: Vec<&str> = value["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["code"].as_str())
        .collect();
    assert!(codes.contains(&"W001"));
    assert!(codes.contains(&"I001"));
}

#[test]
fn report_unit_filter_selects_units() {
    let out = tempfile::tempdir().unwrap();
    let output = report("records.json", out.path(), &["--unit", "CPBV", "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(value["workbook"].is_null());
    assert_eq!(value["units"].as_array().unwrap().len(), 0);
}

#[test]
fn report_invalid_topology_is_e002() {
    let out = tempfile::tempdir().unwrap();
    let topology = fixture("invalid_topology.json");
    let records = fixture("records.json");
    let out_arg = out.path().display().to_string();
    let output = censo(&[
        "report",
        "--topology",
        &topology,
        "--records",
        &records,
        "-o",
        &out_arg,
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error[E002]"), "stderr: {stderr}");
}

#[test]
fn report_missing_records_file_fails() {
    let out = tempfile::tempdir().unwrap();
    let output = report("does_not_exist.json", out.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load records"));
}

#[test]
fn report_unwritable_directory_fails() {
    let out = tempfile::tempdir().unwrap();
    let missing = out.path().join("missing");
    let output = report("records.json", &missing, &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to write"));
}

// =============================================================================
// check / shift
// =============================================================================

#[test]
fn check_lists_units_and_blocks() {
    let topology = fixture("units.json");
    let output = censo(&["check", "--topology", &topology]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("PAMC: 4 block(s), 2 housing"), "stdout: {stdout}");
    assert!(stdout.contains("Bloco A"));
    assert!(stdout.contains("OK"));
}

#[test]
fn check_rejects_invalid_topology() {
    let topology = fixture("invalid_topology.json");
    let output = censo(&["check", "--topology", &topology]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error[E002]"));
}

#[test]
fn shift_prints_label_and_file_name() {
    let output = censo(&["shift", "--date", "2024-01-01"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CHARLIE 01/01/2024"));
    assert!(stdout.contains("Contagem-CHARLIE-01-01-2024.xlsx"));
}

#[test]
fn invalid_date_is_rejected() {
    let output = censo(&["shift", "--date", "03/01/2024"]);
    assert_eq!(output.status.code(), Some(2));
}

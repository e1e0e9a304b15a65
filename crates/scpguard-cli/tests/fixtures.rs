//! End-to-end CLI tests against the organization export in `tests/fixtures/deny_region`.
//!
//! Every command runs from a temp directory so a stray `scpguard.toml` in the working tree is
//! never picked up.

use assert_cmd::Command;
use predicates::prelude::*;
use scpguard_test_util::{LOG_ARCHIVE, SECURITY_OU, normalize_nondeterministic};
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn scpguard_cmd() -> Command {
    Command::cargo_bin("scpguard").expect("scpguard binary not found - run `cargo build` first")
}

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("scpguard-cli crate should have a parent directory")
        .parent()
        .expect("crates directory should have a parent (repo root)")
        .join("tests")
        .join("fixtures")
        .join("deny_region")
}

/// Command rooted in `work` that reads the fixture org export and config.
fn fixture_cmd(work: &TempDir) -> Command {
    let mut cmd = scpguard_cmd();
    cmd.current_dir(work.path())
        .arg("--org-snapshot")
        .arg(fixture_dir().join("org.json"))
        .arg("--config")
        .arg(fixture_dir().join("scpguard.toml"));
    cmd
}

fn find_blocking(work: &TempDir, region: &str, format: &str) -> Command {
    let mut cmd = fixture_cmd(work);
    cmd.args([
        "find-blocking",
        "--target",
        LOG_ARCHIVE,
        "--action",
        "s3:GetObject",
        "--resource",
        "arn:aws:s3:::logs/*",
        "--region",
        region,
        "--format",
        format,
    ]);
    cmd
}

#[test]
fn find_blocking_json_reports_deny_region() {
    let work = TempDir::new().expect("temp dir");
    let output = find_blocking(&work, "us-west-2", "json")
        .output()
        .expect("run");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).expect("report json");
    let report = normalize_nondeterministic(report);
    assert_eq!(report["schema"], "scpguard.blocking.v1");
    assert_eq!(report["tool"]["version"], "__VERSION__");
    assert_eq!(report["started_at"], "__TIMESTAMP__");

    let candidates = report["candidates"].as_array().expect("candidates");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0]["policy_name"], "DenyRegion");
    assert_eq!(candidates[0]["attached_to"], SECURITY_OU);
    assert_eq!(candidates[0]["depth"], 1);
}

#[test]
fn find_blocking_text_in_approved_region_finds_nothing() {
    let work = TempDir::new().expect("temp dir");
    find_blocking(&work, "us-east-1", "text")
        .assert()
        .success()
        .stdout(predicate::str::contains("No possibly-blocking statements"));
}

#[test]
fn find_blocking_markdown_names_policy() {
    let work = TempDir::new().expect("temp dir");
    find_blocking(&work, "us-west-2", "markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("DenyRegion"));
}

#[test]
fn find_blocking_writes_report_out() {
    let work = TempDir::new().expect("temp dir");
    let report_path = work.path().join("out").join("report.json");

    fixture_cmd(&work)
        .args([
            "find-blocking",
            "--target",
            LOG_ARCHIVE,
            "--action",
            "s3:GetObject",
            "--resource",
            "*",
            "--region",
            "eu-west-1",
        ])
        .arg("--report-out")
        .arg(&report_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 possibly-blocking statement(s)"));

    let text = std::fs::read_to_string(&report_path).expect("report written");
    let report: Value = serde_json::from_str(&text).expect("report json");
    assert_eq!(report["query"]["region"], "eu-west-1");
}

#[test]
fn unknown_format_is_an_error() {
    let work = TempDir::new().expect("temp dir");
    find_blocking(&work, "us-west-2", "yaml")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown format: yaml"));
}

#[test]
fn sync_then_resolve_in_temp_root() {
    let work = TempDir::new().expect("temp dir");

    fixture_cmd(&work)
        .args(["sync", "--mirror-root", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("DenyLeaveOrg (shared)"));

    let mirror = work.path().join("service_control_policies");
    assert!(mirror.join(".scpguard-mirror.json").is_file());
    assert!(mirror.join("SHARED").join("DenyLeaveOrg.json").is_file());
    assert!(work.path().join("import_policy_attachments.tf").is_file());
    assert!(work.path().join("import_policies.tf").is_file());

    fixture_cmd(&work)
        .args(["resolve", "--mirror-root", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("(4 module(s))"));

    let manifest = std::fs::read_to_string(work.path().join("scp_define_attach_auto.tf"))
        .expect("manifest written");
    assert!(manifest.contains("module \"DenyRegion\""));
}

#[test]
fn sync_skip_imports_writes_no_import_files() {
    let work = TempDir::new().expect("temp dir");

    fixture_cmd(&work)
        .args(["sync", "--mirror-root", ".", "--skip-imports"])
        .assert()
        .success();

    assert!(!work.path().join("import_policy_attachments.tf").exists());
    assert!(!work.path().join("import_policies.tf").exists());
}

#[test]
fn resolve_without_mirror_fails() {
    let work = TempDir::new().expect("temp dir");
    fixture_cmd(&work)
        .args(["resolve", "--mirror-root", "."])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("scpguard error:"));
    assert!(!work.path().join("scp_define_attach_auto.tf").exists());
}

#[test]
fn unknown_root_target_exits_one() {
    let work = TempDir::new().expect("temp dir");
    fixture_cmd(&work)
        .args(["find-blocking", "--target", "r-typo"])
        .args(["--action", "s3:GetObject", "--resource", "*"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("r-typo is not the organization root"));
}

#[test]
fn missing_snapshot_exits_one() {
    let work = TempDir::new().expect("temp dir");
    scpguard_cmd()
        .current_dir(work.path())
        .args(["--org-snapshot", "does-not-exist.json"])
        .args(["find-blocking", "--target", LOG_ARCHIVE])
        .args(["--action", "s3:GetObject", "--resource", "*"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("scpguard error: load organization snapshot"));
}

#[test]
fn invalid_config_exits_one() {
    let work = TempDir::new().expect("temp dir");
    std::fs::write(work.path().join("scpguard.toml"), "page_size = 0\n").expect("write config");
    scpguard_cmd()
        .current_dir(work.path())
        .arg("--org-snapshot")
        .arg(fixture_dir().join("org.json"))
        .args(["find-blocking", "--target", LOG_ARCHIVE])
        .args(["--action", "s3:GetObject", "--resource", "*"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("resolve config"));
}

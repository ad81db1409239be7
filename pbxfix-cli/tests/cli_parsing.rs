//! CLI behaviour against a copy of the fixture export.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../tests/fixtures/unity_export/repo");
const ASSETS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../assets/ios");
const PROJECT: &str = "Unity-iPhone.xcodeproj/project.pbxproj";

fn pbxfix() -> Command {
    Command::cargo_bin("pbxfix").expect("pbxfix binary")
}

fn create_temp_export() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    let root = td.path();
    fs::create_dir_all(root.join("Unity-iPhone.xcodeproj")).unwrap();
    fs::copy(Path::new(FIXTURE).join(PROJECT), root.join(PROJECT)).unwrap();
    fs::copy(Path::new(FIXTURE).join("Info.plist"), root.join("Info.plist")).unwrap();
    td
}

fn project_file(td: &TempDir) -> PathBuf {
    td.path().join(PROJECT)
}

#[test]
fn test_help_lists_subcommands() {
    pbxfix()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("postprocess"))
        .stdout(predicate::str::contains("link-static"))
        .stdout(predicate::str::contains("show-targets"));
}

#[test]
fn test_unknown_subcommand_fails() {
    pbxfix().arg("frobnicate").assert().failure();
}

#[test]
fn test_postprocess_requires_project_dir() {
    pbxfix().arg("postprocess").assert().failure();
}

#[test]
fn test_link_static_requires_target() {
    let temp = create_temp_export();
    pbxfix()
        .arg("link-static")
        .arg(project_file(&temp))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--target"));
}

#[test]
fn test_show_targets_text() {
    let temp = create_temp_export();
    pbxfix()
        .arg("show-targets")
        .arg(project_file(&temp))
        .assert()
        .success()
        .stdout(predicate::str::contains("Unity-iPhone"))
        .stdout(predicate::str::contains("com.apple.product-type.application"));
}

#[test]
fn test_show_targets_json() {
    let temp = create_temp_export();
    let output = pbxfix()
        .arg("show-targets")
        .arg(project_file(&temp))
        .arg("--format")
        .arg("json")
        .output()
        .expect("run");
    assert!(output.status.success());

    let targets: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let names: Vec<&str> = targets
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Unity-iPhone", "Unity-iPhone Tests"]);
}

#[test]
fn test_show_targets_invalid_format() {
    let temp = create_temp_export();
    pbxfix()
        .arg("show-targets")
        .arg(project_file(&temp))
        .arg("--format")
        .arg("yaml")
        .assert()
        .failure();
}

#[test]
fn test_link_static_dry_run_prints_diff() {
    let temp = create_temp_export();
    let before = fs::read_to_string(project_file(&temp)).unwrap();

    pbxfix()
        .arg("link-static")
        .arg(project_file(&temp))
        .arg("--target")
        .arg("Unity-iPhone Tests")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("diff --git"))
        .stdout(predicate::str::contains(
            "CD84C25F20742FAB0035D524 /* libOneSignal.a in Frameworks */",
        ));

    assert_eq!(fs::read_to_string(project_file(&temp)).unwrap(), before);
}

#[test]
fn test_link_static_writes_project() {
    let temp = create_temp_export();
    pbxfix()
        .arg("link-static")
        .arg(project_file(&temp))
        .arg("--target")
        .arg("Unity-iPhone Tests")
        .arg("--build-file-id")
        .arg("0123456789ABCDEF01234567")
        .assert()
        .success();

    let after = fs::read_to_string(project_file(&temp)).unwrap();
    assert!(after.contains("0123456789ABCDEF01234567 /* libOneSignal.a in Frameworks */ = {isa = PBXBuildFile;"));
}

#[test]
fn test_link_static_missing_library_fails_untouched() {
    let temp = create_temp_export();
    let before = fs::read_to_string(project_file(&temp)).unwrap();

    pbxfix()
        .arg("link-static")
        .arg(project_file(&temp))
        .arg("--target")
        .arg("Unity-iPhone Tests")
        .arg("--library")
        .arg("libMissing")
        .env("RUST_LOG", "error")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error 1"));

    assert_eq!(fs::read_to_string(project_file(&temp)).unwrap(), before);
}

#[test]
fn test_link_static_invalid_build_file_id() {
    let temp = create_temp_export();
    pbxfix()
        .arg("link-static")
        .arg(project_file(&temp))
        .arg("--target")
        .arg("Unity-iPhone Tests")
        .arg("--build-file-id")
        .arg("not-hex")
        .assert()
        .failure();
}

#[test]
fn test_postprocess_writes_project_and_report() {
    let temp = create_temp_export();
    let out = temp.path().join("artifacts");

    pbxfix()
        .current_dir(temp.path())
        .arg("postprocess")
        .arg(temp.path())
        .arg("--assets-dir")
        .arg(ASSETS)
        .arg("--team")
        .arg("ABCDE12345")
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success();

    let project = fs::read_to_string(project_file(&temp)).unwrap();
    assert!(project.contains("OneSignalNotificationExtensionService"));
    assert!(project.contains("DEVELOPMENT_TEAM = ABCDE12345;"));
    assert!(temp
        .path()
        .join("OneSignalNotificationExtensionService/NotificationService.m")
        .exists());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("report.json")).unwrap()).unwrap();
    assert_eq!(report["schema"], "pbxfix.report.v1");
    assert!(out.join("report.md").exists());
    assert!(out.join("patch.diff").exists());
}

#[test]
fn test_postprocess_reads_config_file() {
    let temp = create_temp_export();
    fs::write(
        temp.path().join("pbxfix.toml"),
        format!(
            "[project]\nassets_dir = \"{ASSETS}\"\n\n[app]\nbundle_id = \"com.example.fromconfig\"\ndevelopment_team = \"CONFIGTEAM\"\n"
        ),
    )
    .unwrap();

    pbxfix()
        .current_dir(temp.path())
        .arg("postprocess")
        .arg(".")
        .assert()
        .success();

    let project = fs::read_to_string(project_file(&temp)).unwrap();
    assert!(project.contains("com.example.fromconfig.OneSignalNotificationExtensionService"));
    assert!(project.contains("DEVELOPMENT_TEAM = CONFIGTEAM;"));
}

#[test]
fn test_postprocess_dry_run_prints_diff() {
    let temp = create_temp_export();
    let before = fs::read_to_string(project_file(&temp)).unwrap();

    pbxfix()
        .arg("postprocess")
        .arg(temp.path())
        .arg("--assets-dir")
        .arg(ASSETS)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("OneSignalNotificationExtensionService.appex"));

    assert_eq!(fs::read_to_string(project_file(&temp)).unwrap(), before);
    assert!(!temp.path().join("OneSignalNotificationExtensionService").exists());
}

#[test]
fn test_postprocess_missing_linkage_still_succeeds() {
    let temp = create_temp_export();
    let project = fs::read_to_string(project_file(&temp)).unwrap();
    fs::write(
        project_file(&temp),
        project.replace("libOneSignal.a in Frameworks", "libOther.a in Frameworks"),
    )
    .unwrap();

    pbxfix()
        .arg("postprocess")
        .arg(temp.path())
        .arg("--assets-dir")
        .arg(ASSETS)
        .env("RUST_LOG", "error")
        .assert()
        .success()
        .stderr(predicate::str::contains("(error 1)"));
}

#[test]
fn test_postprocess_unknown_target_fails() {
    let temp = create_temp_export();
    pbxfix()
        .arg("postprocess")
        .arg(temp.path())
        .arg("--assets-dir")
        .arg(ASSETS)
        .arg("--target-name")
        .arg("Missing")
        .assert()
        .failure();
}

//! CLI integration tests for magisk-build.
//!
//! Each test lays out a throwaway checkout plus a fake SDK whose `ndk-build`
//! and `cargo` are shell scripts. The scripts append their command line to a
//! log and create the files the real tools would.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const FAKE_NDK_BUILD: &str = r#"#!/bin/sh
echo "ndk-build $*" >> "$FAKE_LOG"
[ -n "$FAKE_NDK_FAIL" ] && exit 2
abis=""
outs=""
for a in "$@"; do
  case "$a" in
    APP_ABI=*) abis="${a#APP_ABI=}" ;;
    B_MAGISK=1) outs="$outs magisk" ;;
    B_PRELOAD=1) outs="$outs libinit-ld.so" ;;
    B_INIT=1) outs="$outs magiskinit" ;;
    B_BOOT=1) outs="$outs magiskboot" ;;
    B_POLICY=1) outs="$outs magiskpolicy" ;;
    B_PROP=1) outs="$outs resetprop" ;;
  esac
done
for abi in $abis; do
  mkdir -p "libs/$abi"
  for o in $outs; do echo built > "libs/$abi/$o"; done
done
"#;

const FAKE_CARGO: &str = r#"#!/bin/sh
echo "cargo $*" >> "$FAKE_LOG"
[ "$1" = build ] || exit 0
pkg=""
profile=debug
triples=""
while [ $# -gt 0 ]; do
  case "$1" in
    -p) shift; pkg="$1" ;;
    -r) profile=release ;;
    --target) shift; triples="$triples $1" ;;
  esac
  shift
done
for t in $triples; do
  mkdir -p "$CARGO_TARGET_DIR/$t/$profile"
  echo lib > "$CARGO_TARGET_DIR/$t/$profile/lib$pkg.a"
done
"#;

/// A checkout with a fake SDK next to it.
struct Project {
    tmp: TempDir,
}

impl Project {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        fs::create_dir_all(root.join("magisk/native/src")).unwrap();
        fs::create_dir_all(root.join("magisk/tools/elf-cleaner")).unwrap();
        fs::write(root.join("magisk/tools/elf-cleaner/Cargo.toml"), "[package]\n").unwrap();
        fs::create_dir_all(root.join("home")).unwrap();

        let ndk = root.join("sdk/ndk/magisk");
        fs::create_dir_all(ndk.join("toolchains/rust/bin")).unwrap();
        fs::write(ndk.join("ONDK_VERSION"), "r29.5\n").unwrap();
        script(&ndk.join("ndk-build"), FAKE_NDK_BUILD);
        script(&ndk.join("toolchains/rust/bin/cargo"), FAKE_CARGO);

        Project { tmp }
    }

    fn root(&self) -> PathBuf {
        self.tmp.path().join("magisk")
    }

    fn ndk(&self) -> PathBuf {
        self.tmp.path().join("sdk/ndk/magisk")
    }

    fn out(&self, rel: &str) -> PathBuf {
        self.root().join("native/out").join(rel)
    }

    fn log(&self) -> Vec<String> {
        fs::read_to_string(self.tmp.path().join("calls.log"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// `magisk-build` run from the checkout with a hermetic environment.
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("magisk-build").unwrap();
        cmd.current_dir(self.root())
            .env_remove("ANDROID_SDK_ROOT")
            .env("ANDROID_HOME", self.tmp.path().join("sdk"))
            .env("HOME", self.tmp.path().join("home"))
            .env("FAKE_LOG", self.tmp.path().join("calls.log"))
            .env("MAGISK_BUILD_NO_SCCACHE", "1")
            .env("MAGISK_BUILD_NO_CCACHE", "1")
            .env_remove("FAKE_NDK_FAIL");
        cmd
    }
}

fn script(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

// ============================================================================
// magisk-build native
// ============================================================================

#[test]
fn test_native_magiskboot_arm64() {
    let project = Project::new();

    project
        .cmd()
        .args(["native", "--targets", "magiskboot", "--abis", "arm64"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Finished"));

    assert!(project.out("arm64-v8a/magiskboot").is_file());
    assert!(project.out("arm64-v8a/libmagiskboot-rs.a").is_file());
    assert!(project.out("generated/flags.h").is_file());
    assert!(!project.out("x86").exists());

    let log = project.log();
    assert_eq!(log.len(), 2);
    assert!(log[0].starts_with("cargo build -p magiskboot -q --target aarch64-linux-android"));
    assert!(log[1].starts_with("ndk-build B_BOOT=1 B_CRT0=1"));
    // Post-processor not requested for magiskboot
    assert!(!log.iter().any(|l| l.starts_with("cargo run")));
}

#[test]
fn test_native_resetprop_pulls_in_magisk_rust() {
    let project = Project::new();

    project
        .cmd()
        .args(["native", "--targets", "resetprop", "--abis", "arm", "x64"])
        .assert()
        .success();

    for abi in ["armeabi-v7a", "x86_64"] {
        assert!(project.out(&format!("{}/libmagisk-rs.a", abi)).is_file());
        assert!(project.out(&format!("{}/resetprop", abi)).is_file());
    }

    let log = project.log();
    assert!(log[0].contains("-p magisk"));
    assert!(log[1].contains("B_PROP=1"));
    assert!(log[1].contains("APP_ABI=armeabi-v7a x86_64"));
    assert!(!log[1].contains("B_MAGISK"));
}

#[test]
fn test_native_runs_elf_cleaner() {
    let project = Project::new();

    project
        .cmd()
        .args(["-r", "native", "--targets", "magisk", "--abis", "x86"])
        .assert()
        .success();

    let log = project.log();
    let cleaner = log.last().unwrap();
    assert!(cleaner.starts_with("cargo run --release --manifest-path"));
    assert!(cleaner.ends_with(&format!(
        "-- {}",
        project.out("x86/magisk").display()
    )));
    assert!(fs::read_to_string(project.out("generated/flags.h"))
        .unwrap()
        .contains("#define MAGISK_DEBUG 0"));
}

#[test]
fn test_native_unknown_abi_runs_nothing() {
    let project = Project::new();

    project
        .cmd()
        .args(["native", "--abis", "mips"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error: Unknown ABI: mips"));

    assert!(project.log().is_empty());
    assert!(!project.out("generated").exists());
}

#[test]
fn test_native_unknown_target() {
    let project = Project::new();

    project
        .cmd()
        .args(["native", "--targets", "busybox"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown target: busybox"));
}

#[test]
fn test_native_missing_sdk() {
    let project = Project::new();

    project
        .cmd()
        .env_remove("ANDROID_HOME")
        .args(["native"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ANDROID_HOME"));
}

#[test]
fn test_native_ndk_version_mismatch() {
    let project = Project::new();
    fs::write(project.ndk().join("ONDK_VERSION"), "r28\n").unwrap();

    project
        .cmd()
        .args(["native"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("r29.5"));

    assert!(project.log().is_empty());
}

#[test]
fn test_native_ndk_failure_is_fatal() {
    let project = Project::new();

    project
        .cmd()
        .env("FAKE_NDK_FAIL", "1")
        .args(["native", "--targets", "magiskpolicy", "--abis", "arm64"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Build binary failed!"));

    // Rust output was already staged; nothing after ndk-build ran
    assert!(project.out("arm64-v8a/libmagiskpolicy-rs.a").is_file());
    assert_eq!(project.log().len(), 2);
}

#[test]
fn test_native_plan_prints_json() {
    let project = Project::new();

    let output = project
        .cmd()
        .args(["native", "--targets", "magiskinit", "--abis", "arm64", "--jobs", "4", "--plan"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["jobs"], 4);
    let steps: Vec<&str> = plan["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["step"].as_str().unwrap())
        .collect();
    assert_eq!(
        steps,
        [
            "write_flags",
            "cargo",
            "stage_rust",
            "ndk_build",
            "stage_ndk",
            "ndk_build",
            "stage_ndk"
        ]
    );

    // Nothing runs in plan mode
    assert!(project.log().is_empty());
    assert!(!project.out("generated").exists());
}

#[test]
fn test_config_prop_abi_list() {
    let project = Project::new();
    fs::write(
        project.root().join("config.prop"),
        "# release settings\nversion=27.0\nversionCode=27000\nabiList=arm64,x86\n",
    )
    .unwrap();

    project
        .cmd()
        .args(["native", "--targets", "magiskboot"])
        .assert()
        .success();

    assert!(project.out("arm64-v8a/magiskboot").is_file());
    assert!(project.out("x86/magiskboot").is_file());
    assert!(!project.out("armeabi-v7a").exists());
    assert!(fs::read_to_string(project.out("generated/flags.rs"))
        .unwrap()
        .contains("MAGISK_VER_CODE: i32 = 27000"));
}

#[test]
fn test_invalid_version_code() {
    let project = Project::new();
    fs::write(project.root().join("config.prop"), "versionCode=abc\n").unwrap();

    project
        .cmd()
        .args(["native"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("versionCode"));
}

// ============================================================================
// magisk-build clean
// ============================================================================

#[test]
fn test_clean_rust_keeps_staged_outputs() {
    let project = Project::new();
    project
        .cmd()
        .args(["native", "--targets", "magiskboot", "--abis", "arm64"])
        .assert()
        .success();
    assert!(project.out("rust").is_dir());

    project.cmd().args(["clean", "rust"]).assert().success();

    assert!(!project.out("rust").exists());
    assert!(project.out("arm64-v8a/magiskboot").is_file());
}

#[test]
fn test_clean_everything() {
    let project = Project::new();
    fs::create_dir_all(project.root().join("native/obj/local")).unwrap();
    fs::create_dir_all(project.out("x86")).unwrap();

    project.cmd().arg("clean").assert().success();

    assert!(!project.root().join("native/out").exists());
    assert!(!project.root().join("native/obj").exists());
}

#[test]
fn test_clean_rejects_unknown_kind() {
    let project = Project::new();

    project
        .cmd()
        .args(["clean", "java"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid clean target"));
}

// ============================================================================
// magisk-build toolchain
// ============================================================================

#[test]
fn test_toolchain_shows_detected_tools() {
    let project = Project::new();

    project
        .cmd()
        .arg("toolchain")
        .assert()
        .success()
        .stdout(predicate::str::contains("r29.5"))
        .stdout(predicate::str::contains(
            project.ndk().join("ndk-build").display().to_string(),
        ))
        .stdout(predicate::str::contains("elf-cleaner"));
}

//! Test utilities for magisk-build unit tests.
//!
//! [`RecordingRunner`] stands in for [`SystemRunner`](crate::util::SystemRunner):
//! it records every command, can fail on a matching one, and can create the
//! files a real toolchain would have produced.
//!
//! # Example
//!
//! ```rust,ignore
//! let tmp = TempDir::new().unwrap();
//! let ctx = fixture_context(tmp.path(), &["magiskboot"], &["arm64"], Profile::Debug, 0);
//! let runner = RecordingRunner::simulating();
//! build_native(&ctx, &runner, &Shell::quiet())?;
//! assert_eq!(runner.calls().len(), 2);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::context::BuildContext;
use crate::builder::toolchain::{ElfCleaner, Toolchains};
use crate::core::request::{BuildRequest, Profile};
use crate::util::config::BuildConfig;
use crate::util::context::GlobalContext;
use crate::util::process::{CommandRunner, ProcessBuilder, RunStatus};

type Effect = Box<dyn Fn(&ProcessBuilder)>;

/// Command runner that never spawns anything.
#[derive(Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<ProcessBuilder>>,
    fail_on: Option<(String, i32)>,
    effect: Option<Effect>,
}

impl RecordingRunner {
    /// Every command succeeds and produces nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands whose display line contains `pattern` exit with `code`.
    pub fn failing_on(pattern: &str, code: i32) -> Self {
        RecordingRunner {
            fail_on: Some((pattern.to_string(), code)),
            ..Self::default()
        }
    }

    /// Every command succeeds after running `effect`.
    pub fn with_effect(effect: impl Fn(&ProcessBuilder) + 'static) -> Self {
        RecordingRunner {
            effect: Some(Box::new(effect)),
            ..Self::default()
        }
    }

    /// Every command succeeds and leaves the outputs the real tool would.
    pub fn simulating() -> Self {
        Self::with_effect(simulate_toolchain)
    }

    /// Add a failure to a runner built with an effect.
    pub fn and_fail_on(mut self, pattern: &str, code: i32) -> Self {
        self.fail_on = Some((pattern.to_string(), code));
        self
    }

    pub fn calls(&self) -> Vec<ProcessBuilder> {
        self.calls.borrow().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(ProcessBuilder::display_command)
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<RunStatus> {
        self.calls.borrow_mut().push(cmd.clone());

        if let Some((pattern, code)) = &self.fail_on {
            if cmd.display_command().contains(pattern.as_str()) {
                return Ok(RunStatus { code: Some(*code) });
            }
        }

        if let Some(effect) = &self.effect {
            effect(cmd);
        }
        Ok(RunStatus { code: Some(0) })
    }
}

/// Create the files `cargo build` or `ndk-build` would have left behind.
pub fn simulate_toolchain(cmd: &ProcessBuilder) {
    let program = cmd
        .get_program()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let args = cmd.get_args();

    match program.as_str() {
        "cargo" if args.first().map(String::as_str) == Some("build") => {
            let Some(target_dir) = cmd.get_env("CARGO_TARGET_DIR") else {
                return;
            };
            let profile = if args.iter().any(|a| a == "-r") {
                "release"
            } else {
                "debug"
            };
            let package = value_after(args, "-p").unwrap_or_default();
            for (i, arg) in args.iter().enumerate() {
                if arg == "--target" {
                    let triple = &args[i + 1];
                    touch(
                        &Path::new(target_dir)
                            .join(triple)
                            .join(profile)
                            .join(format!("lib{}.a", package)),
                    );
                }
            }
        }
        "ndk-build" => {
            let Some(cwd) = cmd.get_cwd() else {
                return;
            };
            let abis = args
                .iter()
                .find_map(|a| a.strip_prefix("APP_ABI="))
                .unwrap_or_default();
            let outputs: Vec<&str> = args
                .iter()
                .filter_map(|a| a.strip_suffix("=1"))
                .filter_map(ndk_output)
                .collect();
            for abi in abis.split_whitespace() {
                for output in &outputs {
                    touch(&cwd.join("libs").join(abi).join(output));
                }
            }
        }
        _ => {}
    }
}

fn ndk_output(flag: &str) -> Option<&'static str> {
    match flag {
        "B_MAGISK" => Some("magisk"),
        "B_PRELOAD" => Some("libinit-ld.so"),
        "B_INIT" => Some("magiskinit"),
        "B_BOOT" => Some("magiskboot"),
        "B_POLICY" => Some("magiskpolicy"),
        "B_PROP" => Some("resetprop"),
        _ => None,
    }
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, path.display().to_string()).unwrap();
}

/// Toolchains rooted under `root`, with cargo and a prebuilt cleaner.
/// Nothing is created on disk.
pub fn fake_toolchains(root: &Path) -> Toolchains {
    let ndk = root.join("sdk/ndk/magisk");
    let rust_sysroot = ndk.join("toolchains/rust");
    Toolchains {
        ndk_build: ndk.join("ndk-build"),
        cargo: Some(rust_sysroot.join("bin/cargo")),
        elf_cleaner: Some(ElfCleaner::Prebuilt {
            path: root.join("tools/elf-cleaner"),
        }),
        cache_env: BTreeMap::new(),
        rust_sysroot,
        ndk,
    }
}

/// A build context for a checkout at `root` with fake toolchains.
pub fn fixture_context(
    root: &Path,
    targets: &[&str],
    abis: &[&str],
    profile: Profile,
    verbosity: u8,
) -> BuildContext {
    let gctx = GlobalContext::new(root);
    let request = BuildRequest::new(targets, abis, profile, verbosity).unwrap();
    BuildContext::new(&gctx, request, fake_toolchains(root), BuildConfig::default())
}

/// Every file under `dir`, relative to it, sorted.
pub fn tree(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.path().strip_prefix(dir).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_runner_fails_on_match() {
        let runner = RecordingRunner::failing_on("B_BOOT", 2);

        let ok = runner.run(&ProcessBuilder::new("ndk-build").arg("B_PROP=1")).unwrap();
        let failed = runner.run(&ProcessBuilder::new("ndk-build").arg("B_BOOT=1")).unwrap();

        assert!(ok.success());
        assert_eq!(failed.code, Some(2));
        assert_eq!(runner.command_lines(), ["ndk-build B_PROP=1", "ndk-build B_BOOT=1"]);
    }

    #[test]
    fn test_simulated_ndk_build() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cmd = ProcessBuilder::new("/ndk/ndk-build")
            .args(["B_BOOT=1", "B_CRT0=1", "APP_ABI=arm64-v8a x86"])
            .cwd(tmp.path());

        simulate_toolchain(&cmd);

        assert_eq!(
            tree(tmp.path()),
            [
                PathBuf::from("libs/arm64-v8a/magiskboot"),
                PathBuf::from("libs/x86/magiskboot"),
            ]
        );
    }

    #[test]
    fn test_simulated_cargo_build() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cmd = ProcessBuilder::new("/rust/bin/cargo")
            .args(["build", "-p", "magisk", "-r", "-q", "--target", "i686-linux-android"])
            .env("CARGO_TARGET_DIR", tmp.path().to_string_lossy());

        simulate_toolchain(&cmd);

        assert_eq!(
            tree(tmp.path()),
            [PathBuf::from("i686-linux-android/release/libmagisk.a")]
        );
    }
}

//! Toolchain capabilities for one run.
//!
//! Detection happens once, before the pipeline starts (see [`detect`]).
//! What it finds decides up front which phases can run: a missing
//! `ndk-build` is fatal, while a missing `cargo` turns the Rust phase (and a
//! cargo-hosted ELF cleaner) into a logged skip. Nothing downstream catches
//! spawn failures to emulate that.
//!
//! Detection order for every tool:
//! 1. `toolchain.toml` override
//! 2. NDK-relative default location
//! 3. PATH (cargo and compiler caches only)

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

mod detect;

pub use detect::{compiler_cache_env, detect_toolchains, verify_ndk_version};

/// ONDK release the product is pinned to.
pub const ONDK_VERSION: &str = "r29.5";

/// How the ELF metadata cleaner is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ElfCleaner {
    /// A prebuilt executable taking the files as arguments.
    Prebuilt { path: PathBuf },
    /// `cargo run --release --manifest-path <manifest> -- <files>`.
    Cargo { cargo: PathBuf, manifest: PathBuf },
}

/// Resolved tool locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchains {
    /// NDK root
    pub ndk: PathBuf,

    /// `ndk-build` script. Always present; detection fails otherwise.
    pub ndk_build: PathBuf,

    /// NDK-bundled Rust sysroot; its `bin/` is prepended to cargo's PATH.
    pub rust_sysroot: PathBuf,

    /// `None` when cargo is unavailable: the Rust phase is skipped.
    pub cargo: Option<PathBuf>,

    /// `None` when no form of the cleaner is available.
    pub elf_cleaner: Option<ElfCleaner>,

    /// Compiler-cache variables passed to every toolchain invocation.
    pub cache_env: BTreeMap<String, String>,
}

impl Toolchains {
    pub fn rust_bin_dir(&self) -> PathBuf {
        self.rust_sysroot.join("bin")
    }

    pub fn has_cargo(&self) -> bool {
        self.cargo.is_some()
    }

    /// One line per tool, for `magisk-build toolchain`.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let found = |p: &Option<PathBuf>| match p {
            Some(path) => path.display().to_string(),
            None => "not found".to_string(),
        };

        let cleaner = match &self.elf_cleaner {
            Some(ElfCleaner::Prebuilt { path }) => path.display().to_string(),
            Some(ElfCleaner::Cargo { manifest, .. }) => {
                format!("cargo run --manifest-path {}", manifest.display())
            }
            None => "not found".to_string(),
        };

        let caches = if self.cache_env.is_empty() {
            "none".to_string()
        } else {
            self.cache_env
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ")
        };

        vec![
            ("ndk", self.ndk.display().to_string()),
            ("ndk-build", self.ndk_build.display().to_string()),
            ("cargo", found(&self.cargo)),
            ("elf-cleaner", cleaner),
            ("cache", caches),
        ]
    }
}

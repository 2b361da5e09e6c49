//! Staged artifacts and the normalized per-ABI output layout.
//!
//! Both toolchains coordinate only through this tree: the Rust phase stages
//! its static libraries here, and `ndk-build` links against them from here.
//! Staged names are a pure function of (target, ABI, toolchain).

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::core::abi::Abi;
use crate::core::target::{Target, ToolchainKind};
use crate::util::fs::ensure_dir;

/// File name a target's output is staged under.
///
/// A Rust static library gets an `-rs` suffix so `ndk-build` can find it
/// unambiguously next to any same-named C/C++ artifact.
pub fn staged_name(target: Target, toolchain: ToolchainKind) -> String {
    match toolchain {
        ToolchainKind::Rust => format!("lib{}-rs.a", target.name()),
        ToolchainKind::Cpp => target.name().to_string(),
    }
}

/// One produced binary or library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub target: Target,
    pub abi: Abi,
    pub toolchain: ToolchainKind,
    pub path: PathBuf,
}

/// The `native/out` tree: one subdirectory per ABI plus generated sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OutputLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn abi_dir(&self, abi: Abi) -> PathBuf {
        self.root.join(abi.name())
    }

    /// Create the ABI directory if it does not exist yet.
    pub fn ensure_abi_dir(&self, abi: Abi) -> Result<PathBuf> {
        let dir = self.abi_dir(abi);
        ensure_dir(&dir)?;
        Ok(dir)
    }

    /// Where the generated flags pair is written.
    pub fn generated_dir(&self) -> PathBuf {
        self.root.join("generated")
    }

    /// Cargo's target directory.
    pub fn rust_dir(&self) -> PathBuf {
        self.root.join("rust")
    }

    /// Final location of a target's output for one ABI.
    pub fn staged_path(&self, target: Target, abi: Abi, toolchain: ToolchainKind) -> PathBuf {
        self.abi_dir(abi).join(staged_name(target, toolchain))
    }

    pub fn artifact(&self, target: Target, abi: Abi, toolchain: ToolchainKind) -> Artifact {
        Artifact {
            target,
            abi,
            toolchain,
            path: self.staged_path(target, abi, toolchain),
        }
    }
}

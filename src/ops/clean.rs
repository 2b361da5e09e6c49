//! Implementation of `magisk-build clean`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;

use crate::util::context::GlobalContext;
use crate::util::fs::remove_dir_all_if_exists;
use crate::util::shell::{Shell, Status};

/// Which outputs to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CleanTarget {
    /// The whole `native/out` tree
    Native,
    /// `ndk-build`'s `libs/` and `obj/`
    Cpp,
    /// Cargo's target directory
    Rust,
}

impl CleanTarget {
    pub const ALL: [CleanTarget; 3] = [CleanTarget::Native, CleanTarget::Cpp, CleanTarget::Rust];

    pub fn as_str(&self) -> &'static str {
        match self {
            CleanTarget::Native => "native",
            CleanTarget::Cpp => "cpp",
            CleanTarget::Rust => "rust",
        }
    }

    /// Directories removed for this target.
    pub fn dirs(&self, ctx: &GlobalContext) -> Vec<PathBuf> {
        match self {
            CleanTarget::Native => vec![ctx.output_layout().root().to_path_buf()],
            CleanTarget::Cpp => vec![ctx.ndk_libs_dir(), ctx.ndk_obj_dir()],
            CleanTarget::Rust => vec![ctx.output_layout().rust_dir()],
        }
    }
}

impl fmt::Display for CleanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CleanTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CleanTarget::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("invalid clean target '{}'; expected native, cpp or rust", s))
    }
}

/// Remove the outputs for each of `targets`; all of them when empty.
///
/// Returns the directories that existed and were removed.
pub fn clean(ctx: &GlobalContext, targets: &[CleanTarget], shell: &Shell) -> Result<Vec<PathBuf>> {
    let targets = if targets.is_empty() {
        CleanTarget::ALL.to_vec()
    } else {
        targets.to_vec()
    };

    let mut removed = Vec::new();
    for target in targets {
        for dir in target.dirs(ctx) {
            if !dir.exists() {
                tracing::debug!("{} already clean", dir.display());
                continue;
            }
            shell.status(Status::Cleaning, format!("{} ({})", dir.display(), target));
            remove_dir_all_if_exists(&dir)?;
            removed.push(dir);
        }
    }

    shell.status(Status::Removed, format!("{} director(ies)", removed.len()));
    Ok(removed)
}

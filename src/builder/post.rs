//! ELF cleaner pass over the staged executables that ship in the APK.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::context::BuildContext;
use crate::builder::toolchain::ElfCleaner;
use crate::builder::{describe_status, BuildError};
use crate::core::target::Target;
use crate::util::process::{prepend_path, CommandRunner, ProcessBuilder};

/// Executables the cleaner rewrites, relative to each ABI directory.
const CLEANED: [Target; 2] = [Target::Magisk, Target::MagiskPolicy];

/// Outcome of a post-processing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    /// Nothing in the run asked for it.
    NotRequested,
    /// Requested, but no tool or no input file.
    Skipped(&'static str),
    /// The cleaner ran over these files.
    Cleaned(Vec<PathBuf>),
}

pub struct PostProcessor<'a> {
    ctx: &'a BuildContext,
}

impl<'a> PostProcessor<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        PostProcessor { ctx }
    }

    /// Whether any expanded target ships a binary that must be cleaned.
    pub fn wants_run(&self) -> bool {
        self.ctx.expanded.targets().any(|t| t.needs_post_process())
    }

    /// Every path the cleaner would touch, present or not.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let layout = &self.ctx.layout;
        self.ctx
            .request
            .abis()
            .iter()
            .flat_map(|abi| CLEANED.iter().map(|t| layout.abi_dir(*abi).join(t.name())))
            .collect()
    }

    pub fn command(&self, tool: &ElfCleaner, files: &[PathBuf]) -> ProcessBuilder {
        match tool {
            ElfCleaner::Prebuilt { path } => ProcessBuilder::new(path)
                .args(files)
                .quiet(self.ctx.quiet_children()),
            ElfCleaner::Cargo { cargo, manifest } => {
                let mut cmd = ProcessBuilder::new(cargo)
                    .args(["run", "--release", "--manifest-path"])
                    .arg(manifest)
                    .env("PATH", prepend_path(&self.ctx.toolchains.rust_bin_dir()))
                    .envs(&self.ctx.toolchains.cache_env)
                    .quiet(self.ctx.quiet_children());
                match self.ctx.verbosity() {
                    0 => cmd = cmd.arg("-q"),
                    1 => {}
                    _ => cmd = cmd.arg("--verbose"),
                }
                cmd.arg("--").args(files)
            }
        }
    }

    /// Clean whichever candidates exist. A failing cleaner fails the build.
    pub fn run(&self, runner: &dyn CommandRunner) -> Result<PostOutcome> {
        if !self.wants_run() {
            return Ok(PostOutcome::NotRequested);
        }

        let files: Vec<PathBuf> = self
            .candidates()
            .into_iter()
            .filter(|p| p.is_file())
            .collect();
        if files.is_empty() {
            tracing::info!("no executables to clean");
            return Ok(PostOutcome::Skipped("no executables to clean"));
        }

        let Some(tool) = &self.ctx.toolchains.elf_cleaner else {
            tracing::warn!("elf-cleaner unavailable, leaving {} file(s) as built", files.len());
            return Ok(PostOutcome::Skipped("elf-cleaner unavailable"));
        };

        let cmd = self.command(tool, &files);
        tracing::info!("elf-cleaner {} file(s)", files.len());
        let status = runner.run(&cmd)?;
        if !status.success() {
            return Err(BuildError::PostProcessFailed {
                command: cmd.display_command(),
                status: describe_status(status),
            }
            .into());
        }

        Ok(PostOutcome::Cleaned(files))
    }
}

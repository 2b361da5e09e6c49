//! Artifact staging into the per-ABI output layout.
//!
//! Moves are destructive and best-effort: a source the toolchain did not
//! produce is skipped without error, and an existing destination is
//! overwritten. Whether a miss was expected is not known here.

use std::fs;
use std::io;

use anyhow::{Context, Result};

use crate::builder::cargo::CargoBuilder;
use crate::builder::context::BuildContext;
use crate::core::artifact::Artifact;
use crate::core::target::{Target, ToolchainKind};
use crate::util::fs::move_file;

pub struct Stager<'a> {
    ctx: &'a BuildContext,
}

impl<'a> Stager<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        Stager { ctx }
    }

    /// Move each `lib<T>.a` cargo produced to `<abi>/lib<T>-rs.a`.
    pub fn stage_rust(&self, targets: &[Target]) -> Result<Vec<Artifact>> {
        let cargo = CargoBuilder::new(self.ctx);
        let layout = &self.ctx.layout;
        let mut staged = Vec::new();

        for abi in self.ctx.request.abis() {
            layout.ensure_abi_dir(*abi)?;
            for target in targets {
                let artifact = layout.artifact(*target, *abi, ToolchainKind::Rust);
                if move_file(&cargo.raw_output(*target, *abi), &artifact.path)? {
                    staged.push(artifact);
                }
            }
        }

        Ok(staged)
    }

    /// Move everything `ndk-build` installed under `libs/<abi>/` to `<abi>/`.
    ///
    /// File names are kept. Files named after a target are reported as that
    /// target's artifact; anything else is moved but not reported.
    pub fn stage_ndk(&self) -> Result<Vec<Artifact>> {
        let layout = &self.ctx.layout;
        let mut staged = Vec::new();

        for abi in self.ctx.request.abis() {
            let out_dir = layout.ensure_abi_dir(*abi)?;
            let libs_dir = self.ctx.ndk_libs_dir.join(abi.name());

            let entries = match fs::read_dir(&libs_dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!("skip {} (not produced)", libs_dir.display());
                    continue;
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed to read {}", libs_dir.display()))
                }
            };

            let mut sources = Vec::new();
            for entry in entries {
                let entry = entry
                    .with_context(|| format!("failed to read {}", libs_dir.display()))?;
                if entry.file_type()?.is_file() {
                    sources.push(entry.path());
                }
            }
            sources.sort();

            for source in sources {
                let Some(name) = source.file_name() else {
                    continue;
                };
                let dest = out_dir.join(name);
                if !move_file(&source, &dest)? {
                    continue;
                }

                match name.to_str().and_then(|n| n.parse::<Target>().ok()) {
                    Some(target) => staged.push(Artifact {
                        target,
                        abi: *abi,
                        toolchain: ToolchainKind::Cpp,
                        path: dest,
                    }),
                    None => tracing::debug!("staged auxiliary output {}", dest.display()),
                }
            }
        }

        Ok(staged)
    }
}

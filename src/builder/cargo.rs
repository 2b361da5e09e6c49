//! Rust driver: one `cargo build` per target, all ABIs per invocation.

use std::path::{Path, PathBuf};

use crate::builder::context::BuildContext;
use crate::core::abi::Abi;
use crate::core::target::{Target, ToolchainKind};
use crate::util::process::{prepend_path, ProcessBuilder};

/// Builds the Rust static libraries for every target that needs them.
pub struct CargoBuilder<'a> {
    ctx: &'a BuildContext,
}

impl<'a> CargoBuilder<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        CargoBuilder { ctx }
    }

    /// Targets built with cargo this run, in registry order.
    pub fn targets(&self) -> Vec<Target> {
        self.ctx.expanded.for_toolchain(ToolchainKind::Rust)
    }

    /// `cargo build -p <target>` for every requested triple.
    pub fn command(&self, cargo: &Path, target: Target) -> ProcessBuilder {
        let ctx = self.ctx;
        let mut cmd = ProcessBuilder::new(cargo)
            .args(["build", "-p", target.name()])
            .cwd(&ctx.native_src_dir)
            .env("PATH", prepend_path(&ctx.toolchains.rust_bin_dir()))
            .env("CARGO_TARGET_DIR", ctx.layout.rust_dir().to_string_lossy())
            .envs(&ctx.toolchains.cache_env)
            .quiet(ctx.quiet_children());

        if ctx.request.profile().is_release() {
            cmd = cmd.arg("-r");
        }

        match ctx.verbosity() {
            0 => cmd = cmd.arg("-q"),
            1 => {}
            _ => cmd = cmd.arg("--verbose"),
        }

        for abi in ctx.request.abis() {
            cmd = cmd.arg("--target").arg(abi.triple());
        }

        cmd
    }

    /// Where cargo leaves `target`'s static library for `abi`.
    pub fn raw_output(&self, target: Target, abi: Abi) -> PathBuf {
        self.ctx
            .layout
            .rust_dir()
            .join(abi.triple())
            .join(self.ctx.request.profile().dir_name())
            .join(format!("lib{}.a", target.name()))
    }
}

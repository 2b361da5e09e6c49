//! C/C++ driver: `ndk-build` in two phases across all ABIs.
//!
//! Each target maps to `B_*` switches. Phase one builds everything without
//! special startup needs; phase two builds binaries linked against the
//! custom startup object and always carries `B_CRT0=1`. A phase with no
//! switches is not invoked.

use crate::builder::context::BuildContext;
use crate::core::abi::abi_list;
use crate::core::target::{NdkPhase, ToolchainKind};
use crate::util::process::ProcessBuilder;

pub struct NdkBuilder<'a> {
    ctx: &'a BuildContext,
}

impl<'a> NdkBuilder<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        NdkBuilder { ctx }
    }

    /// `B_*` switches for one phase, including the phase tag. Empty when the
    /// phase has nothing to build.
    pub fn phase_flags(&self, phase: NdkPhase) -> Vec<&'static str> {
        let mut flags: Vec<&'static str> = Vec::new();
        for target in self.ctx.expanded.for_toolchain(ToolchainKind::Cpp) {
            for (p, flag) in target.ndk_flags() {
                if *p == phase && !flags.contains(flag) {
                    flags.push(*flag);
                }
            }
        }

        if !flags.is_empty() {
            if let Some(tag) = phase.tag() {
                flags.push(tag);
            }
        }
        flags
    }

    /// The `ndk-build` invocation for `phase`, or `None` if it has no work.
    pub fn command(&self, phase: NdkPhase) -> Option<ProcessBuilder> {
        let flags = self.phase_flags(phase);
        if flags.is_empty() {
            return None;
        }

        let ctx = self.ctx;
        let mut cmd = ProcessBuilder::new(&ctx.toolchains.ndk_build)
            .args(flags.iter().map(|f| format!("{}=1", f)))
            .arg("NDK_PROJECT_PATH=.")
            .arg("NDK_APPLICATION_MK=src/Application.mk")
            .arg(format!("APP_ABI={}", abi_list(ctx.request.abis())))
            .arg(format!("-j{}", ctx.jobs))
            .cwd(&ctx.native_dir)
            .envs(&ctx.toolchains.cache_env)
            .quiet(ctx.quiet_children());

        if ctx.verbosity() > 1 {
            cmd = cmd.arg("V=1");
        }
        if !ctx.request.profile().is_release() {
            cmd = cmd.arg("MAGISK_DEBUG=1");
        }

        Some(cmd)
    }
}

//! Toolchain drivers, artifact staging and post-processing.

pub mod cargo;
pub mod context;
pub mod flags;
pub mod ndk;
pub mod post;
pub mod stager;
pub mod toolchain;

pub use cargo::CargoBuilder;
pub use context::BuildContext;
pub use flags::FlagsHeader;
pub use ndk::NdkBuilder;
pub use post::PostProcessor;
pub use stager::Stager;
pub use toolchain::{detect_toolchains, ElfCleaner, Toolchains};

use anyhow::Result;
use thiserror::Error;

use crate::util::process::{CommandRunner, ProcessBuilder, RunStatus};

/// A toolchain invocation that ran and failed. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Build binary failed! {step}: `{command}` {status}")]
    ToolchainFailed {
        step: String,
        command: String,
        status: String,
    },

    #[error("ELF cleaner failed: `{command}` {status}")]
    PostProcessFailed { command: String, status: String },
}

fn describe_status(status: RunStatus) -> String {
    match status.code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

/// Run a toolchain command, turning a non-zero exit into [`BuildError`].
pub(crate) fn run_toolchain(
    runner: &dyn CommandRunner,
    step: &str,
    cmd: &ProcessBuilder,
) -> Result<()> {
    let status = runner.run(cmd)?;
    if !status.success() {
        return Err(BuildError::ToolchainFailed {
            step: step.to_string(),
            command: cmd.display_command(),
            status: describe_status(status),
        }
        .into());
    }
    Ok(())
}

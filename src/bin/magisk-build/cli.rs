//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use magisk_build::ops::CleanTarget;

/// magisk-build - native build orchestrator for Magisk
#[derive(Parser)]
#[command(name = "magisk-build")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Build in release mode
    #[arg(short, long, global = true)]
    pub release: bool,

    /// Verbose output (-vv for toolchain verbosity)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config.prop (default: <project>/config.prop)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build native binaries and libraries
    Native(NativeArgs),

    /// Build everything with default targets and ABIs
    All,

    /// Remove build outputs
    Clean(CleanArgs),

    /// Show detected toolchains
    Toolchain,
}

#[derive(Args, Default)]
pub struct NativeArgs {
    /// Targets to build (default: all but resetprop)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub targets: Vec<String>,

    /// ABIs to build for, aliases accepted (default: abiList or all)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub abis: Vec<String>,

    /// Number of parallel ndk-build jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Print the build plan as JSON and exit
    #[arg(long)]
    pub plan: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// What to remove: native, cpp, rust (default: all)
    pub targets: Vec<CleanTarget>,
}

/// Options shared by every subcommand.
pub struct GlobalArgs {
    pub release: bool,
    pub verbose: u8,
    pub config: Option<PathBuf>,
    pub no_color: bool,
}

impl Cli {
    pub fn global_args(&self) -> GlobalArgs {
        GlobalArgs {
            release: self.release,
            verbose: self.verbose,
            config: self.config.clone(),
            no_color: self.no_color,
        }
    }
}

//! magisk-build CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, NativeArgs};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = match cli.verbose {
        0 => EnvFilter::new("magisk_build=info"),
        1 => EnvFilter::new("magisk_build=debug"),
        _ => EnvFilter::new("magisk_build=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .without_time()
        .init();

    let globals = cli.global_args();

    // Execute command
    match cli.command {
        Commands::Native(args) => commands::native::execute(&globals, args),
        Commands::All => commands::native::execute(&globals, NativeArgs::default()),
        Commands::Clean(args) => commands::clean::execute(&globals, args),
        Commands::Toolchain => commands::toolchain::execute(&globals),
    }
}

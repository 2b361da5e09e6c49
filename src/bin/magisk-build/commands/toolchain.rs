//! `magisk-build toolchain` command

use anyhow::Result;

use crate::cli::GlobalArgs;
use magisk_build::builder::detect_toolchains;
use magisk_build::builder::toolchain::ONDK_VERSION;
use magisk_build::util::context::env_lookup;
use magisk_build::util::GlobalContext;

pub fn execute(_globals: &GlobalArgs) -> Result<()> {
    let gctx = GlobalContext::from_cwd()?;
    let toolchains = detect_toolchains(&gctx, &gctx.toolchain_config().toolchain, env_lookup)?;

    println!("Toolchain (ONDK {}):", ONDK_VERSION);
    println!();
    for (name, value) in toolchains.describe() {
        println!("  {:<12} {}", format!("{}:", name), value);
    }

    Ok(())
}

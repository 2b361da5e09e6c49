//! `magisk-build native` command

use anyhow::Result;

use crate::cli::{GlobalArgs, NativeArgs};
use magisk_build::builder::{detect_toolchains, BuildContext};
use magisk_build::core::{Abi, BuildRequest, Profile, Target};
use magisk_build::ops::Pipeline;
use magisk_build::util::context::env_lookup;
use magisk_build::util::{BuildConfig, GlobalContext, Shell, SystemRunner};

pub fn execute(globals: &GlobalArgs, args: NativeArgs) -> Result<()> {
    let gctx = GlobalContext::from_cwd()?;
    let shell = Shell::from_flags(globals.verbose, globals.no_color);

    let config = BuildConfig::load(&gctx.config_prop_path(globals.config.as_deref()))?;

    // Targets: CLI > registry defaults
    let targets = if args.targets.is_empty() {
        Target::defaults().iter().map(|t| t.name().to_string()).collect()
    } else {
        args.targets
    };

    // ABIs: CLI > config.prop abiList > all
    let abis = if !args.abis.is_empty() {
        args.abis
    } else if let Some(list) = &config.abi_list {
        list.clone()
    } else {
        Abi::ALL.iter().map(|a| a.name().to_string()).collect()
    };

    let request = BuildRequest::new(
        &targets,
        &abis,
        Profile::from_release(globals.release),
        globals.verbose,
    )?;

    let toolchains = detect_toolchains(&gctx, &gctx.toolchain_config().toolchain, env_lookup)?;
    if !toolchains.has_cargo() {
        shell.warn("cargo not found, Rust libraries will not be rebuilt");
    }

    let ctx = BuildContext::new(&gctx, request, toolchains, config).with_jobs(args.jobs);
    let mut pipeline = Pipeline::new(&ctx);

    if args.plan {
        println!("{}", serde_json::to_string_pretty(pipeline.plan())?);
        return Ok(());
    }

    pipeline.run(&SystemRunner, &shell)?;
    Ok(())
}

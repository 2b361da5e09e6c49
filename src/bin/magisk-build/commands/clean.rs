//! `magisk-build clean` command

use anyhow::Result;

use crate::cli::{CleanArgs, GlobalArgs};
use magisk_build::ops::clean;
use magisk_build::util::{GlobalContext, Shell};

pub fn execute(globals: &GlobalArgs, args: CleanArgs) -> Result<()> {
    let ctx = GlobalContext::from_cwd()?;
    let shell = Shell::from_flags(globals.verbose, globals.no_color);

    clean(&ctx, &args.targets, &shell)?;
    Ok(())
}

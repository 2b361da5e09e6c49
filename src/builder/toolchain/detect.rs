//! Toolchain detection functions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::error::ConfigError;
use crate::util::config::ToolchainSettings;
use crate::util::context::{sdk_root, GlobalContext};
use crate::util::process::{find_executable, find_executable_at, find_executable_in};

use super::{ElfCleaner, Toolchains, ONDK_VERSION};

/// Detect every tool the pipeline may invoke.
///
/// Fails on configuration errors only (no SDK, wrong NDK, no `ndk-build`).
/// Optional tools that are missing come back as `None`.
pub fn detect_toolchains<F>(
    ctx: &GlobalContext,
    settings: &ToolchainSettings,
    env: F,
) -> Result<Toolchains>
where
    F: Fn(&str) -> Option<String>,
{
    let ndk = match &settings.ndk {
        Some(ndk) => ndk.clone(),
        None => sdk_root(&env)?.join("ndk").join("magisk"),
    };

    verify_ndk_version(&ndk)?;

    let ndk_build = match &settings.ndk_build {
        Some(path) if path.is_file() => path.clone(),
        Some(path) => return Err(ConfigError::MissingNdkBuild { path: path.clone() }.into()),
        // Resolves to `ndk-build.cmd` on Windows
        None => find_executable_at("ndk-build", &ndk)
            .ok_or_else(|| ConfigError::MissingNdkBuild {
                path: ndk.join("ndk-build"),
            })?,
    };

    let rust_sysroot = ndk.join("toolchains").join("rust");

    let cargo = match &settings.cargo {
        Some(cargo) if cargo.is_file() => Some(cargo.clone()),
        Some(cargo) => {
            tracing::warn!("Configured cargo not found: {}", cargo.display());
            None
        }
        None => find_executable_in("cargo", &[rust_sysroot.join("bin")]),
    };

    let elf_cleaner = detect_elf_cleaner(ctx, settings, cargo.as_deref());

    let cache_env = compiler_cache_env(|name| {
        env(&format!("MAGISK_BUILD_NO_{}", name.to_uppercase()))
            .is_none()
            .then(|| find_executable(name))
            .flatten()
    });

    let toolchains = Toolchains {
        ndk,
        ndk_build,
        rust_sysroot,
        cargo,
        elf_cleaner,
        cache_env,
    };
    tracing::debug!("detected toolchains: {:?}", toolchains);
    Ok(toolchains)
}

fn detect_elf_cleaner(
    ctx: &GlobalContext,
    settings: &ToolchainSettings,
    cargo: Option<&Path>,
) -> Option<ElfCleaner> {
    if let Some(path) = &settings.elf_cleaner {
        if path.is_file() {
            return Some(ElfCleaner::Prebuilt { path: path.clone() });
        }
        tracing::warn!("Configured elf-cleaner not found: {}", path.display());
    }

    let manifest = ctx.elf_cleaner_manifest();
    match cargo {
        Some(cargo) if manifest.is_file() => Some(ElfCleaner::Cargo {
            cargo: cargo.to_path_buf(),
            manifest,
        }),
        _ => None,
    }
}

/// Check `<ndk>/ONDK_VERSION` against the pinned release.
pub fn verify_ndk_version(ndk: &Path) -> Result<()> {
    let path = ndk.join("ONDK_VERSION");
    let found = match std::fs::read_to_string(&path) {
        Ok(contents) => contents.trim().to_string(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => "none".to_string(),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    if found != ONDK_VERSION {
        return Err(ConfigError::NdkVersionMismatch {
            expected: ONDK_VERSION.to_string(),
            found,
        }
        .into());
    }
    Ok(())
}

/// Environment wiring compiler caches into both toolchains.
///
/// sccache serves Rust and C/C++; ccache, when present, takes over C/C++.
pub fn compiler_cache_env<F>(find: F) -> BTreeMap<String, String>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let mut env = BTreeMap::new();

    if let Some(sccache) = find("sccache") {
        let sccache = sccache.display().to_string();
        env.insert("RUSTC_WRAPPER".to_string(), sccache.clone());
        env.insert("NDK_CCACHE".to_string(), sccache);
        env.insert("CARGO_INCREMENTAL".to_string(), "0".to_string());
    }
    if let Some(ccache) = find("ccache") {
        env.insert("NDK_CCACHE".to_string(), ccache.display().to_string());
    }

    env
}

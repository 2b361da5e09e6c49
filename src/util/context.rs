//! Global context: project paths and SDK discovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::artifact::OutputLayout;
use crate::core::error::ConfigError;
use crate::util::config::{
    global_toolchain_config_path, load_toolchain_config, project_toolchain_config_path,
    ToolchainConfig,
};

/// Paths of one checkout of the product.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    root: PathBuf,
}

impl GlobalContext {
    /// Context rooted at an explicit project directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        GlobalContext { root: root.into() }
    }

    /// Context for the checkout containing the current directory.
    pub fn from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext::new(find_project_root(&cwd)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `native/`, where `ndk-build` runs.
    pub fn native_dir(&self) -> PathBuf {
        self.root.join("native")
    }

    /// `native/src/`, the cargo workspace.
    pub fn native_src_dir(&self) -> PathBuf {
        self.native_dir().join("src")
    }

    /// `native/libs/`, where `ndk-build` installs its outputs.
    pub fn ndk_libs_dir(&self) -> PathBuf {
        self.native_dir().join("libs")
    }

    /// `native/obj/`, `ndk-build` intermediates.
    pub fn ndk_obj_dir(&self) -> PathBuf {
        self.native_dir().join("obj")
    }

    /// The normalized `native/out/` layout.
    pub fn output_layout(&self) -> OutputLayout {
        OutputLayout::new(self.native_dir().join("out"))
    }

    /// Manifest of the ELF metadata cleaner tool.
    pub fn elf_cleaner_manifest(&self) -> PathBuf {
        self.root.join("tools").join("elf-cleaner").join("Cargo.toml")
    }

    /// `config.prop`, or an explicit override resolved against the root.
    pub fn config_prop_path(&self, custom: Option<&Path>) -> PathBuf {
        match custom {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => self.root.join(path),
            None => self.root.join("config.prop"),
        }
    }

    /// Merged global + project toolchain overrides.
    pub fn toolchain_config(&self) -> ToolchainConfig {
        let global = global_toolchain_config_path();
        load_toolchain_config(global.as_deref(), &project_toolchain_config_path(&self.root))
    }
}

/// Walk upward from `start` to the first directory containing `native/`.
/// Falls back to `start` itself.
pub fn find_project_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join("native").is_dir())
        .unwrap_or(start)
        .to_path_buf()
}

/// Android SDK root from `ANDROID_HOME`, else `ANDROID_SDK_ROOT`.
///
/// `lookup` is the environment accessor, injectable for tests.
pub fn sdk_root<F>(lookup: F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
        .into_iter()
        .filter_map(lookup)
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
        .ok_or(ConfigError::MissingSdk)
}

/// Environment accessor for [`sdk_root`].
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

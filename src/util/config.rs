//! Configuration file support.
//!
//! Two sources feed a build:
//! - `config.prop` at the project root: product version and default ABIs,
//!   in the product's own `key=value` format.
//! - `toolchain.toml`: tool path overrides, global (`~/.magisk-build/`)
//!   then project (`.magisk-build/`). Project takes precedence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;

/// Default product version string.
pub const DEFAULT_VERSION: &str = "master";

/// Default numeric version code.
pub const DEFAULT_VERSION_CODE: i32 = 55555;

/// Parse `key=value` lines. Blank lines and `#` comments are skipped;
/// keys and values are trimmed; the first `=` splits.
pub fn parse_props(contents: &str) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            props.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    props
}

/// Product settings from `config.prop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfig {
    pub version: String,
    pub version_code: i32,
    /// ABI tokens used when the caller names none.
    pub abi_list: Option<Vec<String>>,
    /// Packaging output directory, passed through for downstream steps.
    pub outdir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            version: DEFAULT_VERSION.to_string(),
            version_code: DEFAULT_VERSION_CODE,
            abi_list: None,
            outdir: PathBuf::from("out"),
        }
    }
}

impl BuildConfig {
    /// Load `config.prop`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("{} not found, using defaults", path.display());
            return Ok(BuildConfig::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        Ok(Self::from_props(&parse_props(&contents), path)?)
    }

    /// Build from parsed props. `path` is only used in error messages.
    pub fn from_props(props: &BTreeMap<String, String>, path: &Path) -> Result<Self, ConfigError> {
        let mut config = BuildConfig::default();

        if let Some(version) = props.get("version") {
            config.version = version.clone();
        }

        if let Some(code) = props.get("versionCode") {
            config.version_code = code.parse().map_err(|_| ConfigError::InvalidProp {
                key: "versionCode".to_string(),
                value: code.clone(),
                path: path.to_path_buf(),
            })?;
        }

        if let Some(abis) = props.get("abiList") {
            let tokens: Vec<String> = abis
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !tokens.is_empty() {
                config.abi_list = Some(tokens);
            }
        }

        if let Some(outdir) = props.get("outdir") {
            config.outdir = PathBuf::from(outdir);
        }

        Ok(config)
    }
}

/// Tool path overrides, stored in `toolchain.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub toolchain: ToolchainSettings,
}

/// Explicit tool locations. Anything unset is discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// NDK root (default: `$ANDROID_HOME/ndk/magisk`)
    pub ndk: Option<PathBuf>,

    /// `ndk-build` script (default: `ndk-build` looked up in `<ndk>`)
    pub ndk_build: Option<PathBuf>,

    /// `cargo` executable (default: `<ndk>/toolchains/rust/bin`, then PATH)
    pub cargo: Option<PathBuf>,

    /// Prebuilt `elf-cleaner` (default: `cargo run` of `tools/elf-cleaner`)
    pub elf_cleaner: Option<PathBuf>,
}

impl ToolchainConfig {
    /// Load toolchain configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read toolchain config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse toolchain config: {}", path.display()))
    }

    /// Load with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!(
                    "Failed to load toolchain config from {}: {:#}",
                    path.display(),
                    e
                );
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: ToolchainConfig) {
        let ours = &mut self.toolchain;
        let theirs = other.toolchain;
        if theirs.ndk.is_some() {
            ours.ndk = theirs.ndk;
        }
        if theirs.ndk_build.is_some() {
            ours.ndk_build = theirs.ndk_build;
        }
        if theirs.cargo.is_some() {
            ours.cargo = theirs.cargo;
        }
        if theirs.elf_cleaner.is_some() {
            ours.elf_cleaner = theirs.elf_cleaner;
        }
    }
}

/// Load merged toolchain configuration.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.magisk-build/toolchain.toml)
/// 2. Global config (~/.magisk-build/toolchain.toml)
/// 3. Defaults
pub fn load_toolchain_config(global_path: Option<&Path>, project_path: &Path) -> ToolchainConfig {
    let mut config = ToolchainConfig::default();

    if let Some(global_path) = global_path {
        config.merge(ToolchainConfig::load_or_default(global_path));
    }
    config.merge(ToolchainConfig::load_or_default(project_path));

    config
}

/// Get the global config directory (~/.magisk-build).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".magisk-build"))
}

/// Get the global toolchain config path (~/.magisk-build/toolchain.toml).
pub fn global_toolchain_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("toolchain.toml"))
}

/// Get the project toolchain config path (.magisk-build/toolchain.toml).
pub fn project_toolchain_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".magisk-build").join("toolchain.toml")
}

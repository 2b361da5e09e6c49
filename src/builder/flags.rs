//! Generated version constants shared by the C/C++ and Rust sources.

use std::path::Path;

use anyhow::Result;

use crate::core::request::Profile;
use crate::util::config::BuildConfig;
use crate::util::fs::write_if_changed;

pub const C_HEADER: &str = "flags.h";
pub const RUST_MODULE: &str = "flags.rs";

/// Values baked into `flags.h` and `flags.rs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagsHeader {
    pub version: String,
    pub version_code: i32,
    pub debug: bool,
}

impl FlagsHeader {
    pub fn from_config(config: &BuildConfig, profile: Profile) -> Self {
        FlagsHeader {
            version: config.version.clone(),
            version_code: config.version_code,
            debug: !profile.is_release(),
        }
    }

    pub fn render_c(&self) -> String {
        format!(
            "#pragma once\n\
             #define MAGISK_VERSION \"{}\"\n\
             #define MAGISK_VER_CODE {}\n\
             #define MAGISK_DEBUG {}\n",
            escape(&self.version),
            self.version_code,
            u8::from(self.debug),
        )
    }

    pub fn render_rust(&self) -> String {
        format!(
            "pub const MAGISK_VERSION: &str = \"{}\";\n\
             pub const MAGISK_VER_CODE: i32 = {};\n",
            escape(&self.version),
            self.version_code,
        )
    }

    /// Write both files into `dir`. Unchanged files are left alone so their
    /// mtimes do not trigger rebuilds. Returns whether anything was written.
    pub fn write(&self, dir: &Path) -> Result<bool> {
        let c = write_if_changed(&dir.join(C_HEADER), &self.render_c())?;
        let rs = write_if_changed(&dir.join(RUST_MODULE), &self.render_rust())?;
        Ok(c || rs)
    }
}

// Both languages accept the same escapes for `"` and `\`.
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

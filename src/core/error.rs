//! Configuration error types.
//!
//! Every variant here is detected before any toolchain is invoked and is
//! always fatal.

use std::path::PathBuf;

use thiserror::Error;

/// A fatal problem with the caller's request or the build environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown ABI: {token}")]
    UnknownAbi { token: String },

    #[error("Unknown target: {token} (available: {available})")]
    UnknownTarget { token: String, available: String },

    #[error("no ABI requested")]
    EmptyAbiSet,

    #[error("no target requested")]
    EmptyTargetSet,

    #[error("Please set ANDROID_HOME or ANDROID_SDK_ROOT")]
    MissingSdk,

    #[error("ndk-build not found at {}", path.display())]
    MissingNdkBuild { path: PathBuf },

    #[error("Unmatched NDK. Please install/upgrade NDK to {expected} (found: {found})")]
    NdkVersionMismatch { expected: String, found: String },

    #[error("invalid value `{value}` for `{key}` in {}", path.display())]
    InvalidProp {
        key: String,
        value: String,
        path: PathBuf,
    },
}

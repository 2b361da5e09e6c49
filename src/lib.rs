//! magisk-build - native build orchestrator for Magisk
//!
//! Drives `cargo` and `ndk-build` over a set of targets and Android ABIs,
//! staging every output into one normalized per-ABI layout.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities for magisk-build unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recording command runner that can simulate
/// toolchain outputs.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{Abi, BuildRequest, ConfigError, Profile, Target};
pub use util::context::GlobalContext;

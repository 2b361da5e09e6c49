//! Command implementations

pub mod clean;
pub mod native;
pub mod toolchain;

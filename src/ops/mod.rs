//! High-level operations.
//!
//! This module contains the implementation of magisk-build commands.

pub mod clean;
pub mod native_build;

pub use clean::{clean, CleanTarget};
pub use native_build::{build_native, BuildPlan, BuildReport, Pipeline, PipelineState, PlanStep};

//! Core data model: ABIs, targets, requests and the output layout.

pub mod abi;
pub mod artifact;
pub mod error;
pub mod request;
pub mod target;

pub use abi::{Abi, AbiSet};
pub use artifact::{Artifact, OutputLayout};
pub use error::ConfigError;
pub use request::{BuildRequest, Profile};
pub use target::{ExpandedTargets, NdkPhase, Target, TargetRegistry, ToolchainKind};

//! A single orchestration run's inputs.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::abi::{resolve_abis, AbiSet};
use crate::core::error::ConfigError;
use crate::core::target::{resolve_targets, Target};

/// Build profile, forwarded to both toolchains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Debug,
    Release,
}

impl Profile {
    pub fn from_release(release: bool) -> Self {
        if release {
            Profile::Release
        } else {
            Profile::Debug
        }
    }

    /// Directory name cargo uses for this profile.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Profile::Debug => "debug",
            Profile::Release => "release",
        }
    }

    pub fn is_release(&self) -> bool {
        matches!(self, Profile::Release)
    }
}

/// A validated build request. Constructed once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildRequest {
    targets: BTreeSet<Target>,
    abis: AbiSet,
    profile: Profile,
    verbosity: u8,
}

impl BuildRequest {
    /// Validate caller tokens into a request.
    ///
    /// ABIs are resolved first so an unknown ABI is reported even when the
    /// target list is also wrong.
    pub fn new<T, A, S1, S2>(
        targets: T,
        abis: A,
        profile: Profile,
        verbosity: u8,
    ) -> Result<Self, ConfigError>
    where
        T: IntoIterator<Item = S1>,
        A: IntoIterator<Item = S2>,
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        let abis = resolve_abis(abis)?;
        let targets = resolve_targets(targets)?;
        Ok(BuildRequest {
            targets,
            abis,
            profile,
            verbosity,
        })
    }

    pub fn targets(&self) -> &BTreeSet<Target> {
        &self.targets
    }

    pub fn abis(&self) -> &AbiSet {
        &self.abis
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }
}

//! ABI registry and resolution.
//!
//! The set of architectures is closed: every ABI the product ships for is a
//! variant of [`Abi`], each with exactly one Rust target triple. Callers may
//! use short aliases (`arm64`, `x64`, ...) which are substituted before the
//! lookup.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::core::error::ConfigError;

/// One supported Android ABI.
///
/// Variant order is registry order; sets of ABIs iterate in this order so
/// derived command lines are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Abi {
    #[serde(rename = "armeabi-v7a")]
    ArmeabiV7a,
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "arm64-v8a")]
    Arm64V8a,
    #[serde(rename = "x86_64")]
    X86_64,
}

/// A resolved, non-empty set of ABIs.
pub type AbiSet = BTreeSet<Abi>;

/// User-facing aliases and the canonical ABI they stand for.
pub const ABI_ALIASES: &[(&str, Abi)] = &[
    ("arm", Abi::ArmeabiV7a),
    ("arm32", Abi::ArmeabiV7a),
    ("arm64", Abi::Arm64V8a),
    ("x64", Abi::X86_64),
];

impl Abi {
    /// Every supported ABI, in registry order.
    pub const ALL: [Abi; 4] = [Abi::ArmeabiV7a, Abi::X86, Abi::Arm64V8a, Abi::X86_64];

    /// Canonical ABI name, as understood by `ndk-build`'s `APP_ABI`.
    pub fn name(&self) -> &'static str {
        match self {
            Abi::ArmeabiV7a => "armeabi-v7a",
            Abi::X86 => "x86",
            Abi::Arm64V8a => "arm64-v8a",
            Abi::X86_64 => "x86_64",
        }
    }

    /// Rust target triple for this ABI.
    pub fn triple(&self) -> &'static str {
        match self {
            Abi::ArmeabiV7a => "thumbv7neon-linux-androideabi",
            Abi::X86 => "i686-linux-android",
            Abi::Arm64V8a => "aarch64-linux-android",
            Abi::X86_64 => "x86_64-linux-android",
        }
    }

    /// Look up an ABI by its canonical name only.
    pub fn from_canonical(name: &str) -> Option<Abi> {
        Abi::ALL.into_iter().find(|abi| abi.name() == name)
    }

    /// Resolve a token that may be an alias or a canonical name.
    pub fn resolve(token: &str) -> Option<Abi> {
        let token = token.trim();
        ABI_ALIASES
            .iter()
            .find(|(alias, _)| *alias == token)
            .map(|(_, abi)| *abi)
            .or_else(|| Abi::from_canonical(token))
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Abi {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Abi::resolve(s).ok_or_else(|| ConfigError::UnknownAbi {
            token: s.to_string(),
        })
    }
}

/// Resolve caller-supplied ABI tokens into a canonical set.
///
/// Either every token resolves or the whole request fails; an empty request
/// is an error as well.
pub fn resolve_abis<I, S>(tokens: I) -> Result<AbiSet, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut abis = AbiSet::new();
    for token in tokens {
        abis.insert(token.as_ref().parse::<Abi>()?);
    }

    if abis.is_empty() {
        return Err(ConfigError::EmptyAbiSet);
    }

    Ok(abis)
}

/// Space-separated canonical names, in registry order.
pub fn abi_list(abis: &AbiSet) -> String {
    abis.iter().map(Abi::name).collect::<Vec<_>>().join(" ")
}

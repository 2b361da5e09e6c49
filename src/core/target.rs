//! Target registry and dependency expansion.
//!
//! Targets form a small closed set. Each one declares which toolchains build
//! it, the `ndk-build` switches that enable its sources, and any implicit
//! dependency on another target's output from a specific toolchain.
//!
//! The implicit-dependency table must stay acyclic. This is checked once,
//! when the registry is constructed, never during expansion.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use serde::Serialize;
use thiserror::Error;

use crate::core::error::ConfigError;

/// The toolchain a piece of output originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolchainKind {
    /// C/C++ sources built by `ndk-build`.
    Cpp,
    /// Rust crates built by `cargo`.
    Rust,
}

impl ToolchainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainKind::Cpp => "cpp",
            ToolchainKind::Rust => "rust",
        }
    }
}

impl fmt::Display for ToolchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two sequential `ndk-build` phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NdkPhase {
    /// Binaries with no special startup requirements.
    Main,
    /// Binaries linked against the custom process-entry object.
    Crt0,
}

impl NdkPhase {
    pub const ALL: [NdkPhase; 2] = [NdkPhase::Main, NdkPhase::Crt0];

    /// Switch every invocation of this phase carries, regardless of targets.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            NdkPhase::Main => None,
            NdkPhase::Crt0 => Some("B_CRT0"),
        }
    }
}

/// One named build unit.
///
/// Variant order is registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Magisk,
    MagiskInit,
    MagiskBoot,
    MagiskPolicy,
    Resetprop,
}

impl Target {
    pub const ALL: [Target; 5] = [
        Target::Magisk,
        Target::MagiskInit,
        Target::MagiskBoot,
        Target::MagiskPolicy,
        Target::Resetprop,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Target::Magisk => "magisk",
            Target::MagiskInit => "magiskinit",
            Target::MagiskBoot => "magiskboot",
            Target::MagiskPolicy => "magiskpolicy",
            Target::Resetprop => "resetprop",
        }
    }

    /// `ndk-build` switches enabling this target's C/C++ sources.
    pub fn ndk_flags(&self) -> &'static [(NdkPhase, &'static str)] {
        match self {
            Target::Magisk => &[(NdkPhase::Main, "B_MAGISK")],
            Target::MagiskInit => &[(NdkPhase::Main, "B_PRELOAD"), (NdkPhase::Crt0, "B_INIT")],
            Target::MagiskBoot => &[(NdkPhase::Crt0, "B_BOOT")],
            Target::MagiskPolicy => &[(NdkPhase::Main, "B_POLICY")],
            Target::Resetprop => &[(NdkPhase::Main, "B_PROP")],
        }
    }

    /// Whether the target has a Rust crate of its own.
    pub fn has_rust(&self) -> bool {
        !matches!(self, Target::Resetprop)
    }

    /// Toolchains needed when this target is requested directly.
    pub fn toolchains(&self) -> BTreeSet<ToolchainKind> {
        let mut kinds = BTreeSet::new();
        if !self.ndk_flags().is_empty() {
            kinds.insert(ToolchainKind::Cpp);
        }
        if self.has_rust() {
            kinds.insert(ToolchainKind::Rust);
        }
        kinds
    }

    /// Built when no explicit target list is given.
    pub fn is_default(&self) -> bool {
        !matches!(self, Target::Resetprop)
    }

    /// Final binary needs ELF metadata normalization.
    pub fn needs_post_process(&self) -> bool {
        matches!(self, Target::Magisk | Target::MagiskPolicy)
    }

    pub fn defaults() -> BTreeSet<Target> {
        Target::ALL.into_iter().filter(Target::is_default).collect()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Target::ALL
            .into_iter()
            .find(|t| t.name() == token)
            .ok_or_else(|| ConfigError::UnknownTarget {
                token: s.to_string(),
                available: Target::ALL
                    .iter()
                    .map(Target::name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Resolve caller-supplied target tokens. All or nothing; empty is an error.
pub fn resolve_targets<I, S>(tokens: I) -> Result<BTreeSet<Target>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut targets = BTreeSet::new();
    for token in tokens {
        targets.insert(token.as_ref().parse::<Target>()?);
    }

    if targets.is_empty() {
        return Err(ConfigError::EmptyTargetSet);
    }

    Ok(targets)
}

/// `from` being built at all requires `to`'s output from `toolchain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplicitDep {
    pub from: Target,
    pub to: Target,
    pub toolchain: ToolchainKind,
}

/// Built-in implicit dependencies.
///
/// `resetprop` links against magisk's Rust library at runtime but has no Rust
/// crate of its own.
pub const IMPLICIT_DEPS: &[ImplicitDep] = &[ImplicitDep {
    from: Target::Resetprop,
    to: Target::Magisk,
    toolchain: ToolchainKind::Rust,
}];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("implicit dependencies form a cycle")]
    Cycle,

    #[error("`{from}` depends on the {toolchain} output of `{to}`, which has none")]
    MissingToolchain {
        from: Target,
        to: Target,
        toolchain: ToolchainKind,
    },
}

/// Adjacency table of implicit dependencies, validated at construction.
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    edges: HashMap<Target, Vec<(Target, ToolchainKind)>>,
}

static REGISTRY: LazyLock<TargetRegistry> = LazyLock::new(|| {
    match TargetRegistry::from_deps(IMPLICIT_DEPS) {
        Ok(registry) => registry,
        Err(e) => panic!("built-in target registry is invalid: {e}"),
    }
});

impl TargetRegistry {
    /// The registry built from [`IMPLICIT_DEPS`].
    pub fn global() -> &'static TargetRegistry {
        &REGISTRY
    }

    /// Build a registry, rejecting cycles and edges to missing toolchains.
    pub fn from_deps(deps: &[ImplicitDep]) -> Result<Self, RegistryError> {
        let mut graph = DiGraph::<Target, ToolchainKind>::new();
        let nodes: HashMap<Target, _> = Target::ALL
            .into_iter()
            .map(|t| (t, graph.add_node(t)))
            .collect();

        let mut edges: HashMap<Target, Vec<(Target, ToolchainKind)>> = HashMap::new();
        for dep in deps {
            if !dep.to.toolchains().contains(&dep.toolchain) {
                return Err(RegistryError::MissingToolchain {
                    from: dep.from,
                    to: dep.to,
                    toolchain: dep.toolchain,
                });
            }
            graph.add_edge(nodes[&dep.from], nodes[&dep.to], dep.toolchain);
            edges.entry(dep.from).or_default().push((dep.to, dep.toolchain));
        }

        if is_cyclic_directed(&graph) {
            return Err(RegistryError::Cycle);
        }

        Ok(TargetRegistry { edges })
    }

    /// Expand a requested set with implicit dependencies.
    ///
    /// Bounded fixed-point: an acyclic table over `n` targets settles in at
    /// most `n` rounds.
    pub fn expand(&self, requested: &BTreeSet<Target>) -> ExpandedTargets {
        let mut entries: BTreeMap<Target, BTreeSet<ToolchainKind>> = requested
            .iter()
            .map(|t| (*t, t.toolchains()))
            .collect();

        for _ in 0..=Target::ALL.len() {
            let mut pulled = Vec::new();
            for from in entries.keys() {
                for (to, toolchain) in self.edges.get(from).into_iter().flatten() {
                    let present = entries
                        .get(to)
                        .is_some_and(|kinds| kinds.contains(toolchain));
                    if !present {
                        pulled.push((*to, *toolchain));
                    }
                }
            }

            if pulled.is_empty() {
                break;
            }
            for (to, toolchain) in pulled {
                tracing::debug!("`{}` pulled in for its {} output", to, toolchain);
                entries.entry(to).or_default().insert(toolchain);
            }
        }

        ExpandedTargets {
            requested: requested.clone(),
            entries,
        }
    }
}

/// A requested target set after implicit-dependency expansion.
///
/// Each member records the toolchains it must be built with. A target that
/// was only pulled in is built with just the toolchain its dependents need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandedTargets {
    requested: BTreeSet<Target>,
    entries: BTreeMap<Target, BTreeSet<ToolchainKind>>,
}

impl ExpandedTargets {
    /// Every target in the expanded set, in registry order.
    pub fn targets(&self) -> impl Iterator<Item = Target> + '_ {
        self.entries.keys().copied()
    }

    /// Targets the caller asked for.
    pub fn requested(&self) -> &BTreeSet<Target> {
        &self.requested
    }

    pub fn contains(&self, target: Target) -> bool {
        self.entries.contains_key(&target)
    }

    /// Whether `target` is built with `toolchain` in this run.
    pub fn needs(&self, target: Target, toolchain: ToolchainKind) -> bool {
        self.entries
            .get(&target)
            .is_some_and(|kinds| kinds.contains(&toolchain))
    }

    /// Targets built with `toolchain`, in registry order.
    pub fn for_toolchain(&self, toolchain: ToolchainKind) -> Vec<Target> {
        self.entries
            .iter()
            .filter(|(_, kinds)| kinds.contains(&toolchain))
            .map(|(t, _)| *t)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ExpandedTargets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.targets().map(|t| t.name()).collect();
        f.write_str(&names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(targets: &[Target]) -> BTreeSet<Target> {
        targets.iter().copied().collect()
    }

    #[test]
    fn test_builtin_registry_is_valid() {
        assert!(TargetRegistry::from_deps(IMPLICIT_DEPS).is_ok());
    }

    #[test]
    fn test_cycle_rejected() {
        let deps = [
            ImplicitDep {
                from: Target::Magisk,
                to: Target::MagiskBoot,
                toolchain: ToolchainKind::Rust,
            },
            ImplicitDep {
                from: Target::MagiskBoot,
                to: Target::Magisk,
                toolchain: ToolchainKind::Rust,
            },
        ];
        assert_eq!(
            TargetRegistry::from_deps(&deps).unwrap_err(),
            RegistryError::Cycle
        );
    }

    #[test]
    fn test_edge_to_missing_toolchain_rejected() {
        let deps = [ImplicitDep {
            from: Target::Magisk,
            to: Target::Resetprop,
            toolchain: ToolchainKind::Rust,
        }];
        assert!(matches!(
            TargetRegistry::from_deps(&deps),
            Err(RegistryError::MissingToolchain { .. })
        ));
    }

    #[test]
    fn test_resetprop_pulls_in_magisk_rust() {
        let expanded = TargetRegistry::global().expand(&set(&[Target::Resetprop]));

        assert!(expanded.contains(Target::Magisk));
        assert!(expanded.needs(Target::Magisk, ToolchainKind::Rust));
        assert!(!expanded.needs(Target::Magisk, ToolchainKind::Cpp));
        assert!(expanded.needs(Target::Resetprop, ToolchainKind::Cpp));
        assert_eq!(expanded.to_string(), "magisk resetprop");
        assert_eq!(expanded.requested(), &set(&[Target::Resetprop]));
    }

    #[test]
    fn test_explicit_magisk_keeps_both_toolchains() {
        let expanded =
            TargetRegistry::global().expand(&set(&[Target::Resetprop, Target::Magisk]));
        assert!(expanded.needs(Target::Magisk, ToolchainKind::Rust));
        assert!(expanded.needs(Target::Magisk, ToolchainKind::Cpp));
        assert_eq!(expanded.len(), 2);
    }

    #[test]
    fn test_expansion_without_deps_is_identity() {
        let requested = set(&[Target::MagiskBoot]);
        let expanded = TargetRegistry::global().expand(&requested);
        assert_eq!(expanded.targets().collect::<BTreeSet<_>>(), requested);
    }

    #[test]
    fn test_transitive_expansion_settles() {
        let deps = [
            ImplicitDep {
                from: Target::Resetprop,
                to: Target::MagiskPolicy,
                toolchain: ToolchainKind::Cpp,
            },
            ImplicitDep {
                from: Target::MagiskPolicy,
                to: Target::Magisk,
                toolchain: ToolchainKind::Rust,
            },
        ];
        let registry = TargetRegistry::from_deps(&deps).unwrap();
        let expanded = registry.expand(&set(&[Target::Resetprop]));
        assert!(expanded.needs(Target::MagiskPolicy, ToolchainKind::Cpp));
        assert!(!expanded.needs(Target::MagiskPolicy, ToolchainKind::Rust));
        assert!(expanded.needs(Target::Magisk, ToolchainKind::Rust));
    }

    #[test]
    fn test_for_toolchain() {
        let expanded = TargetRegistry::global().expand(&set(&[Target::Resetprop]));
        assert_eq!(expanded.for_toolchain(ToolchainKind::Rust), vec![Target::Magisk]);
        assert_eq!(
            expanded.for_toolchain(ToolchainKind::Cpp),
            vec![Target::Resetprop]
        );
    }

    #[test]
    fn test_defaults_exclude_resetprop() {
        let defaults = Target::defaults();
        assert_eq!(defaults.len(), 4);
        assert!(!defaults.contains(&Target::Resetprop));
    }

    #[test]
    fn test_resolve_targets() {
        let targets = resolve_targets(["magiskboot", "magisk"]).unwrap();
        assert_eq!(targets, set(&[Target::Magisk, Target::MagiskBoot]));

        assert!(matches!(
            resolve_targets(["magisk", "busybox"]),
            Err(ConfigError::UnknownTarget { .. })
        ));

        let tokens: [&str; 0] = [];
        assert_eq!(
            resolve_targets(tokens).unwrap_err(),
            ConfigError::EmptyTargetSet
        );
    }
}

//! Build context: the request, its expansion, tool locations and paths.

use std::path::PathBuf;

use crate::builder::toolchain::Toolchains;
use crate::core::artifact::OutputLayout;
use crate::core::request::BuildRequest;
use crate::core::target::{ExpandedTargets, TargetRegistry};
use crate::util::config::BuildConfig;
use crate::util::context::GlobalContext;

/// Everything a driver needs to produce its commands. Immutable once built.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The validated request
    pub request: BuildRequest,

    /// Requested targets plus implicit dependencies
    pub expanded: ExpandedTargets,

    /// Normalized `native/out` tree
    pub layout: OutputLayout,

    /// `native/`
    pub native_dir: PathBuf,

    /// `native/src/`
    pub native_src_dir: PathBuf,

    /// `native/libs/`
    pub ndk_libs_dir: PathBuf,

    /// Detected tools
    pub toolchains: Toolchains,

    /// Product version settings
    pub config: BuildConfig,

    /// Parallel job hint for `ndk-build`
    pub jobs: usize,
}

impl BuildContext {
    pub fn new(
        gctx: &GlobalContext,
        request: BuildRequest,
        toolchains: Toolchains,
        config: BuildConfig,
    ) -> Self {
        let expanded = TargetRegistry::global().expand(request.targets());

        BuildContext {
            request,
            expanded,
            layout: gctx.output_layout(),
            native_dir: gctx.native_dir(),
            native_src_dir: gctx.native_src_dir(),
            ndk_libs_dir: gctx.ndk_libs_dir(),
            toolchains,
            config,
            jobs: default_jobs(),
        }
    }

    /// Override the job count; `None` keeps the CPU-derived default.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        if let Some(jobs) = jobs.filter(|j| *j > 0) {
            self.jobs = jobs;
        }
        self
    }

    pub fn verbosity(&self) -> u8 {
        self.request.verbosity()
    }

    /// Child stdout is discarded at verbosity 0.
    pub fn quiet_children(&self) -> bool {
        self.verbosity() == 0
    }
}

/// Available CPU parallelism, 1 if unknown.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

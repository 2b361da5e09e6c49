//! Implementation of `magisk-build native`.
//!
//! The pipeline is computed up front as a [`BuildPlan`]: every command it
//! will run, in order, plus the staging passes between them. Executing the
//! plan is a strict walk of its steps. The first failure aborts the run and
//! nothing is cleaned up.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;

use crate::builder::post::PostOutcome;
use crate::builder::{
    run_toolchain, BuildContext, CargoBuilder, FlagsHeader, NdkBuilder, PostProcessor, Stager,
};
use crate::core::abi::abi_list;
use crate::core::artifact::Artifact;
use crate::core::request::BuildRequest;
use crate::core::target::{ExpandedTargets, NdkPhase, Target};
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::{format_duration, Shell, Status};

/// One step of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PlanStep {
    /// Write `flags.h` and `flags.rs`.
    WriteFlags { dir: PathBuf },

    /// `cargo build` for one target, all ABIs.
    Cargo { target: Target, command: ProcessBuilder },

    /// The Rust phase cannot run because cargo was not found.
    SkipCargo { targets: Vec<Target> },

    /// Move cargo's static libraries into the ABI directories.
    StageRust { targets: Vec<Target> },

    /// One `ndk-build` phase.
    NdkBuild { phase: NdkPhase, command: ProcessBuilder },

    /// Move `ndk-build`'s outputs into the ABI directories.
    StageNdk { phase: NdkPhase },

    /// ELF cleaner over whichever of these exist at that point.
    PostProcess { candidates: Vec<PathBuf> },
}

impl PlanStep {
    /// The pipeline state this step belongs to.
    pub fn state(&self) -> PipelineState {
        match self {
            PlanStep::WriteFlags { .. } => PipelineState::WriteFlags,
            PlanStep::Cargo { .. } | PlanStep::SkipCargo { .. } => PipelineState::RustDriver,
            PlanStep::StageRust { .. } => PipelineState::StageRust,
            PlanStep::NdkBuild { phase, .. } => PipelineState::NdkDriver(*phase),
            PlanStep::StageNdk { phase } => PipelineState::StageNdk(*phase),
            PlanStep::PostProcess { .. } => PipelineState::PostProcess,
        }
    }
}

/// Where a pipeline run is. `Done` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Resolve,
    WriteFlags,
    RustDriver,
    StageRust,
    NdkDriver(NdkPhase),
    StageNdk(NdkPhase),
    PostProcess,
    Done,
    Aborted,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Aborted)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::NdkDriver(phase) => write!(f, "NdkDriver({:?})", phase),
            PipelineState::StageNdk(phase) => write!(f, "StageNdk({:?})", phase),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Everything a run will do, in order.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub request: BuildRequest,
    pub expanded: ExpandedTargets,
    pub jobs: usize,
    pub steps: Vec<PlanStep>,
}

impl BuildPlan {
    pub fn new(ctx: &BuildContext) -> Self {
        let mut steps = vec![PlanStep::WriteFlags {
            dir: ctx.layout.generated_dir(),
        }];

        let cargo = CargoBuilder::new(ctx);
        let rust_targets = cargo.targets();
        if !rust_targets.is_empty() {
            match &ctx.toolchains.cargo {
                Some(path) => {
                    steps.extend(rust_targets.iter().map(|t| PlanStep::Cargo {
                        target: *t,
                        command: cargo.command(path, *t),
                    }));
                    steps.push(PlanStep::StageRust {
                        targets: rust_targets,
                    });
                }
                None => steps.push(PlanStep::SkipCargo {
                    targets: rust_targets,
                }),
            }
        }

        let ndk = NdkBuilder::new(ctx);
        for phase in NdkPhase::ALL {
            if let Some(command) = ndk.command(phase) {
                steps.push(PlanStep::NdkBuild { phase, command });
                steps.push(PlanStep::StageNdk { phase });
            }
        }

        let post = PostProcessor::new(ctx);
        if post.wants_run() {
            steps.push(PlanStep::PostProcess {
                candidates: post.candidates(),
            });
        }

        BuildPlan {
            request: ctx.request.clone(),
            expanded: ctx.expanded.clone(),
            jobs: ctx.jobs,
            steps,
        }
    }

    /// Every command the plan runs, in order. The post-processor is not
    /// listed: its arguments depend on what the builds produced.
    pub fn commands(&self) -> Vec<&ProcessBuilder> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                PlanStep::Cargo { command, .. } | PlanStep::NdkBuild { command, .. } => {
                    Some(command)
                }
                _ => None,
            })
            .collect()
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct BuildReport {
    /// Artifacts staged into the output layout, in staging order.
    pub artifacts: Vec<Artifact>,
    pub flags_written: bool,
    pub post: PostOutcome,
    pub elapsed: Duration,
}

/// A single run of the pipeline.
pub struct Pipeline<'a> {
    ctx: &'a BuildContext,
    plan: BuildPlan,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        Pipeline {
            ctx,
            plan: BuildPlan::new(ctx),
            state: PipelineState::Resolve,
        }
    }

    pub fn plan(&self) -> &BuildPlan {
        &self.plan
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Walk the plan. On error the pipeline is left `Aborted`.
    pub fn run(&mut self, runner: &dyn CommandRunner, shell: &Shell) -> Result<BuildReport> {
        let start = Instant::now();
        let mut report = BuildReport {
            artifacts: Vec::new(),
            flags_written: false,
            post: PostOutcome::NotRequested,
            elapsed: Duration::ZERO,
        };

        shell.status(
            Status::Building,
            format!(
                "{} for {}",
                self.plan.expanded,
                abi_list(self.plan.request.abis())
            ),
        );

        let steps = self.plan.steps.clone();
        for step in &steps {
            self.transition(step.state());
            if let Err(e) = self.run_step(step, runner, shell, &mut report) {
                self.transition(PipelineState::Aborted);
                return Err(e);
            }
        }
        self.transition(PipelineState::Done);

        report.elapsed = start.elapsed();
        shell.status(
            Status::Finished,
            format!(
                "{} build of {} target(s) in {}",
                self.ctx.request.profile().dir_name(),
                self.plan.expanded.len(),
                format_duration(report.elapsed)
            ),
        );
        Ok(report)
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state != next {
            tracing::debug!("pipeline: {} -> {}", self.state, next);
            if next == PipelineState::Aborted {
                tracing::error!("pipeline aborted during {}", self.state);
            }
            self.state = next;
        }
    }

    fn run_step(
        &self,
        step: &PlanStep,
        runner: &dyn CommandRunner,
        shell: &Shell,
        report: &mut BuildReport,
    ) -> Result<()> {
        let ctx = self.ctx;
        match step {
            PlanStep::WriteFlags { dir } => {
                let flags = FlagsHeader::from_config(&ctx.config, ctx.request.profile());
                report.flags_written = flags.write(dir)?;
                if report.flags_written {
                    shell.status(Status::Generated, dir.display());
                }
            }
            PlanStep::Cargo { target, command } => {
                tracing::info!("cargo build -p {}", target);
                run_toolchain(runner, &format!("cargo ({})", target), command)?;
            }
            PlanStep::SkipCargo { targets } => {
                let names: Vec<_> = targets.iter().map(|t| t.name()).collect();
                tracing::warn!("cargo not found, skipping Rust build of {}", names.join(" "));
                shell.status(Status::Skipped, "Rust libraries (cargo not found)");
            }
            PlanStep::StageRust { targets } => {
                let staged = Stager::new(ctx).stage_rust(targets)?;
                self.report_staged(shell, &staged);
                report.artifacts.extend(staged);
            }
            PlanStep::NdkBuild { phase, command } => {
                tracing::info!("ndk-build {:?} phase", phase);
                run_toolchain(runner, &format!("ndk-build ({:?})", phase), command)?;
            }
            PlanStep::StageNdk { .. } => {
                let staged = Stager::new(ctx).stage_ndk()?;
                self.report_staged(shell, &staged);
                report.artifacts.extend(staged);
            }
            PlanStep::PostProcess { .. } => {
                report.post = PostProcessor::new(ctx).run(runner)?;
                if let PostOutcome::Skipped(reason) = &report.post {
                    shell.status(Status::Skipped, format!("elf-cleaner ({})", reason));
                }
            }
        }
        Ok(())
    }

    fn report_staged(&self, shell: &Shell, staged: &[Artifact]) {
        for artifact in staged {
            tracing::debug!("staged {} ({})", artifact.path.display(), artifact.toolchain);
        }
        if !staged.is_empty() && shell.is_verbose() {
            shell.status(Status::Staged, format!("{} artifact(s)", staged.len()));
        }
    }
}

/// Plan and run the native build.
pub fn build_native(
    ctx: &BuildContext,
    runner: &dyn CommandRunner,
    shell: &Shell,
) -> Result<BuildReport> {
    Pipeline::new(ctx).run(runner, shell)
}

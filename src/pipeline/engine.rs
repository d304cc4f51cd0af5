use tracing::{debug, error, info};

use crate::{
    config::PipelineConfig,
    error::{PipelineError, Result, StageError},
    pipeline::report::{RunReport, RunStats},
    stages::{Stage, StageResult},
    workspace::WorkspaceLayout,
};

/// Strictly ordered run states; `Failed` is reachable from any stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Init,
    WorkspaceReady,
    Curated,
    Styled,
    Rendered,
    Reported,
    Failed,
}

impl PipelineState {
    /// The state that follows on a successful stage completion
    pub fn next(self) -> Self {
        match self {
            Self::Init => Self::WorkspaceReady,
            Self::WorkspaceReady => Self::Curated,
            Self::Curated => Self::Styled,
            Self::Styled => Self::Rendered,
            Self::Rendered => Self::Reported,
            Self::Reported => Self::Reported,
            Self::Failed => Self::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Reported | Self::Failed)
    }
}

/// Sequences the stage adapters and owns all cross-stage state
///
/// The engine advances through `Init -> WorkspaceReady -> Curated -> Styled
/// -> Rendered -> Reported`; any stage error transitions straight to
/// `Failed`, skipping the remaining stages. Workspace teardown runs exactly
/// once per execution regardless of outcome, and teardown problems are
/// reported as warnings, never as the run's result.
pub struct PipelineEngine {
    config: PipelineConfig,
    curation: Box<dyn Stage>,
    styling: Box<dyn Stage>,
    render: Box<dyn Stage>,
}

impl PipelineEngine {
    /// Create an engine from a validated-on-run config and the three stage
    /// adapters (the render adapter matching the configured mode)
    pub fn new(
        config: PipelineConfig,
        curation: Box<dyn Stage>,
        styling: Box<dyn Stage>,
        render: Box<dyn Stage>,
    ) -> Self {
        Self {
            config,
            curation,
            styling,
            render,
        }
    }

    /// Execute the complete pipeline and return the terminal report
    pub async fn run(self) -> Result<RunReport> {
        // Configuration problems are rejected before any stage runs,
        // including before workspace setup
        self.config.validate()?;

        info!("Starting pipeline in {} mode", self.config.mode.name());
        info!("   Source: {:?}", self.config.source_dir);
        info!("   Output: {:?}", self.config.output_video);

        let layout = WorkspaceLayout::new(&self.config.work_dir);
        layout.setup()?;
        debug!("State: {:?} -> {:?}", PipelineState::Init, PipelineState::WorkspaceReady);

        let mut stats = RunStats::new();
        let outcome = self.execute_stages(&layout, &mut stats).await;

        // Teardown is unconditional and happens exactly once; its failures
        // never mask the pipeline's true outcome
        layout.teardown(self.config.cleanup);

        match outcome {
            Ok(()) => {
                let report = stats.finish(Some(self.config.output_video.clone()));
                for line in report.summary().lines() {
                    info!("{line}");
                }
                Ok(report)
            }
            Err(PipelineError::Stage(stage_error)) => {
                error!(
                    "Pipeline failed in {} stage: {}",
                    stage_error.stage(),
                    stage_error
                );
                debug!("State: -> {:?}", PipelineState::Failed);
                Err(PipelineError::Stage(stage_error))
            }
            Err(other) => {
                error!("Pipeline failed: {other}");
                Err(other)
            }
        }
    }

    async fn execute_stages(
        &self,
        layout: &WorkspaceLayout,
        stats: &mut RunStats,
    ) -> Result<()> {
        let mut state = PipelineState::WorkspaceReady;

        info!("Stage 1: curation");
        let curated = self
            .curation
            .run(&self.config.source_dir, &layout.curated_dir)
            .await?;
        ensure_nonempty(&*self.curation, &curated)?;
        stats.raw_count = curated.items_in;
        stats.curated_count = curated.items_out;
        state = advance(state);

        info!("Stage 2: styling");
        let styled = self
            .styling
            .run(&layout.curated_dir, &layout.styled_dir)
            .await?;
        ensure_nonempty(&*self.styling, &styled)?;
        stats.styled_count = styled.items_out;
        state = advance(state);

        info!("Stage 3: render ({})", self.render.name());
        let rendered = self
            .render
            .run(&layout.styled_dir, &layout.output_dir)
            .await?;
        ensure_nonempty(&*self.render, &rendered)?;
        stats.video_generated = true;
        state = advance(state);

        debug!("State: {:?} -> {:?}", state, state.next());
        Ok(())
    }
}

fn advance(state: PipelineState) -> PipelineState {
    let next = state.next();
    debug!("State: {:?} -> {:?}", state, next);
    next
}

/// Belt-and-suspenders guard: a stage that returns an empty result without
/// raising its own error still must not let the pipeline advance
fn ensure_nonempty(stage: &dyn Stage, result: &StageResult) -> std::result::Result<(), StageError> {
    if result.items_out == 0 {
        return Err(StageError::EmptyResult {
            stage: stage.name(),
            reason: "stage reported an empty result".to_string(),
        });
    }
    Ok(())
}

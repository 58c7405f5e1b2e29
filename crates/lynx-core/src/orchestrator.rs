use lynx_ingest::DataSource;
use lynx_load::DataLoader;
use lynx_model::{PIPELINE_ERROR_KEY, PipelineState, PipelineStatus};
use lynx_transform::DataTransformer;
use tracing::{Span, error, info, info_span};

use crate::error::PipelineError;

const DEFAULT_NAME: &str = "pipeline";

/// Runs source → transform → load, one batch at a time, in source order.
///
/// Holds the state of exactly one run. A second [`run`](Self::run) fails with
/// [`PipelineError::AlreadyRun`] until [`reset`](Self::reset) is called.
pub struct PipelineOrchestrator {
    source: Box<dyn DataSource>,
    transformer: Box<dyn DataTransformer>,
    loader: Box<dyn DataLoader>,
    state: PipelineState,
    name: String,
    span: Span,
}

impl PipelineOrchestrator {
    pub fn new(
        source: Box<dyn DataSource>,
        transformer: Box<dyn DataTransformer>,
        loader: Box<dyn DataLoader>,
    ) -> Self {
        Self {
            source,
            transformer,
            loader,
            state: PipelineState::new(),
            name: DEFAULT_NAME.to_string(),
            span: info_span!("pipeline", name = DEFAULT_NAME),
        }
    }

    /// Name carried by every event of the run.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.span = info_span!("pipeline", name = %self.name);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Forget the previous run. Sources are single-use, so rerunning the
    /// same source fails at extraction.
    pub fn reset(&mut self) {
        self.state = PipelineState::new();
    }

    /// Run the pipeline, returning the number of records loaded.
    ///
    /// On failure the state ends `failed` with the message stored under
    /// `pipeline_error`, and the same error is returned.
    pub fn run(&mut self) -> Result<usize, PipelineError> {
        if self.state.status != PipelineStatus::Initialized {
            return Err(PipelineError::AlreadyRun {
                status: self.state.status,
            });
        }
        let span = self.span.clone();
        let _guard = span.enter();

        self.state.transition(PipelineStatus::Running)?;
        info!(
            source = %self.source.describe(),
            transformer = %self.transformer.describe(),
            loader = %self.loader.describe(),
            "pipeline started"
        );

        match self.process_batches() {
            Ok(()) => {
                self.state.transition(PipelineStatus::Completed)?;
                info!(
                    records = self.state.records_processed,
                    duration_ms = self.duration_ms(),
                    "pipeline completed"
                );
                Ok(self.state.records_processed)
            }
            Err(err) => {
                self.state.record_error(PIPELINE_ERROR_KEY, err.to_string());
                self.state.transition(PipelineStatus::Failed)?;
                error!(
                    records = self.state.records_processed,
                    duration_ms = self.duration_ms(),
                    error = %err,
                    "pipeline failed"
                );
                Err(err)
            }
        }
    }

    fn process_batches(&mut self) -> Result<(), PipelineError> {
        let Self {
            source,
            transformer,
            loader,
            state,
            ..
        } = self;
        for (index, batch) in source.extract().enumerate() {
            let batch = batch?;
            let transformed = transformer.transform(&batch)?;
            let summary = loader.load(&transformed)?;
            state.records_processed += summary.rows;
            info!(
                batch = index,
                rows = summary.rows,
                chunks = summary.chunks.len(),
                "batch processed"
            );
        }
        Ok(())
    }

    fn duration_ms(&self) -> i64 {
        self.state
            .duration()
            .map_or(0, |duration| duration.num_milliseconds())
    }
}

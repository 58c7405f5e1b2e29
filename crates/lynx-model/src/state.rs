//! Run state owned by the pipeline orchestrator.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Key under which an aborted run stores its failure message.
pub const PIPELINE_ERROR_KEY: &str = "pipeline_error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    #[default]
    Initialized,
    Running,
    Completed,
    Failed,
    /// Representable for external controllers; no transition leads here.
    Paused,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Initialized => "initialized",
            PipelineStatus::Running => "running",
            PipelineStatus::Completed => "completed",
            PipelineStatus::Failed => "failed",
            PipelineStatus::Paused => "paused",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStatus::Completed | PipelineStatus::Failed)
    }

    pub fn can_transition_to(&self, next: PipelineStatus) -> bool {
        matches!(
            (self, next),
            (PipelineStatus::Initialized, PipelineStatus::Running)
                | (PipelineStatus::Running, PipelineStatus::Completed)
                | (PipelineStatus::Running, PipelineStatus::Failed)
        )
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress and outcome of a single pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub status: PipelineStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub records_processed: usize,
    pub errors: BTreeMap<String, String>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to `next`, stamping start/end times.
    ///
    /// Entering `running` records the start time; entering a terminal status
    /// records the end time.
    pub fn transition(&mut self, next: PipelineStatus) -> Result<(), ModelError> {
        if !self.status.can_transition_to(next) {
            return Err(ModelError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        let now = Utc::now();
        if next == PipelineStatus::Running {
            self.start_time = Some(now);
        }
        if next.is_terminal() {
            self.end_time = Some(now);
        }
        self.status = next;
        Ok(())
    }

    pub fn record_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(key.into(), message.into());
    }

    /// Elapsed time between start and end, when both are known.
    pub fn duration(&self) -> Option<TimeDelta> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

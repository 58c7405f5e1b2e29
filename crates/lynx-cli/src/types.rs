use std::path::PathBuf;

use lynx_model::{PipelineState, PipelineStatus};
use lynx_validate::ValidationErrors;
use serde::Serialize;

/// Result of `lynx run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub name: String,
    pub dry_run: bool,
    #[serde(flatten)]
    pub state: PipelineState,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.state.status == PipelineStatus::Completed
    }
}

/// Inputs of `lynx validate`.
#[derive(Debug, Clone)]
pub struct ValidateRequest {
    pub schema: PathBuf,
    pub metatype: String,
    pub csv: PathBuf,
    pub delimiter: u8,
    pub batch_size: usize,
    /// Also report columns the metatype does not declare.
    pub strict: bool,
}

/// Result of `lynx validate`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateOutcome {
    pub metatype: String,
    pub rows: usize,
    pub batches: usize,
    pub errors: ValidationErrors,
}

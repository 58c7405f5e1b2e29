use thiserror::Error;

use crate::state::PipelineStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown target type: {0}")]
    UnknownTargetType(String),
    #[error("invalid pipeline transition: {from} -> {to}")]
    InvalidTransition {
        from: PipelineStatus,
        to: PipelineStatus,
    },
}

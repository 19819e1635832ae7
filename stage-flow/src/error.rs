use thiserror::Error;

use crate::stage::StageStatus;

/// Errors produced while building or executing a pipeline
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Task execution failed: {0}")]
    TaskExecutionFailed(String),

    #[error("Context error: {0}")]
    ContextError(String),

    #[error("Task {task_id} timed out after {timeout_ms}ms")]
    Timeout { task_id: String, timeout_ms: u64 },

    #[error("Stage {stage_id} failed: {source}")]
    StageFailed {
        stage_id: String,
        #[source]
        source: Box<FlowError>,
    },

    #[error("Stage {stage_id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        stage_id: String,
        from: StageStatus,
        to: StageStatus,
    },
}

impl FlowError {
    /// Innermost cause, looking through `StageFailed` wrappers.
    pub fn root_cause(&self) -> &FlowError {
        match self {
            FlowError::StageFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Id of the stage that aborted the run, if this error came out of a pipeline.
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            FlowError::StageFailed { stage_id, .. } => Some(stage_id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;

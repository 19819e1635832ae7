use stage_flow::FlowError;
use thiserror::Error;

use crate::stages::StageId;

/// Failure reported by a [`crate::reasoning::ReasoningClient`]
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReasoningError {
    #[error("reasoning call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("reasoning transport failed: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("stage {stage} timed out after {timeout_ms}ms")]
    StageTimeout { stage: StageId, timeout_ms: u64 },

    #[error("stage {stage} failed: {message}")]
    StageInvocation { stage: StageId, message: String },

    #[error("pipeline error: {0}")]
    Flow(#[from] FlowError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("reference data error: {0}")]
    Reference(String),
}

impl AnalysisError {
    /// The stage that aborted the run, if the failure came from one.
    pub fn stage(&self) -> Option<StageId> {
        match self {
            AnalysisError::StageTimeout { stage, .. }
            | AnalysisError::StageInvocation { stage, .. } => Some(*stage),
            AnalysisError::Flow(e) => e.failed_stage().and_then(|s| s.parse().ok()),
            _ => None,
        }
    }

    /// Turn a pipeline error into the stage-level error it stands for.
    pub(crate) fn from_flow(error: FlowError) -> Self {
        let Some(stage) = error.failed_stage().and_then(|s| s.parse::<StageId>().ok()) else {
            return AnalysisError::Flow(error);
        };

        match error.root_cause() {
            FlowError::Timeout { timeout_ms, .. } => AnalysisError::StageTimeout {
                stage,
                timeout_ms: *timeout_ms,
            },
            cause => AnalysisError::StageInvocation {
                stage,
                message: cause.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_failures_keep_stage_and_cause() {
        let flow = FlowError::StageFailed {
            stage_id: "differential_generation".to_string(),
            source: Box::new(FlowError::TaskExecutionFailed("connection reset".to_string())),
        };
        let err = AnalysisError::from_flow(flow);

        assert_eq!(err.stage(), Some(StageId::DifferentialGeneration));
        match err {
            AnalysisError::StageInvocation { message, .. } => {
                assert!(message.contains("connection reset"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn timeouts_map_to_stage_timeout() {
        let flow = FlowError::StageFailed {
            stage_id: "intake_analysis".to_string(),
            source: Box::new(FlowError::Timeout {
                task_id: "intake_analysis".to_string(),
                timeout_ms: 180_000,
            }),
        };
        assert!(matches!(
            AnalysisError::from_flow(flow),
            AnalysisError::StageTimeout {
                stage: StageId::IntakeAnalysis,
                timeout_ms: 180_000
            }
        ));
    }

    #[test]
    fn errors_outside_a_stage_stay_flow_errors() {
        let err = AnalysisError::from_flow(FlowError::ContextError("bad".to_string()));
        assert!(matches!(err, AnalysisError::Flow(_)));
        assert_eq!(err.stage(), None);
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{context::Context, error::Result};

/// Output produced by one stage: narrative text plus optional structured payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl TaskOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raw: None,
        }
    }

    pub fn with_raw(text: impl Into<String>, raw: Option<Value>) -> Self {
        Self {
            text: text.into(),
            raw,
        }
    }
}

/// Output of a completed stage as seen by later stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedStage {
    pub stage_id: String,
    pub output: TaskOutput,
}

/// Result of a task execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub output: TaskOutput,
    /// Short human-readable note about what the task did
    pub status_message: Option<String>,
}

impl TaskResult {
    pub fn new(output: TaskOutput) -> Self {
        Self {
            output,
            status_message: None,
        }
    }

    pub fn new_with_status(output: TaskOutput, status_message: Option<String>) -> Self {
        Self {
            output,
            status_message,
        }
    }
}

/// Core trait that all pipeline stages must implement
#[async_trait]
pub trait Task: Send + Sync {
    /// Unique identifier for this task
    fn id(&self) -> &str;

    /// Execute the task with the given context
    async fn run(&self, context: Context) -> Result<TaskResult>;
}

use async_trait::async_trait;
use serde_json::{Value, json};
use stage_flow::{Context, FlowError, Result, Task, TaskOutput, TaskResult};
use std::sync::Arc;
use tracing::{error, info};

use super::keys;
use crate::error::ReasoningError;
use crate::models::AnalysisOptions;
use crate::reasoning::ReasoningClient;
use crate::stages::StageId;

/// One reasoning stage: sends the transcript and every earlier stage output to the
/// reasoning service and records its reply.
pub struct ReasoningStageTask {
    stage: StageId,
    client: Arc<dyn ReasoningClient>,
}

impl ReasoningStageTask {
    pub fn new(stage: StageId, client: Arc<dyn ReasoningClient>) -> Self {
        Self { stage, client }
    }

    async fn payload(&self, context: &Context) -> Result<Value> {
        let transcript: String = context
            .get(keys::TRANSCRIPT)
            .await
            .ok_or_else(|| FlowError::ContextError("Transcript not found in context".to_string()))?;
        let options: AnalysisOptions = context.get(keys::OPTIONS).await.unwrap_or_default();

        let previous_stages: Vec<Value> = context
            .completed_stages()
            .into_iter()
            .map(|done| {
                json!({
                    "stage": done.stage_id,
                    "text": done.output.text,
                    "raw": done.output.raw,
                })
            })
            .collect();

        Ok(json!({
            "session_id": context.session_id(),
            "stage": self.stage,
            "transcript": transcript,
            "patient_context": context.get_value(keys::PATIENT_CONTEXT).unwrap_or(Value::Null),
            "analysis_depth": options.analysis_depth,
            "focus_areas": options.focus_areas,
            "previous_stages": previous_stages,
        }))
    }
}

#[async_trait]
impl Task for ReasoningStageTask {
    fn id(&self) -> &str {
        self.stage.as_str()
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let payload = self.payload(&context).await?;
        let timeout_ms = context
            .stage_timeout_ms()
            .unwrap_or_else(|| self.stage.default_timeout().as_millis() as u64);

        info!(stage = %self.stage, timeout_ms, "Invoking reasoning service");

        let reply = self
            .client
            .invoke(self.stage, &payload, timeout_ms)
            .await
            .map_err(|e| {
                error!(stage = %self.stage, "Reasoning service failed: {}", e);
                match e {
                    ReasoningError::Timeout { timeout_ms } => FlowError::Timeout {
                        task_id: self.stage.as_str().to_string(),
                        timeout_ms,
                    },
                    ReasoningError::Transport(cause) => FlowError::TaskExecutionFailed(cause),
                }
            })?;

        let status = format!(
            "{} produced {} characters{}",
            self.stage.name(),
            reply.text.len(),
            if reply.raw.is_some() { " with structured data" } else { "" }
        );

        Ok(TaskResult::new_with_status(
            TaskOutput::with_raw(reply.text, reply.raw),
            Some(status),
        ))
    }
}

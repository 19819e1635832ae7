#![allow(dead_code)]

use async_trait::async_trait;
use clinical_analysis_service::{
    ClinicalReasoningPipeline, PipelineConfig, ReasoningClient, ReasoningError, StageId,
    StageReply,
};
use serde_json::Value;
use stage_flow::{ManualClock, SequentialIdGenerator};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Reasoning client that answers from a script instead of a model.
///
/// Unscripted stages echo the transcript back, so the narrative only contains what the
/// test put in the transcript.
#[derive(Default)]
pub struct ScriptedClient {
    replies: HashMap<StageId, StageReply>,
    failures: HashMap<StageId, ReasoningError>,
    delays: HashMap<StageId, Duration>,
    clock: Option<(Arc<ManualClock>, chrono::Duration)>,
    calls: Mutex<Vec<(StageId, Value)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, stage: StageId, text: &str, raw: Option<Value>) -> Self {
        self.replies.insert(
            stage,
            StageReply {
                text: text.to_string(),
                raw,
            },
        );
        self
    }

    pub fn fail(mut self, stage: StageId, error: ReasoningError) -> Self {
        self.failures.insert(stage, error);
        self
    }

    pub fn delay(mut self, stage: StageId, delay: Duration) -> Self {
        self.delays.insert(stage, delay);
        self
    }

    /// Move `clock` forward by `step` on every call.
    pub fn advancing(mut self, clock: Arc<ManualClock>, step: chrono::Duration) -> Self {
        self.clock = Some((clock, step));
        self
    }

    pub fn calls(&self) -> Vec<(StageId, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningClient for ScriptedClient {
    async fn invoke(
        &self,
        stage: StageId,
        payload: &Value,
        _timeout_ms: u64,
    ) -> Result<StageReply, ReasoningError> {
        self.calls.lock().unwrap().push((stage, payload.clone()));

        if let Some((clock, step)) = &self.clock {
            clock.advance(*step);
        }
        if let Some(delay) = self.delays.get(&stage) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(error) = self.failures.get(&stage) {
            return Err(error.clone());
        }
        if let Some(reply) = self.replies.get(&stage) {
            return Ok(reply.clone());
        }

        let transcript = payload["transcript"].as_str().unwrap_or_default();
        Ok(StageReply::text(format!("{} reviewed: {}", stage, transcript)))
    }
}

pub fn pipeline(client: Arc<ScriptedClient>) -> ClinicalReasoningPipeline {
    pipeline_with(client, &PipelineConfig::default())
}

pub fn pipeline_with(client: Arc<ScriptedClient>, config: &PipelineConfig) -> ClinicalReasoningPipeline {
    ClinicalReasoningPipeline::new(client, config)
        .unwrap()
        .with_id_generator(Arc::new(SequentialIdGenerator::new("cra")))
}

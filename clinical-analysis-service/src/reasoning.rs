use async_trait::async_trait;
use rig::completion::Prompt;
use rig::{agent::Agent, client::CompletionClient, providers::openrouter};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::ReasoningError;
use crate::prompts;
use crate::stages::StageId;

/// Reply of the external reasoning service for one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReply {
    pub text: String,
    /// Structured payload, when the service produced one
    pub raw: Option<Value>,
}

impl StageReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raw: None,
        }
    }
}

/// Contract with the external reasoning service.
///
/// Implementations enforce `timeout_ms` themselves and report it as [`ReasoningError::Timeout`].
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn invoke(
        &self,
        stage: StageId,
        payload: &Value,
        timeout_ms: u64,
    ) -> Result<StageReply, ReasoningError>;
}

/// OpenRouter-backed client, one agent per stage call.
pub struct RigReasoningClient {
    client: openrouter::Client,
    model: String,
}

impl RigReasoningClient {
    pub fn new(api_key: &str, model: impl Into<String>) -> Self {
        Self {
            client: openrouter::Client::new(api_key),
            model: model.into(),
        }
    }

    fn agent(&self, stage: StageId) -> Agent<openrouter::CompletionModel> {
        self.client
            .agent(&self.model)
            .preamble(&prompts::preamble(stage))
            .build()
    }
}

#[async_trait]
impl ReasoningClient for RigReasoningClient {
    async fn invoke(
        &self,
        stage: StageId,
        payload: &Value,
        timeout_ms: u64,
    ) -> Result<StageReply, ReasoningError> {
        let agent = self.agent(stage);
        let prompt = prompts::user_prompt(stage, payload);
        debug!(stage = %stage, model = %self.model, prompt_chars = prompt.len(), "Prompting reasoning model");

        let call = async { agent.prompt(&prompt).await };
        let reply = tokio::time::timeout(Duration::from_millis(timeout_ms), call)
            .await
            .map_err(|_| ReasoningError::Timeout { timeout_ms })?
            .map_err(|e| {
                error!(stage = %stage, "Reasoning model call failed: {}", e);
                ReasoningError::Transport(e.to_string())
            })?;

        let raw = extract_json_object(&reply);
        Ok(StageReply { text: reply, raw })
    }
}

/// First balanced `{...}` in `text` that parses as a JSON object.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        let mut end = None;

        for (i, &b) in bytes.iter().enumerate().skip(start) {
            if in_string {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }

        let end = end?;
        if let Ok(value @ Value::Object(_)) = serde_json::from_str(&text[start..=end]) {
            return Some(value);
        }
        search_from = start + 1;
    }
    None
}

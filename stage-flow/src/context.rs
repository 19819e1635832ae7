use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{FlowError, Result};
use crate::task::CompletedStage;

/// Context keys written by the pipeline itself.
pub mod keys {
    /// Id of the session the context belongs to.
    pub const SESSION_ID: &str = "session_id";
    /// Timeout (ms) granted to the stage that is currently running.
    pub const STAGE_TIMEOUT_MS: &str = "stage_timeout_ms";
    /// Ordered outputs of every stage that has completed so far.
    pub const COMPLETED_STAGES: &str = "completed_stages";
}

/// Context for sharing data between the stages of one session
#[derive(Clone, Debug)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
        }
    }

    pub async fn set(&self, key: impl Into<String>, value: impl serde::Serialize) -> Result<()> {
        let key = key.into();
        let value = serde_json::to_value(value)
            .map_err(|e| FlowError::ContextError(format!("cannot serialize '{}': {}", key, e)))?;
        self.data.insert(key, value);
        Ok(())
    }

    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_sync(key)
    }

    pub fn get_sync<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Raw JSON stored under `key`, without deserializing.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.data.get(key).map(|v| v.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub async fn remove(&self, key: &str) -> Option<Value> {
        self.data.remove(key).map(|(_, v)| v)
    }

    /// Outputs of the stages that already completed, in execution order.
    pub fn completed_stages(&self) -> Vec<CompletedStage> {
        self.get_sync(keys::COMPLETED_STAGES).unwrap_or_default()
    }

    pub(crate) async fn push_completed_stage(&self, stage: CompletedStage) -> Result<()> {
        let mut stages = self.completed_stages();
        stages.push(stage);
        self.set(keys::COMPLETED_STAGES, stages).await
    }

    /// Timeout granted to the running stage, as set by the pipeline.
    pub fn stage_timeout_ms(&self) -> Option<u64> {
        self.get_sync(keys::STAGE_TIMEOUT_MS)
    }

    pub fn session_id(&self) -> Option<String> {
        self.get_sync(keys::SESSION_ID)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskOutput;

    #[tokio::test]
    async fn set_and_get_round_trip_typed_values() {
        let context = Context::new();
        context.set("age", 45u32).await.unwrap();
        context.set("name", "chest pain").await.unwrap();

        assert_eq!(context.get::<u32>("age").await, Some(45));
        assert_eq!(context.get_sync::<String>("name").as_deref(), Some("chest pain"));
        assert_eq!(context.get::<u32>("name").await, None);
        assert!(context.contains("age"));
    }

    #[tokio::test]
    async fn completed_stages_accumulate_in_order() {
        let context = Context::new();
        assert!(context.completed_stages().is_empty());

        for id in ["first", "second"] {
            context
                .push_completed_stage(CompletedStage {
                    stage_id: id.to_string(),
                    output: TaskOutput::text(format!("{} output", id)),
                })
                .await
                .unwrap();
        }

        let stages = context.completed_stages();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].stage_id, "first");
        assert_eq!(stages[1].output.text, "second output");
    }
}

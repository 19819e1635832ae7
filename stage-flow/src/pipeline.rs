use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::{
    clock::Clock,
    context::keys,
    error::{FlowError, Result},
    session::Session,
    stage::StageRecord,
    task::{CompletedStage, Task, TaskResult},
};

/// A stage slot: the task plus the metadata recorded for it on every session
#[derive(Clone)]
pub struct StageSpec {
    pub task: Arc<dyn Task>,
    pub name: String,
    pub description: String,
    pub timeout: Option<Duration>,
}

/// A fixed, ordered sequence of stages. Each stage sees the outputs of every
/// stage before it; the first failure aborts the run.
pub struct Pipeline {
    pub id: String,
    stages: Vec<StageSpec>,
}

impl Pipeline {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stages: Vec::new(),
        }
    }

    pub fn stage_ids(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.task.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Fresh `Pending` records, one per stage, in execution order.
    pub fn stage_records(&self) -> Vec<StageRecord> {
        self.stages
            .iter()
            .map(|s| StageRecord::pending(s.task.id(), s.name.clone(), s.description.clone()))
            .collect()
    }

    /// Run every stage of `session` in order.
    ///
    /// Stage `n + 1` starts only after stage `n` completed. On the first
    /// failure the stage is marked `Failed`, later stages stay `Pending`, and
    /// the error is returned wrapped in [`FlowError::StageFailed`].
    pub async fn execute_session(&self, session: &mut Session, clock: &dyn Clock) -> Result<()> {
        if session.stages.len() != self.stages.len() {
            return Err(FlowError::ContextError(format!(
                "session {} has {} stage records, pipeline {} has {} stages",
                session.id,
                session.stages.len(),
                self.id,
                self.stages.len()
            )));
        }

        for index in 0..self.stages.len() {
            let spec = &self.stages[index];
            let stage_id = spec.task.id().to_string();
            let timeout = self.effective_timeout(spec, session, clock);

            session.stages[index].begin(clock.now())?;
            info!(
                session_id = %session.id,
                stage = %stage_id,
                timeout_ms = ?timeout.map(|t| t.as_millis()),
                "Starting stage: {}", spec.name
            );

            let outcome = self.run_stage(spec, session, timeout).await;
            let record = &mut session.stages[index];

            match outcome {
                Ok(result) => {
                    record.complete(clock.now(), result.output.clone())?;
                    info!(
                        session_id = %session.id,
                        stage = %stage_id,
                        elapsed_ms = record.duration_ms().unwrap_or_default(),
                        status = ?result.status_message,
                        "Completed stage: {}", spec.name
                    );
                    session
                        .context
                        .push_completed_stage(CompletedStage {
                            stage_id,
                            output: result.output,
                        })
                        .await?;
                }
                Err(e) => {
                    record.fail(clock.now(), e.to_string())?;
                    error!(
                        session_id = %session.id,
                        stage = %stage_id,
                        "Stage failed: {}: {}", spec.name, e
                    );
                    return Err(FlowError::StageFailed {
                        stage_id,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(())
    }

    fn effective_timeout(
        &self,
        spec: &StageSpec,
        session: &Session,
        clock: &dyn Clock,
    ) -> Option<Duration> {
        match (spec.timeout, session.remaining_budget(clock.now())) {
            (Some(stage), Some(budget)) => Some(stage.min(budget)),
            (stage, budget) => stage.or(budget),
        }
    }

    async fn run_stage(
        &self,
        spec: &StageSpec,
        session: &Session,
        timeout: Option<Duration>,
    ) -> Result<TaskResult> {
        let context = session.context.clone();
        let Some(timeout) = timeout else {
            context.remove(keys::STAGE_TIMEOUT_MS).await;
            return spec.task.run(context).await;
        };

        let timeout_ms = timeout.as_millis() as u64;
        if timeout.is_zero() {
            return Err(FlowError::Timeout {
                task_id: spec.task.id().to_string(),
                timeout_ms,
            });
        }
        context.set(keys::STAGE_TIMEOUT_MS, timeout_ms).await?;

        tokio::time::timeout(timeout, spec.task.run(context))
            .await
            .map_err(|_| FlowError::Timeout {
                task_id: spec.task.id().to_string(),
                timeout_ms,
            })?
    }
}

/// Builder for creating pipelines
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            pipeline: Pipeline::new(id),
        }
    }

    pub fn add_stage(
        mut self,
        task: Arc<dyn Task>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.pipeline.stages.push(StageSpec {
            task,
            name: name.into(),
            description: description.into(),
            timeout: None,
        });
        self
    }

    /// Timeout for the most recently added stage.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if let Some(last) = self.pipeline.stages.last_mut() {
            last.timeout = Some(timeout);
        }
        self
    }

    pub fn build(self) -> Pipeline {
        self.pipeline
    }
}

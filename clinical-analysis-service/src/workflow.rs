use stage_flow::{
    Clock, Context, FlowRunner, Pipeline, PipelineBuilder, Session, SessionIdGenerator,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::compiler::ResultCompiler;
use crate::config::{PipelineConfig, StageTimeouts};
use crate::error::{AnalysisError, Result};
use crate::extraction::{Corpus, ExtractionEngine, PhraseMatcher};
use crate::models::{AnalysisOptions, AnalysisResult, PatientContext};
use crate::reasoning::ReasoningClient;
use crate::reference::ReferenceData;
use crate::stages::StageId;
use crate::tasks::{ReasoningStageTask, keys};

pub const WORKFLOW_ID: &str = "clinical_reasoning";

/// The seven reasoning stages in order, each with its configured timeout.
pub fn build_clinical_workflow(
    client: Arc<dyn ReasoningClient>,
    timeouts: &StageTimeouts,
) -> Pipeline {
    StageId::ALL
        .into_iter()
        .fold(PipelineBuilder::new(WORKFLOW_ID), |builder, stage| {
            builder
                .add_stage(
                    Arc::new(ReasoningStageTask::new(stage, client.clone())),
                    stage.name(),
                    stage.description(),
                )
                .with_timeout(timeouts.get(stage))
        })
        .build()
}

/// Runs a transcript through the reasoning stages, extraction and compilation.
#[derive(Clone)]
pub struct ClinicalReasoningPipeline {
    runner: FlowRunner,
    engine: ExtractionEngine,
    compiler: ResultCompiler,
}

impl ClinicalReasoningPipeline {
    pub fn new(client: Arc<dyn ReasoningClient>, config: &PipelineConfig) -> Result<Self> {
        let reference = ReferenceData::load(config.reference_dir.as_deref())?;
        let pipeline = build_clinical_workflow(client, &config.timeouts);

        Ok(Self {
            runner: FlowRunner::new(Arc::new(pipeline)),
            engine: ExtractionEngine::new(Arc::new(reference)).with_windows(config.windows),
            compiler: ResultCompiler::new(config.model_version.clone()),
        })
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn SessionIdGenerator>) -> Self {
        self.runner = self.runner.with_id_generator(ids);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.runner = self.runner.with_clock(clock);
        self
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn PhraseMatcher>) -> Self {
        self.engine = self.engine.with_matcher(matcher);
        self
    }

    /// New session with every stage pending. Nothing is sent to the reasoning service yet.
    pub async fn start_session(
        &self,
        transcript: &str,
        patient_context: Option<PatientContext>,
        options: Option<AnalysisOptions>,
    ) -> Result<Session> {
        let options = options.unwrap_or_default();
        let budget = options
            .timeout_minutes
            .map(|minutes| Duration::from_secs(u64::from(minutes) * 60));

        let context = Context::new();
        context.set(keys::TRANSCRIPT, transcript).await?;
        if let Some(patient_context) = &patient_context {
            context.set(keys::PATIENT_CONTEXT, patient_context).await?;
        }
        context.set(keys::OPTIONS, &options).await?;

        let session = self.runner.start_session(context, budget).await?;
        info!(
            session_id = %session.id,
            transcript_chars = transcript.len(),
            depth = ?options.analysis_depth,
            budget_ms = ?session.budget_ms,
            "Started clinical reasoning session"
        );
        Ok(session)
    }

    /// Run every stage, then extract and compile. On a stage failure the session keeps
    /// the stage statuses and no result is produced.
    pub async fn execute(&self, session: &mut Session) -> Result<AnalysisResult> {
        self.runner
            .run(session)
            .await
            .map_err(AnalysisError::from_flow)?;

        let corpus = Corpus::from_stages(session.stages.iter().filter_map(|record| {
            let stage = record.id.parse::<StageId>().ok()?;
            let output = record.result.as_ref()?;
            Some((stage, output.text.as_str()))
        }));
        let entities = self.engine.extract(&corpus);

        let options: AnalysisOptions = session
            .context
            .get(keys::OPTIONS)
            .await
            .unwrap_or_default();
        let now = self.runner.clock().now();

        Ok(self
            .compiler
            .compile(session, entities, options.analysis_depth, now))
    }

    pub async fn run(
        &self,
        transcript: &str,
        patient_context: Option<PatientContext>,
        options: Option<AnalysisOptions>,
    ) -> Result<AnalysisResult> {
        let mut session = self
            .start_session(transcript, patient_context, options)
            .await?;
        self.execute(&mut session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReasoningError;
    use crate::reasoning::StageReply;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Echo;

    #[async_trait]
    impl ReasoningClient for Echo {
        async fn invoke(
            &self,
            stage: StageId,
            _payload: &Value,
            _timeout_ms: u64,
        ) -> std::result::Result<StageReply, ReasoningError> {
            Ok(StageReply::text(format!("{} complete", stage.name())))
        }
    }

    #[test]
    fn workflow_has_seven_stages_in_order() {
        let pipeline = build_clinical_workflow(Arc::new(Echo), &StageTimeouts::default());
        let expected: Vec<&str> = StageId::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(pipeline.stage_ids(), expected);
        assert_eq!(pipeline.id, WORKFLOW_ID);
    }

    #[tokio::test]
    async fn start_session_stores_inputs_and_budget() {
        let pipeline =
            ClinicalReasoningPipeline::new(Arc::new(Echo), &PipelineConfig::default()).unwrap();
        let options = AnalysisOptions {
            timeout_minutes: Some(2),
            ..Default::default()
        };
        let session = pipeline
            .start_session("cough for 3 days", None, Some(options))
            .await
            .unwrap();

        assert_eq!(session.budget_ms, Some(120_000));
        assert_eq!(session.stages.len(), 7);
        assert_eq!(
            session.context.get::<String>(keys::TRANSCRIPT).await.as_deref(),
            Some("cough for 3 days")
        );
        assert!(!session.context.contains(keys::PATIENT_CONTEXT));
    }
}

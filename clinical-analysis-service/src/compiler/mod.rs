//! Assembles stage records and extracted entities into one [`AnalysisResult`].
//!
//! Compilation never fails. Missing stage output is replaced by defaults and the result is
//! marked [`CompletionStatus::Partial`].

pub mod legacy;
pub mod quality;
pub mod summary;
pub mod trace;

use chrono::{DateTime, Utc};
use stage_flow::{Session, StageRecord};
use tracing::{info, warn};
use uuid::Uuid;

pub use legacy::LegacyAnalysis;

use crate::extraction::ExtractedEntities;
use crate::models::{AnalysisDepth, AnalysisResult, CompletionStatus, QaSource};
use crate::stages::StageId;

pub(crate) fn stage_record(stages: &[StageRecord], stage: StageId) -> Option<&StageRecord> {
    stages.iter().find(|r| r.id == stage.as_str())
}

#[derive(Debug, Clone)]
pub struct ResultCompiler {
    model_version: String,
}

impl ResultCompiler {
    pub fn new(model_version: impl Into<String>) -> Self {
        Self {
            model_version: model_version.into(),
        }
    }

    pub fn compile(
        &self,
        session: &Session,
        entities: ExtractedEntities,
        depth: AnalysisDepth,
        now: DateTime<Utc>,
    ) -> AnalysisResult {
        let stages = &session.stages;
        let raw = |stage: StageId| {
            stage_record(stages, stage)
                .and_then(|r| r.result.as_ref())
                .and_then(|o| o.raw.as_ref())
        };

        let missing: Vec<StageId> = StageId::ALL
            .into_iter()
            .filter(|s| stage_record(stages, *s).is_none_or(|r| r.result.is_none()))
            .collect();
        let completion_status = if missing.is_empty() {
            CompletionStatus::Complete
        } else {
            warn!(
                session_id = %session.id,
                missing = ?missing,
                "Compiling with missing stage results, using defaults"
            );
            CompletionStatus::Partial
        };

        let quality_assurance = quality::quality_assurance(raw(StageId::ValidationQa));
        info!(
            session_id = %session.id,
            source = ?quality_assurance.source,
            overall_confidence = quality_assurance.overall_confidence,
            "Quality assurance resolved"
        );
        if quality_assurance.source == QaSource::Default {
            info!(session_id = %session.id, "Validation stage gave no structured QA, using baseline");
        }

        let executive_summary = summary::executive_summary(&entities);
        let result = AnalysisResult {
            id: format!("analysis_{}", Uuid::new_v4()),
            session_id: session.id.clone(),
            timestamp: now,
            processing_time_ms: (now - session.started_at).num_milliseconds().max(0),
            model_version: self.model_version.clone(),
            analysis_depth: depth,
            completion_status,
            stages: stages.clone(),
            symptoms: entities.symptoms,
            diagnoses: entities.diagnoses,
            treatments: entities.treatments,
            concerns: entities.concerns,
            evidence_sources: quality::evidence_sources(raw(StageId::EvidenceResearch)),
            quality_assurance,
            validation_checks: quality::validation_checks(raw(StageId::ValidationQa)),
            executive_summary,
            reasoning_trace: trace::reasoning_trace(stages),
            next_steps: trace::next_steps(stages),
            reasoning: trace::narrative(stages),
        };

        info!(
            session_id = %session.id,
            symptoms = result.symptoms.len(),
            diagnoses = result.diagnoses.len(),
            treatments = result.treatments.len(),
            concerns = result.concerns.len(),
            urgency = result.executive_summary.urgency_level.as_str(),
            processing_time_ms = result.processing_time_ms,
            "Analysis compiled"
        );
        result
    }
}

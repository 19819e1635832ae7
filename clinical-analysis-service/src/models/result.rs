use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stage_flow::StageRecord;

use super::entities::{
    ComprehensiveSymptom, Concern, ConfidenceBand, DifferentialDiagnosis, TreatmentProtocol,
    Urgency,
};
use super::input::AnalysisDepth;
use crate::stages::StageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyValidation {
    Pass,
    Warning,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewPriority {
    Low,
    Medium,
    High,
}

/// Where the QA record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaSource {
    Stage,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssurance {
    pub overall_confidence: f64,
    pub consistency_score: f64,
    pub evidence_quality: ConfidenceBand,
    pub clinical_coherence: f64,
    pub safety_validation: SafetyValidation,
    pub guideline_compliance: f64,
    pub critical_issues: Vec<String>,
    pub needs_human_review: bool,
    pub review_priority: ReviewPriority,
    pub source: QaSource,
}

impl QualityAssurance {
    /// Baseline used when the validation stage gives nothing structured.
    pub fn baseline() -> Self {
        Self {
            overall_confidence: 0.85,
            consistency_score: 0.90,
            evidence_quality: ConfidenceBand::High,
            clinical_coherence: 0.88,
            safety_validation: SafetyValidation::Pass,
            guideline_compliance: 0.92,
            critical_issues: Vec::new(),
            needs_human_review: false,
            review_priority: ReviewPriority::Low,
            source: QaSource::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub primary_concern: String,
    pub key_findings: Vec<String>,
    pub main_recommendations: Vec<String>,
    pub urgency_level: Urgency,
    pub follow_up_required: Vec<String>,
    pub critical_actions: Vec<String>,
}

/// One replayable entry of the reasoning trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub stage_id: StageId,
    pub timestamp: Option<DateTime<Utc>>,
    pub title: String,
    pub content_excerpt: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSource {
    pub title: String,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub evidence_level: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Complete,
    Partial,
}

/// Canonical output of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub processing_time_ms: i64,
    pub model_version: String,
    pub analysis_depth: AnalysisDepth,
    pub completion_status: CompletionStatus,
    pub stages: Vec<StageRecord>,
    pub symptoms: Vec<ComprehensiveSymptom>,
    pub diagnoses: Vec<DifferentialDiagnosis>,
    pub treatments: Vec<TreatmentProtocol>,
    pub concerns: Vec<Concern>,
    pub evidence_sources: Vec<EvidenceSource>,
    pub quality_assurance: QualityAssurance,
    pub validation_checks: Vec<ValidationCheck>,
    pub executive_summary: ExecutiveSummary,
    pub reasoning_trace: Vec<TraceStep>,
    pub next_steps: Vec<String>,
    pub reasoning: String,
}

impl AnalysisResult {
    pub fn confidence_band(&self) -> ConfidenceBand {
        ConfidenceBand::from_score(self.quality_assurance.overall_confidence)
    }
}

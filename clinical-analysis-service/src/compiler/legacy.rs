//! Flattened projection for consumers of the older analysis shape.
//!
//! Pure mapping over [`AnalysisResult`]: one legacy entry per canonical entity, nothing
//! recomputed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    AnalysisResult, ComprehensiveSymptom, Concern, ConcernSeverity, ConcernType,
    DifferentialDiagnosis, Severity, TreatmentCategory, TreatmentProtocol, Urgency,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacySeverity {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyTreatmentCategory {
    Medication,
    Procedure,
    Lifestyle,
    Referral,
    Monitoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpPriority {
    Routine,
    Urgent,
    Stat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySymptom {
    pub id: String,
    pub symptom: String,
    pub severity: LegacySeverity,
    pub duration: String,
    pub frequency: String,
    pub context: String,
    pub source_text: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDiagnosis {
    pub id: String,
    pub condition: String,
    pub icd10_code: String,
    pub probability: f64,
    pub supporting_evidence: Vec<String>,
    pub against_evidence: Vec<String>,
    pub additional_tests_needed: Vec<String>,
    pub reasoning: String,
    pub severity: ConcernSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTreatment {
    pub id: String,
    pub category: LegacyTreatmentCategory,
    pub recommendation: String,
    pub reasoning: String,
    pub priority: LegacyPriority,
    pub timeframe: Option<String>,
    pub contraindications: Vec<String>,
    pub alternatives: Vec<String>,
    pub monitoring_required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyConcern {
    pub id: String,
    #[serde(rename = "type")]
    pub concern_type: ConcernType,
    pub severity: ConcernSeverity,
    pub message: String,
    pub recommendation: String,
    pub source_text: Option<String>,
    pub requires_attention: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyFollowUp {
    pub id: String,
    pub description: String,
    pub priority: FollowUpPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAnalysis {
    pub id: String,
    pub session_id: String,
    pub extracted_symptoms: Vec<LegacySymptom>,
    pub differential_diagnosis: Vec<LegacyDiagnosis>,
    pub treatment_recommendations: Vec<LegacyTreatment>,
    pub flagged_concerns: Vec<LegacyConcern>,
    pub follow_up_recommendations: Vec<LegacyFollowUp>,
    pub confidence_score: f64,
    pub processing_time: i64,
    pub ai_model: String,
    pub reasoning: String,
    pub created_at: DateTime<Utc>,
}

impl From<&AnalysisResult> for LegacyAnalysis {
    fn from(result: &AnalysisResult) -> Self {
        let follow_up_priority = match result.executive_summary.urgency_level {
            Urgency::Emergent => FollowUpPriority::Stat,
            Urgency::Urgent => FollowUpPriority::Urgent,
            Urgency::SemiUrgent | Urgency::Routine => FollowUpPriority::Routine,
        };

        Self {
            id: result.id.clone(),
            session_id: result.session_id.clone(),
            extracted_symptoms: result.symptoms.iter().map(symptom).collect(),
            differential_diagnosis: result.diagnoses.iter().map(diagnosis).collect(),
            treatment_recommendations: result.treatments.iter().map(treatment).collect(),
            flagged_concerns: result.concerns.iter().map(concern).collect(),
            follow_up_recommendations: result
                .next_steps
                .iter()
                .enumerate()
                .map(|(i, step)| LegacyFollowUp {
                    id: format!("follow_up_{}", i + 1),
                    description: step.clone(),
                    priority: follow_up_priority,
                })
                .collect(),
            confidence_score: result.quality_assurance.overall_confidence,
            processing_time: result.processing_time_ms,
            ai_model: result.model_version.clone(),
            reasoning: result.reasoning.clone(),
            created_at: result.timestamp,
        }
    }
}

fn symptom(s: &ComprehensiveSymptom) -> LegacySymptom {
    LegacySymptom {
        id: s.id.clone(),
        symptom: s.name.clone(),
        severity: match s.severity {
            Severity::Mild => LegacySeverity::Mild,
            Severity::Moderate => LegacySeverity::Moderate,
            Severity::Severe | Severity::Critical => LegacySeverity::Severe,
        },
        duration: s.duration.clone(),
        frequency: s.timing_pattern.clone(),
        context: s.presentation.clone(),
        source_text: s.source_evidence.first().cloned().unwrap_or_default(),
        confidence: s.confidence,
    }
}

fn diagnosis(d: &DifferentialDiagnosis) -> LegacyDiagnosis {
    LegacyDiagnosis {
        id: d.id.clone(),
        condition: d.condition.clone(),
        icd10_code: d.code.clone(),
        probability: d.probability,
        supporting_evidence: d.supporting_evidence.clone(),
        against_evidence: d.contradicting_evidence.clone(),
        additional_tests_needed: d.missing_elements.clone(),
        reasoning: d.reasoning.clone(),
        severity: match d.urgency {
            Urgency::Emergent => ConcernSeverity::Critical,
            Urgency::Urgent => ConcernSeverity::High,
            Urgency::SemiUrgent | Urgency::Routine => ConcernSeverity::Medium,
        },
    }
}

fn treatment(t: &TreatmentProtocol) -> LegacyTreatment {
    LegacyTreatment {
        id: t.id.clone(),
        category: match t.category {
            TreatmentCategory::Pharmacological => LegacyTreatmentCategory::Medication,
            TreatmentCategory::Surgical | TreatmentCategory::Investigational => {
                LegacyTreatmentCategory::Procedure
            }
            TreatmentCategory::NonPharmacological => LegacyTreatmentCategory::Lifestyle,
            TreatmentCategory::Referral => LegacyTreatmentCategory::Referral,
            TreatmentCategory::Supportive => LegacyTreatmentCategory::Monitoring,
        },
        recommendation: t.intervention.clone(),
        reasoning: t.indication.clone(),
        priority: if t.efficacy.success_rate > 0.8 {
            LegacyPriority::High
        } else {
            LegacyPriority::Medium
        },
        timeframe: t.duration.clone(),
        contraindications: t.safety.contraindications.clone(),
        alternatives: t.alternatives.clone(),
        monitoring_required: t.monitoring.clone(),
    }
}

fn concern(c: &Concern) -> LegacyConcern {
    LegacyConcern {
        id: c.id.clone(),
        concern_type: c.concern_type,
        severity: c.severity,
        message: c.message.clone(),
        recommendation: c.recommendation.clone(),
        source_text: c.evidence.first().cloned(),
        requires_attention: c.requires_immediate_action,
    }
}

use serde::{Deserialize, Serialize};

use crate::stages::StageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Onset {
    Acute,
    Subacute,
    Chronic,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progression {
    Stable,
    Improving,
    Worsening,
    Fluctuating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceLevel {
    Strong,
    Moderate,
    Weak,
    Insufficient,
}

/// Ordered from least to most urgent, so `max` picks the more urgent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Routine,
    SemiUrgent,
    Urgent,
    Emergent,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Routine => "routine",
            Urgency::SemiUrgent => "semi_urgent",
            Urgency::Urgent => "urgent",
            Urgency::Emergent => "emergent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentCategory {
    Pharmacological,
    NonPharmacological,
    Surgical,
    Investigational,
    Supportive,
    Referral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcernType {
    RedFlag,
    UrgentReferral,
    DrugInteraction,
    MonitoringRequired,
    SafetyConcern,
}

impl ConcernType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConcernType::RedFlag => "red_flag",
            ConcernType::UrgentReferral => "urgent_referral",
            ConcernType::DrugInteraction => "drug_interaction",
            ConcernType::MonitoringRequired => "monitoring_required",
            ConcernType::SafetyConcern => "safety_concern",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcernSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Coarse reading of a [0, 1] confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ConfidenceBand::High
        } else if score >= 0.6 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// Where an entity came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Found in the stage narrative by a trigger phrase
    Extracted {
        trigger: String,
        stage: Option<StageId>,
    },
    /// Generic placeholder inserted because the category had no candidates
    Synthesized { reason: String },
}

impl Provenance {
    pub fn is_synthesized(&self) -> bool {
        matches!(self, Provenance::Synthesized { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveSymptom {
    pub id: String,
    pub name: String,
    pub presentation: String,
    pub severity: Severity,
    pub onset: Onset,
    pub duration: String,
    pub progression: Progression,
    pub location: String,
    pub radiation: String,
    pub quality: String,
    /// 0-10 scale
    pub intensity: u8,
    pub aggravating_factors: Vec<String>,
    pub relieving_factors: Vec<String>,
    pub associated_symptoms: Vec<String>,
    pub timing_pattern: String,
    pub functional_impact: String,
    pub confidence: f64,
    pub clinical_significance: Significance,
    pub source_evidence: Vec<String>,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticCriteria {
    pub met: Vec<String>,
    pub not_met: Vec<String>,
    pub uncertain: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prognosis {
    pub short_term: String,
    pub long_term: String,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialDiagnosis {
    pub id: String,
    pub condition: String,
    /// ICD-10 classification code
    pub code: String,
    pub probability: f64,
    pub confidence: f64,
    pub evidence_level: EvidenceLevel,
    pub supporting_evidence: Vec<String>,
    pub supporting_symptoms: Vec<String>,
    pub contradicting_evidence: Vec<String>,
    pub missing_elements: Vec<String>,
    pub diagnostic_criteria: DiagnosticCriteria,
    pub ranking: u32,
    pub urgency: Urgency,
    pub prognosis: Prognosis,
    pub complications: Vec<String>,
    pub red_flags: Vec<String>,
    pub reasoning: String,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Efficacy {
    pub expected_outcome: String,
    pub time_to_effect: String,
    pub success_rate: f64,
    pub evidence_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyProfile {
    pub contraindications: Vec<String>,
    pub precautions: Vec<String>,
    pub adverse_effects: Vec<String>,
    pub interactions: Vec<String>,
    pub monitoring: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentProtocol {
    pub id: String,
    pub category: TreatmentCategory,
    pub intervention: String,
    pub indication: String,
    pub mechanism: String,
    pub dosing: Option<String>,
    pub duration: Option<String>,
    pub monitoring: Vec<String>,
    pub efficacy: Efficacy,
    pub safety: SafetyProfile,
    pub alternatives: Vec<String>,
    pub cost_effectiveness: String,
    pub patient_education: Vec<String>,
    pub follow_up_protocol: Vec<String>,
    pub confidence: f64,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concern {
    pub id: String,
    #[serde(rename = "type")]
    pub concern_type: ConcernType,
    pub severity: ConcernSeverity,
    pub message: String,
    pub recommendation: String,
    pub requires_immediate_action: bool,
    pub source_stage: Option<StageId>,
    pub evidence: Vec<String>,
    pub clinical_context: String,
    pub confidence: f64,
    pub provenance: Provenance,
}

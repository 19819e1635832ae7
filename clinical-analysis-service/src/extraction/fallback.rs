//! Generic entries for categories the narrative gave no candidates for.

use super::diagnoses::rank;
use crate::models::{
    ComprehensiveSymptom, Concern, ConcernSeverity, ConcernType, DiagnosticCriteria,
    DifferentialDiagnosis, Efficacy, EvidenceLevel, Onset, Progression, Prognosis, Provenance,
    SafetyProfile, Severity, Significance, TreatmentCategory, TreatmentProtocol, Urgency,
};

/// Medium band, below anything read from the narrative.
pub const FALLBACK_CONFIDENCE: f64 = 0.65;

fn synthesized(reason: &str) -> Provenance {
    Provenance::Synthesized {
        reason: reason.to_string(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn symptoms() -> Vec<ComprehensiveSymptom> {
    vec![ComprehensiveSymptom {
        id: "symptom_clinical_presentation".to_string(),
        name: "Clinical Presentation".to_string(),
        presentation: "Symptoms described in the transcript require clinical review".to_string(),
        severity: Severity::Moderate,
        onset: Onset::Unknown,
        duration: "Duration not specified".to_string(),
        progression: Progression::Stable,
        location: "Location not specified".to_string(),
        radiation: "No radiation described".to_string(),
        quality: "Quality not characterised".to_string(),
        intensity: 5,
        aggravating_factors: Vec::new(),
        relieving_factors: Vec::new(),
        associated_symptoms: Vec::new(),
        timing_pattern: "Variable pattern".to_string(),
        functional_impact: "Functional impact not described".to_string(),
        confidence: FALLBACK_CONFIDENCE,
        clinical_significance: Significance::Medium,
        source_evidence: vec!["No specific symptom named in the reasoning output".to_string()],
        provenance: synthesized("no symptom trigger found in the narrative"),
    }]
}

pub fn diagnoses() -> Vec<DifferentialDiagnosis> {
    let mut diagnoses = vec![
        generic_diagnosis(
            "diagnosis_clinical_syndrome",
            "Clinical Syndrome Requiring Evaluation",
            "R99",
            0.75,
            Urgency::Urgent,
        ),
        generic_diagnosis(
            "diagnosis_alternative_consideration",
            "Alternative Diagnostic Consideration",
            "Z99.9",
            0.45,
            Urgency::SemiUrgent,
        ),
    ];
    rank(&mut diagnoses);
    diagnoses
}

fn generic_diagnosis(
    id: &str,
    condition: &str,
    code: &str,
    probability: f64,
    urgency: Urgency,
) -> DifferentialDiagnosis {
    DifferentialDiagnosis {
        id: id.to_string(),
        condition: condition.to_string(),
        code: code.to_string(),
        probability,
        confidence: FALLBACK_CONFIDENCE,
        evidence_level: EvidenceLevel::Insufficient,
        supporting_evidence: strings(&["Presentation documented in the transcript"]),
        supporting_symptoms: Vec::new(),
        contradicting_evidence: strings(&["Further evaluation needed"]),
        missing_elements: strings(&[
            "Focused history and examination",
            "Baseline laboratory evaluation",
        ]),
        diagnostic_criteria: DiagnosticCriteria {
            met: Vec::new(),
            not_met: strings(&["No specific condition identified in the narrative"]),
            uncertain: strings(&["Additional evaluation needed"]),
        },
        ranking: 0,
        urgency,
        prognosis: Prognosis {
            short_term: "Dependent on findings of the clinical evaluation".to_string(),
            long_term: "Dependent on the final diagnosis".to_string(),
            factors: strings(&["Time to diagnosis", "Patient comorbidities"]),
        },
        complications: Vec::new(),
        red_flags: strings(&["Hemodynamic instability", "Altered mental status"]),
        reasoning: format!(
            "{} synthesized because the narrative named no tabulated condition",
            condition
        ),
        provenance: synthesized("no condition trigger found in the narrative"),
    }
}

pub fn treatments() -> Vec<TreatmentProtocol> {
    vec![
        TreatmentProtocol {
            id: "treatment_comprehensive_evaluation".to_string(),
            category: TreatmentCategory::Investigational,
            intervention: "Comprehensive Medical Evaluation".to_string(),
            indication: "Establish a working diagnosis".to_string(),
            mechanism: "Systematic history, examination and targeted investigations".to_string(),
            dosing: Some("Not applicable".to_string()),
            duration: Some("Single encounter with follow-up as indicated".to_string()),
            monitoring: strings(&["Clinical response", "Investigation results"]),
            efficacy: Efficacy {
                expected_outcome: "Clarified diagnosis and management plan".to_string(),
                time_to_effect: "Same encounter".to_string(),
                success_rate: 0.80,
                evidence_level: "C - Expert consensus".to_string(),
            },
            safety: SafetyProfile {
                contraindications: Vec::new(),
                precautions: strings(&["Consent for invasive investigations"]),
                adverse_effects: Vec::new(),
                interactions: Vec::new(),
                monitoring: strings(&["Clinical status"]),
            },
            alternatives: strings(&["Specialist consultation"]),
            cost_effectiveness: "Standard of care".to_string(),
            patient_education: strings(&["Purpose of evaluation", "When to seek help"]),
            follow_up_protocol: strings(&["Review results with the treating clinician"]),
            confidence: FALLBACK_CONFIDENCE,
            provenance: synthesized("no intervention trigger found in the narrative"),
        },
        TreatmentProtocol {
            id: "treatment_continuous_monitoring".to_string(),
            category: TreatmentCategory::Supportive,
            intervention: "Continuous Clinical Monitoring".to_string(),
            indication: "Detect deterioration while evaluation is completed".to_string(),
            mechanism: "Serial observation of vital signs and symptoms".to_string(),
            dosing: None,
            duration: Some("Until clinically stable".to_string()),
            monitoring: strings(&["Vital signs", "Symptom progression"]),
            efficacy: Efficacy {
                expected_outcome: "Early recognition of clinical change".to_string(),
                time_to_effect: "Immediate".to_string(),
                success_rate: 0.80,
                evidence_level: "C - Expert consensus".to_string(),
            },
            safety: SafetyProfile {
                contraindications: Vec::new(),
                precautions: Vec::new(),
                adverse_effects: Vec::new(),
                interactions: Vec::new(),
                monitoring: strings(&["Vital signs"]),
            },
            alternatives: Vec::new(),
            cost_effectiveness: "Low cost".to_string(),
            patient_education: strings(&["Report new or worsening symptoms"]),
            follow_up_protocol: strings(&["Reassess at each observation interval"]),
            confidence: FALLBACK_CONFIDENCE,
            provenance: synthesized("no intervention trigger found in the narrative"),
        },
    ]
}

/// A monitoring concern, raised to an urgent referral when any diagnosis is emergent.
pub fn concerns(diagnoses: &[DifferentialDiagnosis]) -> Vec<Concern> {
    let emergent = diagnoses.iter().any(|d| d.urgency == Urgency::Emergent);
    let concern = if emergent {
        Concern {
            id: "concern_urgent_referral".to_string(),
            concern_type: ConcernType::UrgentReferral,
            severity: ConcernSeverity::High,
            message: "Emergent differential diagnosis without a documented escalation plan"
                .to_string(),
            recommendation: "Urgent specialist consultation".to_string(),
            requires_immediate_action: true,
            source_stage: None,
            evidence: diagnoses
                .iter()
                .filter(|d| d.urgency == Urgency::Emergent)
                .map(|d| format!("{} ({})", d.condition, d.code))
                .collect(),
            clinical_context: "Emergent conditions remain on the differential".to_string(),
            confidence: FALLBACK_CONFIDENCE,
            provenance: synthesized("no concern trigger found; emergent diagnosis present"),
        }
    } else {
        Concern {
            id: "concern_monitoring_required".to_string(),
            concern_type: ConcernType::MonitoringRequired,
            severity: ConcernSeverity::Medium,
            message: "Clinical monitoring recommended until evaluation is complete".to_string(),
            recommendation: "Implement routine monitoring and reassess".to_string(),
            requires_immediate_action: false,
            source_stage: None,
            evidence: Vec::new(),
            clinical_context: "No specific risk named in the reasoning output".to_string(),
            confidence: FALLBACK_CONFIDENCE,
            provenance: synthesized("no concern trigger found in the narrative"),
        }
    };
    vec![concern]
}

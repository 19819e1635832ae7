//! Preambles and user prompts for each reasoning stage.

use serde_json::Value;

use crate::stages::StageId;

const SHARED_RULES: &str = "Write plain clinical prose. Name conditions, symptoms, medications and \
    risks explicitly. State how certain you are using words such as definite, likely or possible. \
    When you have structured values, append a single JSON object after the prose.";

pub fn preamble(stage: StageId) -> String {
    let role = match stage {
        StageId::IntakeAnalysis => {
            "You are an experienced clinician performing the intake review of a consultation \
             transcript. Identify the chief complaint, the history of the presenting illness, \
             relevant background and every symptom mentioned."
        }
        StageId::SymptomCharacterization => {
            "You are a clinician characterising symptoms. For each symptom describe provocation, \
             quality, region and radiation, severity on a 0-10 scale, and timing, together with \
             aggravating and relieving factors."
        }
        StageId::DifferentialGeneration => {
            "You are a diagnostician. Produce a ranked differential diagnosis. For each condition \
             give its likelihood, the findings that support and argue against it, and its urgency \
             (emergent, urgent, semi-urgent or routine)."
        }
        StageId::EvidenceResearch => {
            "You are a clinical evidence reviewer. Summarise the guideline and literature evidence \
             that bears on the leading diagnoses and their investigations. List sources in a \
             \"sources\" array in the JSON object."
        }
        StageId::TreatmentPlanning => {
            "You are a treating physician writing a management plan. Give interventions with \
             doses, duration, monitoring and safety considerations, and any referrals."
        }
        StageId::RiskAssessment => {
            "You are a patient safety reviewer. Identify red flags, drug interactions, monitoring \
             needs and any need for urgent referral."
        }
        StageId::ValidationQa => {
            "You are a senior clinician auditing the preceding analysis for consistency, evidence \
             quality and safety. Include a \"qualityAssurance\" object with overallConfidence, \
             consistencyScore, evidenceQuality, clinicalCoherence, safetyValidation \
             (pass, warning or fail), guidelineCompliance, criticalIssues and needsHumanReview, \
             plus \"validationChecks\" and \"nextSteps\" arrays."
        }
    };
    format!("{}\n\n{}", role, SHARED_RULES)
}

/// Prompt text for a stage built from its JSON payload.
pub fn user_prompt(stage: StageId, payload: &Value) -> String {
    let mut prompt = format!("Stage: {}\n\n", stage.name());

    if let Some(transcript) = payload.get("transcript").and_then(Value::as_str) {
        prompt.push_str("Transcript:\n");
        prompt.push_str(transcript);
        prompt.push_str("\n\n");
    }

    if let Some(context) = payload.get("patient_context").filter(|v| !v.is_null()) {
        prompt.push_str("Patient context:\n");
        prompt.push_str(&context.to_string());
        prompt.push_str("\n\n");
    }

    if let Some(depth) = payload.get("analysis_depth").and_then(Value::as_str) {
        prompt.push_str(&format!("Analysis depth: {}\n", depth));
    }
    let focus: Vec<&str> = payload
        .get("focus_areas")
        .and_then(Value::as_array)
        .map(|areas| areas.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if !focus.is_empty() {
        prompt.push_str(&format!("Focus areas: {}\n", focus.join(", ")));
    }

    if let Some(previous) = payload.get("previous_stages").and_then(Value::as_array) {
        for entry in previous {
            let name = entry.get("stage").and_then(Value::as_str).unwrap_or("unknown");
            let text = entry.get("text").and_then(Value::as_str).unwrap_or_default();
            prompt.push_str(&format!("\n--- Output of {} ---\n{}\n", name, text));
        }
    }

    prompt.push_str(&format!("\nTask: {}.", stage.description()));
    prompt
}

use super::corpus::Corpus;
use super::qualifiers::{self as q, first_match};
use super::{ExtractionEngine, or_default, round2, slug};
use crate::models::{
    ComprehensiveSymptom, DiagnosticCriteria, DifferentialDiagnosis, EvidenceLevel, Prognosis,
    Provenance, Urgency,
};
use crate::reference::ConditionEntry;
use crate::stages::StageId;

pub(super) fn extract(
    engine: &ExtractionEngine,
    corpus: &Corpus,
    symptoms: &[ComprehensiveSymptom],
) -> Vec<DifferentialDiagnosis> {
    let matcher = engine.matcher.as_ref();
    let differential = corpus.stage_text(StageId::DifferentialGeneration);
    let supporting_symptoms: Vec<String> = symptoms
        .iter()
        .filter(|s| !s.provenance.is_synthesized())
        .map(|s| s.name.clone())
        .collect();

    let mut diagnoses: Vec<DifferentialDiagnosis> = engine
        .reference
        .conditions
        .conditions
        .iter()
        .filter_map(|entry| {
            let (trigger, at) = corpus.find_any(matcher, &entry.triggers)?;
            let window = corpus.window(&at, engine.windows.condition);
            let stage = corpus.stage_at(at.start);

            let named_in_differential =
                differential.is_some_and(|text| matcher.find_any(text, &entry.triggers).is_some());
            let mut probability =
                first_match(matcher, window, q::PROBABILITY).unwrap_or(q::DEFAULT_PROBABILITY);
            if named_in_differential {
                probability += q::DIFFERENTIAL_BONUS;
            }

            let urgency = first_match(matcher, window, q::URGENCY)
                .map_or(entry.default_urgency, |cue| cue.max(entry.default_urgency));

            Some(DifferentialDiagnosis {
                id: format!("diagnosis_{}", slug(&entry.name)),
                condition: entry.name.clone(),
                code: entry.code.clone(),
                probability: round2(probability.min(1.0)),
                confidence: first_match(matcher, window, q::CONFIDENCE)
                    .unwrap_or(q::DEFAULT_CONFIDENCE),
                evidence_level: first_match(matcher, window, q::EVIDENCE_LEVEL)
                    .unwrap_or(EvidenceLevel::Moderate),
                supporting_evidence: supporting_evidence(engine, &entry.name, window),
                supporting_symptoms: supporting_symptoms.clone(),
                contradicting_evidence: contradicting_evidence(engine, &entry.name, window),
                missing_elements: or_default(&entry.workup, &[
                    "Confirmatory diagnostic testing",
                    "Complete laboratory evaluation",
                    "Imaging studies if indicated",
                ]),
                diagnostic_criteria: criteria(entry),
                ranking: 0,
                urgency,
                prognosis: Prognosis {
                    short_term: short_term_prognosis(urgency).to_string(),
                    long_term: entry.long_term_prognosis.clone().unwrap_or_else(|| {
                        "Depends on timely diagnosis, appropriate treatment and adherence".to_string()
                    }),
                    factors: vec![
                        "Time to diagnosis and treatment".to_string(),
                        "Severity of initial presentation".to_string(),
                        "Patient comorbidities".to_string(),
                        "Response to initial therapy".to_string(),
                    ],
                },
                complications: or_default(&entry.complications, &[
                    "Disease-specific complications",
                    "Systemic complications",
                ]),
                red_flags: or_default(&entry.red_flags, &[
                    "Hemodynamic instability",
                    "Altered mental status",
                    "Severe pain",
                ]),
                reasoning: format!(
                    "Clinical reasoning: {}",
                    corpus
                        .excerpt(at.start, engine.windows.reasoning_excerpt)
                        .trim()
                ),
                provenance: Provenance::Extracted {
                    trigger: trigger.to_string(),
                    stage,
                },
            })
        })
        .collect();

    rank(&mut diagnoses);
    diagnoses
}

/// Order by probability, keeping reference order between ties, and number from 1.
pub(super) fn rank(diagnoses: &mut [DifferentialDiagnosis]) {
    diagnoses.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    for (i, diagnosis) in diagnoses.iter_mut().enumerate() {
        diagnosis.ranking = i as u32 + 1;
    }
}

fn supporting_evidence(engine: &ExtractionEngine, condition: &str, window: &str) -> Vec<String> {
    let found: Vec<String> = q::SUPPORTING_EVIDENCE
        .iter()
        .filter(|kw| engine.matcher.contains(window, kw))
        .map(|kw| format!("Clinical {} supporting {}", kw, condition))
        .collect();
    if found.is_empty() {
        return vec![format!("Narrative links the presentation to {}", condition)];
    }
    found
}

fn contradicting_evidence(engine: &ExtractionEngine, condition: &str, window: &str) -> Vec<String> {
    let found: Vec<String> = q::CONTRADICTING_EVIDENCE
        .iter()
        .filter(|kw| engine.matcher.contains(window, kw))
        .map(|kw| format!("Narrative notes \"{}\" in relation to {}", kw, condition))
        .collect();
    if found.is_empty() {
        return vec!["Further evaluation needed".to_string()];
    }
    found
}

fn criteria(entry: &ConditionEntry) -> DiagnosticCriteria {
    entry.criteria.clone().unwrap_or_else(|| DiagnosticCriteria {
        met: vec![
            format!("Clinical presentation consistent with {}", entry.name),
            "Symptom constellation suggestive".to_string(),
        ],
        not_met: vec![
            "Confirmatory testing pending".to_string(),
            "Complete workup required".to_string(),
        ],
        uncertain: vec!["Additional evaluation needed".to_string()],
    })
}

fn short_term_prognosis(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Emergent => "Requires immediate intervention with guarded short-term prognosis",
        Urgency::Urgent => "Good prognosis with appropriate urgent treatment",
        Urgency::SemiUrgent | Urgency::Routine => {
            "Favorable short-term prognosis with appropriate management"
        }
    }
}

use std::ops::Range;

use super::corpus::{Corpus, Window};
use super::qualifiers::{self as q, first_match};
use super::{ExtractionEngine, or_default, slug};
use crate::models::{Efficacy, Provenance, SafetyProfile, TreatmentProtocol};
use crate::reference::InterventionEntry;

pub(super) fn extract(engine: &ExtractionEngine, corpus: &Corpus) -> Vec<TreatmentProtocol> {
    let matcher = engine.matcher.as_ref();

    engine
        .reference
        .interventions
        .interventions
        .iter()
        .filter_map(|entry| {
            let (trigger, at) = corpus.find_any(matcher, &entry.triggers)?;
            let window = corpus.window(&at, engine.windows.intervention);
            let clause = dose_clause(engine, corpus, entry, &at);
            let stage = corpus.stage_at(at.start);

            let indication = first_match(matcher, window, q::INDICATION)
                .map(|reason| format!("{} indicated for {}", entry.name, reason))
                .unwrap_or_else(|| format!("{} indicated by the clinical narrative", entry.name));

            Some(TreatmentProtocol {
                id: format!("treatment_{}", slug(&entry.name)),
                category: entry.category,
                intervention: entry.name.clone(),
                indication,
                mechanism: entry.mechanism.clone().unwrap_or_else(|| {
                    format!("{} mechanism of action per prescribing reference", entry.name)
                }),
                dosing: Some(
                    q::explicit_dose(clause)
                        .or_else(|| entry.dosing.clone())
                        .unwrap_or_else(|| "Dosing per standard protocols".to_string()),
                ),
                duration: Some(
                    entry
                        .duration
                        .clone()
                        .unwrap_or_else(|| "Duration per clinical protocol".to_string()),
                ),
                monitoring: or_default(&entry.monitoring, &["Clinical response", "Adverse effects"]),
                efficacy: efficacy(entry),
                safety: safety(entry),
                alternatives: or_default(&entry.alternatives, &["Alternative therapies available"]),
                cost_effectiveness: entry
                    .cost_effectiveness
                    .clone()
                    .unwrap_or_else(|| "Cost-effectiveness per clinical guidelines".to_string()),
                patient_education: or_default(&entry.patient_education, &[
                    "Treatment education",
                    "Safety information",
                ]),
                follow_up_protocol: or_default(&entry.follow_up, &[
                    "Clinical follow-up",
                    "Response monitoring",
                ]),
                confidence: first_match(matcher, window, q::CONFIDENCE)
                    .unwrap_or(q::DEFAULT_CONFIDENCE),
                provenance: Provenance::Extracted {
                    trigger: trigger.to_string(),
                    stage,
                },
            })
        })
        .collect()
}

/// Text following the trigger up to the end of its sentence or the next named intervention,
/// whichever comes first. An explicit dose is only taken from here.
fn dose_clause<'c>(
    engine: &ExtractionEngine,
    corpus: &'c Corpus,
    entry: &InterventionEntry,
    at: &Range<usize>,
) -> &'c str {
    let after = corpus.window(at, Window::new(0, engine.windows.intervention.after));
    let tail = after.get(at.len()..).unwrap_or_default();
    let mut end = sentence_end(tail);

    for other in &engine.reference.interventions.interventions {
        if other.name == entry.name {
            continue;
        }
        if let Some((_, next)) = engine.matcher.find_any(&tail[..end], &other.triggers) {
            end = next.start;
        }
    }
    &tail[..end]
}

/// Offset of the first `;`, newline, or full stop followed by whitespace.
fn sentence_end(text: &str) -> usize {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .position(|(i, &b)| match b {
            b';' | b'\n' => true,
            b'.' => bytes.get(i + 1).is_none_or(u8::is_ascii_whitespace),
            _ => false,
        })
        .unwrap_or(text.len())
}

fn efficacy(entry: &InterventionEntry) -> Efficacy {
    let e = &entry.efficacy;
    Efficacy {
        expected_outcome: e
            .expected_outcome
            .clone()
            .unwrap_or_else(|| "Therapeutic benefit expected".to_string()),
        time_to_effect: e
            .time_to_effect
            .clone()
            .unwrap_or_else(|| "Variable onset of action".to_string()),
        success_rate: e.success_rate.unwrap_or(0.80).clamp(0.0, 1.0),
        evidence_level: e
            .evidence_level
            .clone()
            .unwrap_or_else(|| "B - Moderate evidence".to_string()),
    }
}

fn safety(entry: &InterventionEntry) -> SafetyProfile {
    let s = &entry.safety;
    SafetyProfile {
        contraindications: or_default(&s.contraindications, &[
            "Known allergy",
            "Severe contraindications",
        ]),
        precautions: or_default(&s.precautions, &["Use with caution", "Monitor closely"]),
        adverse_effects: or_default(&s.adverse_effects, &[
            "Common side effects",
            "Allergic reactions",
        ]),
        interactions: or_default(&s.interactions, &["Monitor drug interactions"]),
        monitoring: or_default(&s.monitoring, &["Safety parameters", "Clinical monitoring"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::tests::engine;
    use crate::models::TreatmentCategory;
    use crate::stages::StageId;

    fn treat(text: &str) -> Vec<TreatmentProtocol> {
        let corpus = Corpus::from_stages([(StageId::TreatmentPlanning, text)]);
        extract(&engine(), &corpus)
    }

    #[test]
    fn tabulated_drug_uses_reference_profile() {
        let treatments = treat("Give aspirin now for suspected cardiac ischaemia.");
        let aspirin = &treatments[0];
        assert_eq!(aspirin.id, "treatment_aspirin");
        assert_eq!(aspirin.category, TreatmentCategory::Pharmacological);
        assert_eq!(aspirin.indication, "Aspirin indicated for suspected cardiac condition");
        assert_eq!(aspirin.dosing.as_deref(), Some("325mg chewed initially, then 81mg daily"));
        assert_eq!(aspirin.efficacy.success_rate, 0.95);
        assert!(aspirin.safety.contraindications.contains(&"Aspirin allergy".to_string()));
    }

    #[test]
    fn explicit_dose_in_text_wins() {
        let treatments = treat("aspirin 162 mg chewed; oxygen at 2 l/min");
        let aspirin = treatments.iter().find(|t| t.intervention == "Aspirin").unwrap();
        let oxygen = treatments.iter().find(|t| t.intervention == "Oxygen Therapy").unwrap();
        assert_eq!(aspirin.dosing.as_deref(), Some("162 mg"));
        assert_eq!(oxygen.dosing.as_deref(), Some("2 l/min"));
    }

    #[test]
    fn dose_of_a_later_drug_is_not_borrowed() {
        let treatments =
            treat("Give nitroglycerin sublingual as needed, then morphine 4 mg IV for pain.");
        let nitro = treatments.iter().find(|t| t.intervention == "Nitroglycerin").unwrap();
        let morphine = treatments.iter().find(|t| t.intervention == "Morphine").unwrap();
        assert_eq!(nitro.dosing.as_deref(), Some("0.4mg sublingual every 5 minutes x3"));
        assert_eq!(morphine.dosing.as_deref(), Some("4 mg"));
    }

    #[test]
    fn dose_search_stops_at_the_sentence_end() {
        let treatments = treat("Aspirin was continued. Heparin 5000 units started.");
        let aspirin = treatments.iter().find(|t| t.intervention == "Aspirin").unwrap();
        assert_eq!(aspirin.dosing.as_deref(), Some("325mg chewed initially, then 81mg daily"));

        let decimal = treat("nitroglycerin 0.4 mg now");
        assert_eq!(decimal[0].dosing.as_deref(), Some("0.4 mg"));
    }

    #[test]
    fn untabulated_fields_fall_back_to_generic_text() {
        let treatments = treat("start antibiotic therapy for the infection");
        let antibiotics = &treatments[0];
        assert_eq!(
            antibiotics.mechanism,
            "Bactericidal or bacteriostatic action against pathogenic organisms"
        );
        assert_eq!(antibiotics.indication, "Antibiotic Therapy indicated for suspected infection");
        assert_eq!(antibiotics.dosing.as_deref(), Some("Dosing per standard protocols"));
        assert_eq!(antibiotics.efficacy.success_rate, 0.80);
        assert_eq!(antibiotics.alternatives, vec!["Alternative therapies available"]);
    }
}

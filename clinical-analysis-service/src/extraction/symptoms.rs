use super::corpus::Corpus;
use super::qualifiers::{self as q, capitalise, first_match};
use super::{ExtractionEngine, evidence_line, slug};
use crate::models::{ComprehensiveSymptom, Onset, Progression, Provenance, Severity, Significance};
use crate::reference::SymptomEntry;

pub(super) fn extract(engine: &ExtractionEngine, corpus: &Corpus) -> Vec<ComprehensiveSymptom> {
    let table = &engine.reference.symptoms;
    let matcher = engine.matcher.as_ref();

    table
        .symptoms
        .iter()
        .filter_map(|entry| {
            let (trigger, at) = corpus.find_any(matcher, &entry.triggers)?;
            let window = corpus.window(&at, engine.windows.symptom);
            let stage = corpus.stage_at(at.start);

            let scale = q::scale_score(window);
            let severity = first_match(matcher, window, q::SEVERITY)
                .or_else(|| scale.map(q::severity_for_intensity))
                .unwrap_or(Severity::Moderate);
            let intensity = scale
                .or_else(|| first_match(matcher, window, q::INTENSITY))
                .unwrap_or(q::DEFAULT_INTENSITY);

            // associated symptoms are read from the whole narrative, not the window
            let associated = q::cues_present(matcher, corpus.lower(), &table.associated_symptoms)
                .into_iter()
                .filter(|s| !entry.triggers.iter().any(|t| t.as_str() == *s))
                .map(capitalise)
                .collect();

            Some(ComprehensiveSymptom {
                id: format!("symptom_{}", slug(&entry.name)),
                name: entry.name.clone(),
                presentation: match stage {
                    Some(stage) => format!("{} described during {}", entry.name, stage.name()),
                    None => format!("{} described in the clinical narrative", entry.name),
                },
                severity,
                onset: first_match(matcher, window, q::ONSET).unwrap_or(Onset::Unknown),
                duration: q::duration(matcher, window)
                    .unwrap_or_else(|| "Duration not specified".to_string()),
                progression: first_match(matcher, window, q::PROGRESSION)
                    .unwrap_or(Progression::Stable),
                location: location(engine, entry, window),
                radiation: radiation(engine, entry, window),
                quality: quality(engine, entry, window),
                intensity,
                aggravating_factors: q::cues_present(matcher, window, &table.aggravating_factors)
                    .into_iter()
                    .map(capitalise)
                    .collect(),
                relieving_factors: q::cues_present(matcher, window, &table.relieving_factors)
                    .into_iter()
                    .map(capitalise)
                    .collect(),
                associated_symptoms: associated,
                timing_pattern: first_match(matcher, window, q::TIMING)
                    .unwrap_or("Variable pattern")
                    .to_string(),
                functional_impact: first_match(matcher, window, q::FUNCTIONAL_IMPACT)
                    .unwrap_or("Functional impact not described")
                    .to_string(),
                confidence: first_match(matcher, window, q::CONFIDENCE)
                    .unwrap_or(q::DEFAULT_CONFIDENCE),
                clinical_significance: first_match(matcher, window, q::SIGNIFICANCE)
                    .unwrap_or(Significance::Medium),
                source_evidence: vec![evidence_line(corpus, &at, stage)],
                provenance: Provenance::Extracted {
                    trigger: trigger.to_string(),
                    stage,
                },
            })
        })
        .collect()
}

fn location(engine: &ExtractionEngine, entry: &SymptomEntry, window: &str) -> String {
    engine
        .matcher
        .find_any(window, &entry.locations)
        .map(|(site, _)| capitalise(site))
        .unwrap_or_else(|| "Location not specified".to_string())
}

fn radiation(engine: &ExtractionEngine, entry: &SymptomEntry, window: &str) -> String {
    if let Some((site, _)) = engine.matcher.find_any(window, &entry.radiation_sites) {
        return format!("Radiates to {}", site);
    }
    if engine.matcher.contains(window, "radiat") {
        return "Radiation described without a specific site".to_string();
    }
    "No radiation described".to_string()
}

fn quality(engine: &ExtractionEngine, entry: &SymptomEntry, window: &str) -> String {
    if let Some((quality, _)) = engine.matcher.find_any(window, &entry.qualities) {
        return capitalise(quality);
    }
    if engine.matcher.contains(window, "classic") || engine.matcher.contains(window, "typical") {
        return format!("Classic presentation of {}", entry.name.to_lowercase());
    }
    "Quality not characterised".to_string()
}

use super::ExtractionEngine;
use super::corpus::Corpus;
use super::qualifiers::{self as q, first_match};
use crate::models::{Concern, Provenance};

/// One concern per concern type whose trigger appears anywhere in the narrative.
pub(super) fn extract(engine: &ExtractionEngine, corpus: &Corpus) -> Vec<Concern> {
    let matcher = engine.matcher.as_ref();

    engine
        .reference
        .concerns
        .concerns
        .iter()
        .filter_map(|entry| {
            let (trigger, at) = corpus.find_any(matcher, &entry.triggers)?;
            let window = corpus.window(&at, engine.windows.concern);
            let stage = corpus.stage_at(at.start);
            let evidence = corpus
                .excerpt(at.start, engine.windows.concern.before)
                .trim()
                .to_string();

            Some(Concern {
                id: format!("concern_{}", entry.concern_type.as_str()),
                concern_type: entry.concern_type,
                severity: entry.severity,
                message: entry.message.clone(),
                recommendation: entry.recommendation.clone(),
                requires_immediate_action: entry.requires_immediate_action,
                source_stage: stage,
                evidence: vec![evidence],
                clinical_context: entry.clinical_context.clone(),
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

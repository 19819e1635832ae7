//! Turns the reasoning narrative into scored clinical entities.
//!
//! Each category is found by trigger phrases from the reference tables, enriched from a window
//! of text around the first match and, when nothing matched at all, filled with generic
//! synthesized entries so no category is ever empty.

mod concerns;
mod corpus;
mod diagnoses;
pub mod fallback;
mod matcher;
mod qualifiers;
mod symptoms;
mod treatments;

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info};

pub use corpus::{Corpus, STAGE_SEPARATOR, Window, WindowSizes};
pub use matcher::{LiteralMatcher, PhraseMatcher};

use crate::models::{ComprehensiveSymptom, Concern, DifferentialDiagnosis, TreatmentProtocol};
use crate::reference::ReferenceData;
use crate::stages::StageId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub symptoms: Vec<ComprehensiveSymptom>,
    pub diagnoses: Vec<DifferentialDiagnosis>,
    pub treatments: Vec<TreatmentProtocol>,
    pub concerns: Vec<Concern>,
}

#[derive(Debug, Clone)]
pub struct ExtractionEngine {
    reference: Arc<ReferenceData>,
    matcher: Arc<dyn PhraseMatcher>,
    windows: WindowSizes,
}

impl ExtractionEngine {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self {
            reference,
            matcher: Arc::new(LiteralMatcher),
            windows: WindowSizes::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn PhraseMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_windows(mut self, windows: WindowSizes) -> Self {
        self.windows = windows;
        self
    }

    /// Extract all four categories. Never fails and never returns an empty category.
    pub fn extract(&self, corpus: &Corpus) -> ExtractedEntities {
        let mut symptoms = symptoms::extract(self, corpus);
        let mut diagnoses = diagnoses::extract(self, corpus, &symptoms);
        let mut treatments = treatments::extract(self, corpus);
        let mut concerns = concerns::extract(self, corpus);

        info!(
            symptoms = symptoms.len(),
            diagnoses = diagnoses.len(),
            treatments = treatments.len(),
            concerns = concerns.len(),
            corpus_bytes = corpus.text().len(),
            "Extracted clinical entities"
        );

        if symptoms.is_empty() {
            info!(category = "symptoms", "No candidates found, synthesizing defaults");
            symptoms = fallback::symptoms();
        }
        if diagnoses.is_empty() {
            info!(category = "diagnoses", "No candidates found, synthesizing defaults");
            diagnoses = fallback::diagnoses();
        }
        if treatments.is_empty() {
            info!(category = "treatments", "No candidates found, synthesizing defaults");
            treatments = fallback::treatments();
        }
        if concerns.is_empty() {
            info!(category = "concerns", "No candidates found, synthesizing defaults");
            concerns = fallback::concerns(&diagnoses);
        }

        debug!(blank = corpus.is_blank(), "Extraction complete");

        ExtractedEntities {
            symptoms,
            diagnoses,
            treatments,
            concerns,
        }
    }
}

/// `Chest Pain` -> `chest_pain`
pub(crate) fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reference list, or `fallback` when the table leaves it empty.
fn or_default(values: &[String], fallback: &[&str]) -> Vec<String> {
    if values.is_empty() {
        fallback.iter().map(|s| s.to_string()).collect()
    } else {
        values.to_vec()
    }
}

/// Quoted original-case excerpt around a match, labelled with its stage.
fn evidence_line(corpus: &Corpus, at: &Range<usize>, stage: Option<StageId>) -> String {
    let excerpt = corpus.excerpt(at.start, 80).trim().replace('\n', " ");
    match stage {
        Some(stage) => format!("{}: \"{}\"", stage.name(), excerpt),
        None => format!("\"{}\"", excerpt),
    }
}

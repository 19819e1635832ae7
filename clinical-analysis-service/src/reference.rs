//! Versioned clinical reference tables.
//!
//! The tables ship as JSON under `reference/` and are embedded at compile time. A deployment
//! can point [`ReferenceData::load`] at a directory holding replacement files; any file missing
//! from that directory falls back to the embedded copy.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

use crate::error::{AnalysisError, Result};
use crate::models::{ConcernSeverity, ConcernType, DiagnosticCriteria, TreatmentCategory, Urgency};

const SYMPTOMS_FILE: &str = "symptoms.json";
const CONDITIONS_FILE: &str = "conditions.json";
const INTERVENTIONS_FILE: &str = "interventions.json";
const CONCERNS_FILE: &str = "concerns.json";

const EMBEDDED_SYMPTOMS: &str = include_str!("../reference/symptoms.json");
const EMBEDDED_CONDITIONS: &str = include_str!("../reference/conditions.json");
const EMBEDDED_INTERVENTIONS: &str = include_str!("../reference/interventions.json");
const EMBEDDED_CONCERNS: &str = include_str!("../reference/concerns.json");

#[derive(Debug, Clone, Deserialize)]
pub struct SymptomEntry {
    pub name: String,
    pub triggers: Vec<String>,
    #[serde(default)]
    pub qualities: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub radiation_sites: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymptomTable {
    pub version: String,
    pub symptoms: Vec<SymptomEntry>,
    #[serde(default)]
    pub aggravating_factors: Vec<String>,
    #[serde(default)]
    pub relieving_factors: Vec<String>,
    #[serde(default)]
    pub associated_symptoms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionEntry {
    pub name: String,
    pub code: String,
    pub triggers: Vec<String>,
    pub default_urgency: Urgency,
    #[serde(default)]
    pub criteria: Option<DiagnosticCriteria>,
    #[serde(default)]
    pub workup: Vec<String>,
    #[serde(default)]
    pub complications: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub long_term_prognosis: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionTable {
    pub version: String,
    pub conditions: Vec<ConditionEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EfficacyEntry {
    pub expected_outcome: Option<String>,
    pub time_to_effect: Option<String>,
    pub success_rate: Option<f64>,
    pub evidence_level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SafetyEntry {
    #[serde(default)]
    pub contraindications: Vec<String>,
    #[serde(default)]
    pub precautions: Vec<String>,
    #[serde(default)]
    pub adverse_effects: Vec<String>,
    #[serde(default)]
    pub interactions: Vec<String>,
    #[serde(default)]
    pub monitoring: Vec<String>,
}

/// Every field past `category` is optional; extraction fills gaps with generic text.
#[derive(Debug, Clone, Deserialize)]
pub struct InterventionEntry {
    pub name: String,
    pub triggers: Vec<String>,
    pub category: TreatmentCategory,
    #[serde(default)]
    pub mechanism: Option<String>,
    #[serde(default)]
    pub dosing: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub monitoring: Vec<String>,
    #[serde(default)]
    pub efficacy: EfficacyEntry,
    #[serde(default)]
    pub safety: SafetyEntry,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub cost_effectiveness: Option<String>,
    #[serde(default)]
    pub patient_education: Vec<String>,
    #[serde(default)]
    pub follow_up: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterventionTable {
    pub version: String,
    pub interventions: Vec<InterventionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConcernEntry {
    #[serde(rename = "type")]
    pub concern_type: ConcernType,
    pub triggers: Vec<String>,
    pub severity: ConcernSeverity,
    pub message: String,
    pub recommendation: String,
    pub requires_immediate_action: bool,
    pub clinical_context: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConcernTable {
    pub version: String,
    pub concerns: Vec<ConcernEntry>,
}

/// All four tables, trigger phrases normalised to lowercase
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub symptoms: SymptomTable,
    pub conditions: ConditionTable,
    pub interventions: InterventionTable,
    pub concerns: ConcernTable,
}

impl ReferenceData {
    /// The tables compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_sources(
            parse(SYMPTOMS_FILE, EMBEDDED_SYMPTOMS)?,
            parse(CONDITIONS_FILE, EMBEDDED_CONDITIONS)?,
            parse(INTERVENTIONS_FILE, EMBEDDED_INTERVENTIONS)?,
            parse(CONCERNS_FILE, EMBEDDED_CONCERNS)?,
        )
    }

    /// Embedded tables, with any file present in `dir` taking precedence.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let Some(dir) = dir else {
            return Self::embedded();
        };

        let data = Self::from_sources(
            load_or_embedded(dir, SYMPTOMS_FILE, EMBEDDED_SYMPTOMS)?,
            load_or_embedded(dir, CONDITIONS_FILE, EMBEDDED_CONDITIONS)?,
            load_or_embedded(dir, INTERVENTIONS_FILE, EMBEDDED_INTERVENTIONS)?,
            load_or_embedded(dir, CONCERNS_FILE, EMBEDDED_CONCERNS)?,
        )?;
        info!(
            dir = %dir.display(),
            symptoms = %data.symptoms.version,
            conditions = %data.conditions.version,
            interventions = %data.interventions.version,
            concerns = %data.concerns.version,
            "Loaded clinical reference data"
        );
        Ok(data)
    }

    fn from_sources(
        mut symptoms: SymptomTable,
        mut conditions: ConditionTable,
        mut interventions: InterventionTable,
        mut concerns: ConcernTable,
    ) -> Result<Self> {
        for entry in &mut symptoms.symptoms {
            normalise_triggers(SYMPTOMS_FILE, &entry.name, &mut entry.triggers)?;
        }
        lowercase_all(&mut symptoms.aggravating_factors);
        lowercase_all(&mut symptoms.relieving_factors);
        lowercase_all(&mut symptoms.associated_symptoms);
        for entry in &mut conditions.conditions {
            normalise_triggers(CONDITIONS_FILE, &entry.name, &mut entry.triggers)?;
        }
        for entry in &mut interventions.interventions {
            normalise_triggers(INTERVENTIONS_FILE, &entry.name, &mut entry.triggers)?;
        }
        for entry in &mut concerns.concerns {
            normalise_triggers(CONCERNS_FILE, entry.concern_type.as_str(), &mut entry.triggers)?;
        }

        Ok(Self {
            symptoms,
            conditions,
            interventions,
            concerns,
        })
    }
}

fn parse<T: DeserializeOwned>(file: &str, source: &str) -> Result<T> {
    serde_json::from_str(source)
        .map_err(|e| AnalysisError::Reference(format!("{} is not valid: {}", file, e)))
}

fn load_or_embedded<T: DeserializeOwned>(dir: &Path, file: &str, embedded: &str) -> Result<T> {
    let path = dir.join(file);
    if !path.is_file() {
        return parse(file, embedded);
    }
    let source = std::fs::read_to_string(&path)
        .map_err(|e| AnalysisError::Reference(format!("cannot read {}: {}", path.display(), e)))?;
    parse(file, &source)
}

fn normalise_triggers(file: &str, entry: &str, triggers: &mut Vec<String>) -> Result<()> {
    lowercase_all(triggers);
    triggers.retain(|t| !t.is_empty());
    if triggers.is_empty() {
        return Err(AnalysisError::Reference(format!(
            "{}: entry '{}' has no trigger phrases",
            file, entry
        )));
    }
    Ok(())
}

fn lowercase_all(phrases: &mut [String]) {
    for phrase in phrases.iter_mut() {
        *phrase = phrase.trim().to_lowercase();
    }
}

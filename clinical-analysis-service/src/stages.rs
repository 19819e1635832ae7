use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The seven reasoning stages, in the only order they ever run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    IntakeAnalysis,
    SymptomCharacterization,
    DifferentialGeneration,
    EvidenceResearch,
    TreatmentPlanning,
    RiskAssessment,
    ValidationQa,
}

impl StageId {
    pub const ALL: [StageId; 7] = [
        StageId::IntakeAnalysis,
        StageId::SymptomCharacterization,
        StageId::DifferentialGeneration,
        StageId::EvidenceResearch,
        StageId::TreatmentPlanning,
        StageId::RiskAssessment,
        StageId::ValidationQa,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageId::IntakeAnalysis => "intake_analysis",
            StageId::SymptomCharacterization => "symptom_characterization",
            StageId::DifferentialGeneration => "differential_generation",
            StageId::EvidenceResearch => "evidence_research",
            StageId::TreatmentPlanning => "treatment_planning",
            StageId::RiskAssessment => "risk_assessment",
            StageId::ValidationQa => "validation_qa",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StageId::IntakeAnalysis => "Comprehensive Intake Analysis",
            StageId::SymptomCharacterization => "Advanced Symptom Characterization",
            StageId::DifferentialGeneration => "Comprehensive Differential Diagnosis",
            StageId::EvidenceResearch => "Medical Literature Research",
            StageId::TreatmentPlanning => "Advanced Treatment Protocol Development",
            StageId::RiskAssessment => "Comprehensive Risk Assessment",
            StageId::ValidationQa => "Quality Assurance & Validation",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StageId::IntakeAnalysis => {
                "Deep analysis of patient presentation, context, and initial symptom extraction"
            }
            StageId::SymptomCharacterization => {
                "Detailed symptom analysis with clinical correlation and significance assessment"
            }
            StageId::DifferentialGeneration => {
                "Multi-tiered differential diagnosis with probability ranking and evidence analysis"
            }
            StageId::EvidenceResearch => {
                "Evidence gathering and literature review for diagnostic and treatment decisions"
            }
            StageId::TreatmentPlanning => {
                "Evidence-based treatment planning with safety considerations and monitoring protocols"
            }
            StageId::RiskAssessment => {
                "Multi-dimensional risk analysis including clinical, safety, and prognostic factors"
            }
            StageId::ValidationQa => {
                "Multi-level validation and quality assurance with consistency checking"
            }
        }
    }

    /// Default per-stage budget. Escalates towards the evidence stage.
    pub fn default_timeout(self) -> Duration {
        let minutes = match self {
            StageId::IntakeAnalysis => 3,
            StageId::SymptomCharacterization => 4,
            StageId::DifferentialGeneration => 5,
            StageId::EvidenceResearch => 6,
            StageId::TreatmentPlanning => 5,
            StageId::RiskAssessment => 4,
            StageId::ValidationQa => 3,
        };
        Duration::from_secs(minutes * 60)
    }

    /// 1-based position in the pipeline.
    pub fn ordinal(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0) + 1
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageId::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown stage id: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_strings() {
        for stage in StageId::ALL {
            assert_eq!(stage.as_str().parse::<StageId>().unwrap(), stage);
            assert_eq!(
                serde_json::to_value(stage).unwrap(),
                serde_json::json!(stage.as_str())
            );
        }
        assert!("diagnosis".parse::<StageId>().is_err());
    }

    #[test]
    fn order_is_fixed() {
        assert_eq!(StageId::IntakeAnalysis.ordinal(), 1);
        assert_eq!(StageId::DifferentialGeneration.ordinal(), 3);
        assert_eq!(StageId::ValidationQa.ordinal(), 7);
        assert!(StageId::ALL.windows(2).all(|w| w[0] < w[1]));
    }
}

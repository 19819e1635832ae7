//! Structured QA, validation checks and evidence sources read from stage payloads.
//!
//! Stage payloads come from a language model, so every field is optional and both
//! `camelCase` and `snake_case` keys are accepted. Anything unreadable falls back to defaults.

use serde_json::{Map, Value};

use crate::models::{
    ConfidenceBand, EvidenceSource, QaSource, QualityAssurance, ReviewPriority, SafetyValidation,
    ValidationCheck,
};

fn field<'a>(obj: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    obj.get(camel).or_else(|| obj.get(snake))
}

/// A score in [0, 1]. Percentages such as `85` are scaled down.
pub fn score(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    let n = if n > 1.0 { n / 100.0 } else { n };
    Some(n.clamp(0.0, 1.0))
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn qa_object(raw: &Value) -> Option<&Map<String, Value>> {
    let obj = raw.as_object()?;
    if let Some(nested) = field(obj, "qualityAssurance", "quality_assurance") {
        return nested.as_object();
    }
    field(obj, "overallConfidence", "overall_confidence").map(|_| obj)
}

/// QA record from the validation stage payload, or the baseline when there is none.
pub fn quality_assurance(raw: Option<&Value>) -> QualityAssurance {
    let baseline = QualityAssurance::baseline();
    let Some(obj) = raw.and_then(qa_object) else {
        return baseline;
    };
    let Some(overall) = field(obj, "overallConfidence", "overall_confidence").and_then(score) else {
        return baseline;
    };

    let read = |camel, snake, default: f64| {
        field(obj, camel, snake).and_then(score).unwrap_or(default)
    };

    let evidence_quality = match field(obj, "evidenceQuality", "evidence_quality") {
        Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "high" => ConfidenceBand::High,
            "medium" | "moderate" => ConfidenceBand::Medium,
            "low" => ConfidenceBand::Low,
            other => other
                .parse::<f64>()
                .ok()
                .and_then(|n| score(&Value::from(n)))
                .map(ConfidenceBand::from_score)
                .unwrap_or(baseline.evidence_quality),
        },
        Some(v) => score(v)
            .map(ConfidenceBand::from_score)
            .unwrap_or(baseline.evidence_quality),
        None => baseline.evidence_quality,
    };

    let safety_validation = field(obj, "safetyValidation", "safety_validation")
        .and_then(Value::as_str)
        .map(|s| match s.to_ascii_lowercase().as_str() {
            "fail" | "failed" => SafetyValidation::Fail,
            "warning" | "warn" => SafetyValidation::Warning,
            _ => SafetyValidation::Pass,
        })
        .unwrap_or(baseline.safety_validation);

    let critical_issues = strings(field(obj, "criticalIssues", "critical_issues"));

    let needs_human_review = field(obj, "needsHumanReview", "needs_human_review")
        .and_then(Value::as_bool)
        .unwrap_or(safety_validation == SafetyValidation::Fail || !critical_issues.is_empty());

    let review_priority = field(obj, "reviewPriority", "review_priority")
        .and_then(Value::as_str)
        .and_then(|s| match s.to_ascii_lowercase().as_str() {
            "high" => Some(ReviewPriority::High),
            "medium" => Some(ReviewPriority::Medium),
            "low" => Some(ReviewPriority::Low),
            _ => None,
        })
        .unwrap_or(match safety_validation {
            SafetyValidation::Fail => ReviewPriority::High,
            SafetyValidation::Warning => ReviewPriority::Medium,
            SafetyValidation::Pass if needs_human_review => ReviewPriority::Medium,
            SafetyValidation::Pass => ReviewPriority::Low,
        });

    QualityAssurance {
        overall_confidence: overall,
        consistency_score: read("consistencyScore", "consistency_score", baseline.consistency_score),
        evidence_quality,
        clinical_coherence: read("clinicalCoherence", "clinical_coherence", baseline.clinical_coherence),
        safety_validation,
        guideline_compliance: read(
            "guidelineCompliance",
            "guideline_compliance",
            baseline.guideline_compliance,
        ),
        critical_issues,
        needs_human_review,
        review_priority,
        source: QaSource::Stage,
    }
}

pub fn validation_checks(raw: Option<&Value>) -> Vec<ValidationCheck> {
    let Some(items) = raw
        .and_then(Value::as_object)
        .and_then(|obj| field(obj, "validationChecks", "validation_checks"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(ValidationCheck {
                name: name.clone(),
                passed: true,
                details: None,
            }),
            Value::Object(obj) => {
                let name = obj.get("name").or_else(|| obj.get("check"))?.as_str()?;
                Some(ValidationCheck {
                    name: name.to_string(),
                    passed: obj.get("passed").and_then(Value::as_bool).unwrap_or(true),
                    details: obj.get("details").and_then(Value::as_str).map(str::to_string),
                })
            }
            _ => None,
        })
        .collect()
}

/// Sources listed by the evidence stage, as objects or bare titles.
pub fn evidence_sources(raw: Option<&Value>) -> Vec<EvidenceSource> {
    let Some(items) = raw.and_then(|r| r.get("sources")).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(title) => Some(EvidenceSource {
                title: title.clone(),
                source_type: None,
                evidence_level: None,
                url: None,
            }),
            Value::Object(obj) => {
                let text = |camel, snake| {
                    field(obj, camel, snake)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                };
                Some(EvidenceSource {
                    title: text("title", "title")?,
                    source_type: text("type", "source_type"),
                    evidence_level: text("evidenceLevel", "evidence_level"),
                    url: text("url", "url"),
                })
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_or_unstructured_qa_uses_baseline() {
        assert_eq!(quality_assurance(None), QualityAssurance::baseline());
        assert_eq!(
            quality_assurance(Some(&json!({"note": "all fine"}))),
            QualityAssurance::baseline()
        );
    }

    #[test]
    fn nested_camel_case_qa_is_read_and_normalised() {
        let raw = json!({
            "qualityAssurance": {
                "overallConfidence": 82,
                "consistencyScore": 0.7,
                "evidenceQuality": "moderate",
                "safetyValidation": "warning",
                "criticalIssues": ["Troponin pending"],
            }
        });
        let qa = quality_assurance(Some(&raw));
        assert_eq!(qa.overall_confidence, 0.82);
        assert_eq!(qa.consistency_score, 0.7);
        assert_eq!(qa.evidence_quality, ConfidenceBand::Medium);
        assert_eq!(qa.safety_validation, SafetyValidation::Warning);
        assert!(qa.needs_human_review);
        assert_eq!(qa.review_priority, ReviewPriority::Medium);
        assert_eq!(qa.clinical_coherence, 0.88);
        assert_eq!(qa.source, QaSource::Stage);
    }

    #[test]
    fn top_level_snake_case_qa_is_accepted() {
        let raw = json!({"overall_confidence": "55%", "safety_validation": "fail"});
        let qa = quality_assurance(Some(&raw));
        assert_eq!(qa.overall_confidence, 0.55);
        assert_eq!(qa.review_priority, ReviewPriority::High);
    }

    #[test]
    fn scores_are_clamped() {
        assert_eq!(score(&json!(250)), Some(1.0));
        assert_eq!(score(&json!(-0.2)), Some(0.0));
        assert_eq!(score(&json!("n/a")), None);
    }

    #[test]
    fn checks_and_sources_accept_strings_and_objects() {
        let raw = json!({
            "validationChecks": ["Dose ranges", {"name": "Allergy screen", "passed": false}],
            "sources": ["ESC 2023 NSTE-ACS guideline", {"title": "HEART score", "type": "study", "url": "https://example.org"}],
        });
        let checks = validation_checks(Some(&raw));
        assert_eq!(checks.len(), 2);
        assert!(!checks[1].passed);

        let sources = evidence_sources(Some(&raw));
        assert_eq!(sources[0].title, "ESC 2023 NSTE-ACS guideline");
        assert_eq!(sources[1].source_type.as_deref(), Some("study"));
    }
}

use serde_json::Value;
use stage_flow::StageRecord;

use super::quality::score;
use super::stage_record;
use crate::models::TraceStep;
use crate::stages::StageId;

pub const EXCERPT_CHARS: usize = 500;
const DEFAULT_STAGE_CONFIDENCE: f64 = 0.85;
const DEFAULT_NEXT_STEP: &str = "Review comprehensive analysis results";

/// First `max` characters of `text`, with an ellipsis when cut.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// One step per stage, in pipeline order.
pub fn reasoning_trace(stages: &[StageRecord]) -> Vec<TraceStep> {
    StageId::ALL
        .into_iter()
        .map(|stage| {
            let record = stage_record(stages, stage);
            let output = record.and_then(|r| r.result.as_ref());
            TraceStep {
                stage_id: stage,
                timestamp: record.and_then(|r| r.end_time.or(r.start_time)),
                title: stage.name().to_string(),
                content_excerpt: output
                    .map(|o| preview(o.text.trim(), EXCERPT_CHARS))
                    .unwrap_or_else(|| "No output recorded for this stage".to_string()),
                confidence: match output {
                    Some(o) => o
                        .raw
                        .as_ref()
                        .and_then(|raw| raw.get("confidence"))
                        .and_then(score)
                        .unwrap_or(DEFAULT_STAGE_CONFIDENCE),
                    None => 0.0,
                },
            }
        })
        .collect()
}

/// Narrative of the run: each completed stage's heading and preview.
pub fn narrative(stages: &[StageRecord]) -> String {
    StageId::ALL
        .into_iter()
        .filter_map(|stage| {
            let output = stage_record(stages, stage)?.result.as_ref()?;
            Some(format!(
                "{}:\n{}",
                stage.name(),
                preview(output.text.trim(), EXCERPT_CHARS)
            ))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Next steps proposed by the latest stage that listed any.
pub fn next_steps(stages: &[StageRecord]) -> Vec<String> {
    let proposed = StageId::ALL.into_iter().rev().find_map(|stage| {
        let raw = stage_record(stages, stage)?.result.as_ref()?.raw.as_ref()?;
        let steps: Vec<String> = raw
            .get("nextSteps")
            .or_else(|| raw.get("next_steps"))?
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        (!steps.is_empty()).then_some(steps)
    });
    proposed.unwrap_or_else(|| vec![DEFAULT_NEXT_STEP.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use stage_flow::TaskOutput;

    fn completed(stage: StageId, text: &str, raw: Option<Value>) -> StageRecord {
        let mut record = StageRecord::pending(stage.as_str(), stage.name(), stage.description());
        record.begin(Utc::now()).unwrap();
        record
            .complete(Utc::now(), TaskOutput::with_raw(text, raw))
            .unwrap();
        record
    }

    #[test]
    fn preview_cuts_on_char_boundaries() {
        assert_eq!(preview("abc", 5), "abc");
        assert_eq!(preview("ééééé", 2), "éé...");
    }

    #[test]
    fn trace_has_one_step_per_stage() {
        let stages = vec![
            completed(StageId::IntakeAnalysis, &"x".repeat(600), None),
            completed(
                StageId::SymptomCharacterization,
                "characterised",
                Some(json!({"confidence": 0.6})),
            ),
        ];
        let trace = reasoning_trace(&stages);

        assert_eq!(trace.len(), 7);
        assert_eq!(trace[0].content_excerpt.len(), EXCERPT_CHARS + 3);
        assert_eq!(trace[0].confidence, 0.85);
        assert_eq!(trace[1].confidence, 0.6);
        assert_eq!(trace[1].title, "Advanced Symptom Characterization");
        assert_eq!(trace[6].confidence, 0.0);
        assert!(trace[6].timestamp.is_none());
    }

    #[test]
    fn next_steps_prefer_latest_stage() {
        let stages = vec![
            completed(StageId::TreatmentPlanning, "plan", Some(json!({"nextSteps": ["ECG"]}))),
            completed(StageId::ValidationQa, "qa", Some(json!({"next_steps": ["Repeat troponin"]}))),
        ];
        assert_eq!(next_steps(&stages), vec!["Repeat troponin"]);
        assert_eq!(next_steps(&[]), vec![DEFAULT_NEXT_STEP]);
    }

    #[test]
    fn narrative_lists_completed_stages_in_order() {
        let stages = vec![
            completed(StageId::RiskAssessment, "low risk", None),
            completed(StageId::IntakeAnalysis, "chest pain", None),
        ];
        assert_eq!(
            narrative(&stages),
            "Comprehensive Intake Analysis:\nchest pain\n\nComprehensive Risk Assessment:\nlow risk"
        );
    }
}

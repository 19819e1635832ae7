mod common;

use chrono::Utc;
use clinical_analysis_service::{
    AnalysisError, AnalysisOptions, ConfidenceBand, LegacyAnalysis, PipelineConfig, QaSource,
    ReasoningError, Severity, StageId, StageTimeouts, Urgency,
};
use common::{ScriptedClient, pipeline, pipeline_with};
use serde_json::json;
use stage_flow::{ManualClock, StageStatus};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const SCENARIO_A: &str = "severe chest pain radiating to left arm, 45-year-old male";
const SCENARIO_B: &str = "routine follow-up, patient reports no new complaints";

#[tokio::test]
async fn chest_pain_transcript_yields_severe_symptom_and_acute_diagnosis() {
    let pipeline = pipeline(Arc::new(ScriptedClient::new()));
    let result = pipeline.run(SCENARIO_A, None, None).await.unwrap();

    let chest_pain = result
        .symptoms
        .iter()
        .find(|s| s.name == "Chest Pain")
        .expect("chest pain extracted");
    assert_eq!(chest_pain.severity, Severity::Severe);
    assert_eq!(chest_pain.radiation, "Radiates to left arm");
    assert!(
        result
            .diagnoses
            .iter()
            .any(|d| matches!(d.urgency, Urgency::Emergent | Urgency::Urgent))
    );
    assert_eq!(result.executive_summary.primary_concern, "Acute Coronary Syndrome");
}

#[tokio::test]
async fn silent_transcript_yields_only_synthesized_defaults() {
    let pipeline = pipeline(Arc::new(ScriptedClient::new()));
    let result = pipeline.run(SCENARIO_B, None, None).await.unwrap();

    assert_eq!(result.symptoms.len(), 1);
    assert_eq!(result.symptoms[0].name, "Clinical Presentation");
    assert_eq!(result.diagnoses[0].condition, "Clinical Syndrome Requiring Evaluation");
    assert_eq!(result.treatments[0].intervention, "Comprehensive Medical Evaluation");
    assert_eq!(result.concerns[0].id, "concern_monitoring_required");

    let confidences = result
        .symptoms
        .iter()
        .map(|s| (s.confidence, s.provenance.is_synthesized()))
        .chain(result.diagnoses.iter().map(|d| (d.confidence, d.provenance.is_synthesized())))
        .chain(result.treatments.iter().map(|t| (t.confidence, t.provenance.is_synthesized())))
        .chain(result.concerns.iter().map(|c| (c.confidence, c.provenance.is_synthesized())));
    for (confidence, synthesized) in confidences {
        assert_eq!(ConfidenceBand::from_score(confidence), ConfidenceBand::Medium);
        assert!(synthesized);
    }
}

#[tokio::test]
async fn failure_at_differential_stage_aborts_the_run() {
    let client = Arc::new(ScriptedClient::new().fail(
        StageId::DifferentialGeneration,
        ReasoningError::Transport("connection reset".to_string()),
    ));
    let pipeline = pipeline(client.clone());

    let mut session = pipeline.start_session(SCENARIO_A, None, None).await.unwrap();
    let err = pipeline.execute(&mut session).await.unwrap_err();

    assert_eq!(err.stage(), Some(StageId::DifferentialGeneration));
    assert!(err.to_string().contains("connection reset"));

    let statuses: Vec<StageStatus> = session.stages.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![
            StageStatus::Completed,
            StageStatus::Completed,
            StageStatus::Failed,
            StageStatus::Pending,
            StageStatus::Pending,
            StageStatus::Pending,
            StageStatus::Pending,
        ]
    );
    assert!(session.stages[2].error.as_deref().unwrap().contains("connection reset"));
    assert_eq!(client.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn slow_stage_fails_as_timeout() {
    let client = Arc::new(
        ScriptedClient::new().delay(StageId::EvidenceResearch, Duration::from_secs(120)),
    );
    let config = PipelineConfig {
        timeouts: StageTimeouts::uniform(Duration::from_secs(30)),
        ..Default::default()
    };
    let pipeline = pipeline_with(client, &config);

    let err = pipeline.run(SCENARIO_A, None, None).await.unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::StageTimeout {
            stage: StageId::EvidenceResearch,
            timeout_ms: 30_000
        }
    ));
}

#[tokio::test]
async fn exhausted_run_budget_times_out_the_next_stage() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let client = Arc::new(
        ScriptedClient::new().advancing(clock.clone(), chrono::Duration::minutes(2)),
    );
    let pipeline = pipeline(client.clone()).with_clock(clock);
    let options = AnalysisOptions {
        timeout_minutes: Some(3),
        ..Default::default()
    };

    let mut session = pipeline
        .start_session(SCENARIO_A, None, Some(options))
        .await
        .unwrap();
    let err = pipeline.execute(&mut session).await.unwrap_err();

    // two stages use four minutes of a three-minute budget
    assert!(matches!(
        err,
        AnalysisError::StageTimeout {
            stage: StageId::DifferentialGeneration,
            timeout_ms: 0
        }
    ));
    assert_eq!(client.calls().len(), 2);
}

#[tokio::test]
async fn stages_run_in_order_and_see_every_earlier_output() {
    let client = Arc::new(ScriptedClient::new());
    let pipeline = pipeline(client.clone());
    let result = pipeline.run(SCENARIO_A, None, None).await.unwrap();

    let calls = client.calls();
    let order: Vec<StageId> = calls.iter().map(|(stage, _)| *stage).collect();
    assert_eq!(order, StageId::ALL.to_vec());
    for (i, (_, payload)) in calls.iter().enumerate() {
        assert_eq!(payload["previous_stages"].as_array().unwrap().len(), i);
        assert_eq!(payload["transcript"], SCENARIO_A);
    }

    for (record, stage) in result.stages.iter().zip(StageId::ALL) {
        assert_eq!(record.id, stage.as_str());
        assert_eq!(record.status, StageStatus::Completed);
        assert!(record.start_time.unwrap() <= record.end_time.unwrap());
    }
}

#[tokio::test]
async fn structured_stage_output_reaches_the_result() {
    let client = Arc::new(
        ScriptedClient::new()
            .reply(
                StageId::EvidenceResearch,
                "Guidelines support early invasive strategy.",
                Some(json!({"sources": ["ESC NSTE-ACS guideline"]})),
            )
            .reply(
                StageId::ValidationQa,
                "Analysis is consistent.",
                Some(json!({
                    "qualityAssurance": {"overallConfidence": 0.78, "safetyValidation": "warning"},
                    "nextSteps": ["Serial troponin", "Cardiology review"]
                })),
            ),
    );
    let result = pipeline(client).run(SCENARIO_A, None, None).await.unwrap();

    assert_eq!(result.quality_assurance.source, QaSource::Stage);
    assert_eq!(result.quality_assurance.overall_confidence, 0.78);
    assert_eq!(result.confidence_band(), ConfidenceBand::Medium);
    assert_eq!(result.evidence_sources[0].title, "ESC NSTE-ACS guideline");
    assert_eq!(result.next_steps, vec!["Serial troponin", "Cardiology review"]);
}

#[tokio::test]
async fn scores_stay_within_unit_interval() {
    let transcript = "Definite severe chest pain 9/10, dyspnea, fever. \
                      Pneumonia highly likely; sepsis possible. Aspirin 325 mg, oxygen 2 l/min. \
                      Emergency: monitor closely, urgent referral.";
    let result = pipeline(Arc::new(ScriptedClient::new()))
        .run(transcript, None, None)
        .await
        .unwrap();

    let in_range = |x: f64| (0.0..=1.0).contains(&x);
    assert!(result.symptoms.iter().all(|s| in_range(s.confidence) && s.intensity <= 10));
    assert!(
        result
            .diagnoses
            .iter()
            .all(|d| in_range(d.probability) && in_range(d.confidence))
    );
    assert!(
        result
            .treatments
            .iter()
            .all(|t| in_range(t.confidence) && in_range(t.efficacy.success_rate))
    );
    assert!(result.concerns.iter().all(|c| in_range(c.confidence)));
    assert!(result.reasoning_trace.iter().all(|t| in_range(t.confidence)));
    assert!(in_range(result.quality_assurance.overall_confidence));
}

#[tokio::test]
async fn same_narrative_gives_identical_entities() {
    let pipeline = pipeline(Arc::new(ScriptedClient::new()));
    let first = pipeline.run(SCENARIO_A, None, None).await.unwrap();
    let second = pipeline.run(SCENARIO_A, None, None).await.unwrap();

    assert_ne!(first.session_id, second.session_id);
    assert_eq!(first.symptoms, second.symptoms);
    assert_eq!(first.diagnoses, second.diagnoses);
    assert_eq!(first.treatments, second.treatments);
    assert_eq!(first.concerns, second.concerns);
}

#[tokio::test]
async fn legacy_projection_preserves_entity_counts() {
    let pipeline = pipeline(Arc::new(ScriptedClient::new()));
    for transcript in [SCENARIO_A, SCENARIO_B] {
        let result = pipeline.run(transcript, None, None).await.unwrap();
        let legacy = LegacyAnalysis::from(&result);

        assert_eq!(legacy.extracted_symptoms.len(), result.symptoms.len());
        assert_eq!(legacy.differential_diagnosis.len(), result.diagnoses.len());
        assert_eq!(legacy.treatment_recommendations.len(), result.treatments.len());
        assert_eq!(legacy.flagged_concerns.len(), result.concerns.len());
        assert_eq!(legacy.session_id, result.session_id);
    }
}

#[tokio::test]
async fn session_ids_are_unique_across_concurrent_starts() {
    let pipeline = Arc::new(pipeline(Arc::new(ScriptedClient::new())));
    let mut handles = tokio::task::JoinSet::new();
    for _ in 0..10_000 {
        let pipeline = pipeline.clone();
        handles.spawn(async move {
            pipeline
                .start_session("cough", None, None)
                .await
                .map(|session| session.id)
        });
    }

    let mut ids = HashSet::new();
    while let Some(joined) = handles.join_next().await {
        ids.insert(joined.unwrap().unwrap());
    }
    assert_eq!(ids.len(), 10_000);
}

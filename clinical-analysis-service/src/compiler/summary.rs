use crate::extraction::ExtractedEntities;
use crate::models::{ExecutiveSummary, Urgency};

const MAX_ITEMS: usize = 3;

pub fn executive_summary(entities: &ExtractedEntities) -> ExecutiveSummary {
    let top = entities.diagnoses.iter().min_by_key(|d| d.ranking);

    let mut key_findings: Vec<String> = entities
        .symptoms
        .iter()
        .take(MAX_ITEMS)
        .map(|s| format!("{} ({})", s.name, s.severity.as_str()))
        .collect();
    if let Some(top) = top {
        key_findings.push(format!(
            "Leading diagnosis: {} ({:.0}% probability)",
            top.condition,
            top.probability * 100.0
        ));
    }

    let mut follow_up_required: Vec<String> = Vec::new();
    for step in entities
        .treatments
        .iter()
        .flat_map(|t| t.follow_up_protocol.iter())
    {
        if follow_up_required.len() == MAX_ITEMS {
            break;
        }
        if !follow_up_required.contains(step) {
            follow_up_required.push(step.clone());
        }
    }

    ExecutiveSummary {
        primary_concern: top
            .map(|d| d.condition.clone())
            .unwrap_or_else(|| "Clinical evaluation required".to_string()),
        key_findings,
        main_recommendations: entities
            .treatments
            .iter()
            .take(MAX_ITEMS)
            .map(|t| format!("{}: {}", t.intervention, t.indication))
            .collect(),
        urgency_level: entities
            .diagnoses
            .iter()
            .map(|d| d.urgency)
            .max()
            .unwrap_or(Urgency::Routine),
        follow_up_required,
        critical_actions: entities
            .concerns
            .iter()
            .filter(|c| c.requires_immediate_action)
            .map(|c| c.recommendation.clone())
            .collect(),
    }
}

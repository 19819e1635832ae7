//! Ordered cue tables that turn a context window into attribute values.
//!
//! Rules are checked top to bottom and the first rule with any cue present wins, so the more
//! specific phrases ("highly likely", "subacute") sit above the phrases they contain.

use std::sync::LazyLock;

use regex::Regex;

use super::matcher::PhraseMatcher;
use crate::models::{EvidenceLevel, Onset, Progression, Severity, Significance, Urgency};

pub struct Rule<T> {
    pub cues: &'static [&'static str],
    pub value: T,
}

const fn rule<T>(cues: &'static [&'static str], value: T) -> Rule<T> {
    Rule { cues, value }
}

/// Value of the first rule with a cue present in `window`.
pub fn first_match<T: Copy>(
    matcher: &dyn PhraseMatcher,
    window: &str,
    rules: &[Rule<T>],
) -> Option<T> {
    rules
        .iter()
        .find(|r| r.cues.iter().any(|cue| matcher.contains(window, cue)))
        .map(|r| r.value)
}

pub fn cues_present<'a>(
    matcher: &dyn PhraseMatcher,
    window: &str,
    cues: &'a [String],
) -> Vec<&'a str> {
    cues.iter()
        .filter(|cue| matcher.contains(window, cue))
        .map(String::as_str)
        .collect()
}

pub const SEVERITY: &[Rule<Severity>] = &[
    rule(&["critical", "life-threatening"], Severity::Critical),
    rule(&["severe", "intense", "excruciating"], Severity::Severe),
    rule(&["moderate", "significant"], Severity::Moderate),
    rule(&["mild", "slight", "minor"], Severity::Mild),
    rule(&["emergency", "immediate"], Severity::Critical),
    rule(&["concerning", "worrisome"], Severity::Severe),
    rule(&["manageable", "tolerable"], Severity::Mild),
];

pub const INTENSITY: &[Rule<u8>] = &[
    rule(&["severe", "excruciating"], 8),
    rule(&["moderate", "significant"], 6),
    rule(&["mild", "slight"], 3),
    rule(&["minimal"], 2),
];

pub const DEFAULT_INTENSITY: u8 = 5;

pub const ONSET: &[Rule<Onset>] = &[
    rule(&["subacute", "gradual"], Onset::Subacute),
    rule(&["acute", "sudden", "abrupt"], Onset::Acute),
    rule(&["chronic", "longstanding", "persistent"], Onset::Chronic),
];

pub const PROGRESSION: &[Rule<Progression>] = &[
    rule(&["worsening", "deteriorating", "progressive"], Progression::Worsening),
    rule(&["improving", "better", "resolving"], Progression::Improving),
    rule(&["fluctuating", "variable", "intermittent"], Progression::Fluctuating),
];

pub const TIMING: &[Rule<&str>] = &[
    rule(&["constant", "continuous"], "Constant"),
    rule(&["intermittent", "episodic"], "Intermittent"),
    rule(&["progressive", "worsening"], "Progressive"),
];

pub const FUNCTIONAL_IMPACT: &[Rule<&str>] = &[
    rule(&["unable", "cannot"], "Severe functional limitation"),
    rule(&["difficult", "limited"], "Moderate functional limitation"),
    rule(&["mild", "minimal"], "Mild functional impact"),
];

pub const SIGNIFICANCE: &[Rule<Significance>] = &[
    rule(
        &["critical", "emergency", "life-threatening", "significant", "concerning"],
        Significance::High,
    ),
    rule(&["moderate", "important"], Significance::Medium),
    rule(&["minor", "benign", "incidental"], Significance::Low),
];

pub const CONFIDENCE: &[Rule<f64>] = &[
    rule(&["definite", "clear"], 0.95),
    rule(&["likely", "probable"], 0.85),
    rule(&["possible", "suggest"], 0.75),
];

/// Baseline when no qualifier is present; the upstream narrative is treated as reliable.
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

pub const PROBABILITY: &[Rule<f64>] = &[
    rule(&["highly likely", "definite"], 0.9),
    rule(&["unlikely", "less likely", "ruled out"], 0.3),
    rule(&["likely", "probable"], 0.75),
    rule(&["possible", "consider"], 0.6),
];

pub const DEFAULT_PROBABILITY: f64 = 0.7;

/// Added when the condition is named in the differential stage itself.
pub const DIFFERENTIAL_BONUS: f64 = 0.05;

pub const EVIDENCE_LEVEL: &[Rule<EvidenceLevel>] = &[
    rule(&["strong evidence", "definitive"], EvidenceLevel::Strong),
    rule(&["moderate evidence", "supportive"], EvidenceLevel::Moderate),
    rule(&["weak evidence", "limited"], EvidenceLevel::Weak),
    rule(&["insufficient evidence", "no evidence"], EvidenceLevel::Insufficient),
];

/// Urgency cues. Only ever escalate a condition's reference urgency.
pub const URGENCY: &[Rule<Urgency>] = &[
    rule(
        &["emergent", "emergency", "immediate", "life-threatening"],
        Urgency::Emergent,
    ),
    rule(&["semi-urgent", "semi urgent", "soon"], Urgency::SemiUrgent),
    rule(&["urgent", "urgently"], Urgency::Urgent),
];

pub const SUPPORTING_EVIDENCE: &[&str] = &[
    "symptom",
    "sign",
    "presentation",
    "history",
    "examination",
    "finding",
    "characteristic",
    "typical",
    "classic",
    "pathognomonic",
];

pub const CONTRADICTING_EVIDENCE: &[&str] = &[
    "unlikely",
    "against",
    "contradicts",
    "less likely",
    "alternative",
    "excludes",
];

pub const INDICATION: &[Rule<&str>] = &[
    rule(&["chest pain", "cardiac"], "suspected cardiac condition"),
    rule(&["infection", "bacterial"], "suspected infection"),
    rule(&["pain"], "pain management"),
    rule(&["hypoxia", "desaturation"], "hypoxaemia"),
];

static DURATION_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(hour|day|week|month|year)s?\b").expect("duration pattern is valid")
});

static INTENSITY_SCALE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(\d+(?:\.\d+)?)\s*(?:/\s*10|out\s+of\s+10)\b")
        .expect("intensity pattern is valid")
});

static DOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+(?:\.\d+)?\s*(?:mg|mcg|g|ml|units?|l/min)\b").expect("dose pattern is valid")
});

const DURATION_WORDS: &[Rule<&str>] = &[
    rule(&["subacute"], "Subacute (1-4 weeks)"),
    rule(&["acute"], "Acute onset (< 24 hours)"),
    rule(&["chronic"], "Chronic (> 3 months)"),
    rule(&["recent"], "Recent onset"),
    rule(&["ongoing"], "Ongoing"),
];

/// Explicit duration ("3 days") or a duration word, in that order.
pub fn duration(matcher: &dyn PhraseMatcher, window: &str) -> Option<String> {
    if let Some(caps) = DURATION_AMOUNT.captures(window) {
        let plural = if &caps[1] == "1" { "" } else { "s" };
        return Some(format!("{} {}{}", &caps[1], &caps[2], plural));
    }
    first_match(matcher, window, DURATION_WORDS).map(str::to_string)
}

/// Explicit `n/10` or `n out of 10` score, rounded to a whole point within 0-10.
pub fn scale_score(window: &str) -> Option<u8> {
    INTENSITY_SCALE
        .captures(window)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .map(|score| score.round().clamp(0.0, 10.0) as u8)
}

pub fn explicit_dose(window: &str) -> Option<String> {
    DOSE.find(window).map(|m| m.as_str().to_string())
}

/// Severity bucket of a 0-10 intensity score.
pub fn severity_for_intensity(score: u8) -> Severity {
    match score {
        0..=3 => Severity::Mild,
        4..=6 => Severity::Moderate,
        7..=8 => Severity::Severe,
        _ => Severity::Critical,
    }
}

pub fn capitalise(phrase: &str) -> String {
    let mut chars = phrase.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::LiteralMatcher;

    #[test]
    fn specific_probability_phrases_win() {
        let m = LiteralMatcher;
        assert_eq!(first_match(&m, "acs is highly likely", PROBABILITY), Some(0.9));
        assert_eq!(first_match(&m, "pe is unlikely here", PROBABILITY), Some(0.3));
        assert_eq!(first_match(&m, "pneumonia is likely", PROBABILITY), Some(0.75));
        assert_eq!(first_match(&m, "consider migraine", PROBABILITY), Some(0.6));
        assert_eq!(first_match(&m, "nothing to say", PROBABILITY), None);
    }

    #[test]
    fn subacute_is_not_read_as_acute() {
        let m = LiteralMatcher;
        assert_eq!(first_match(&m, "subacute course", ONSET), Some(Onset::Subacute));
        assert_eq!(first_match(&m, "sudden onset", ONSET), Some(Onset::Acute));
        assert_eq!(duration(&m, "a subacute picture").as_deref(), Some("Subacute (1-4 weeks)"));
    }

    #[test]
    fn semi_urgent_is_not_read_as_urgent() {
        let m = LiteralMatcher;
        assert_eq!(first_match(&m, "semi-urgent review", URGENCY), Some(Urgency::SemiUrgent));
        assert_eq!(first_match(&m, "urgent review", URGENCY), Some(Urgency::Urgent));
    }

    #[test]
    fn durations_prefer_explicit_amounts() {
        let m = LiteralMatcher;
        assert_eq!(duration(&m, "pain for 3 days, acute").as_deref(), Some("3 days"));
        assert_eq!(duration(&m, "2 hours ago").as_deref(), Some("2 hours"));
        assert_eq!(duration(&m, "no timing given"), None);
    }

    #[test]
    fn scale_scores_and_doses_are_found() {
        assert_eq!(scale_score("pain rated 8/10"), Some(8));
        assert_eq!(scale_score("rated 10 out of 10"), Some(10));
        assert_eq!(scale_score("no score"), None);
        assert_eq!(scale_score("rated 7.5/10"), Some(8));
        assert_eq!(scale_score("worst ever, 10/10"), Some(10));
        assert_eq!(scale_score("pain 8.0 out of 10"), Some(8));
        assert_eq!(explicit_dose("give aspirin 325 mg now").as_deref(), Some("325 mg"));
        assert_eq!(explicit_dose("oxygen at 2 l/min").as_deref(), Some("2 l/min"));
    }

    #[test]
    fn intensity_buckets_cover_the_scale() {
        assert_eq!(severity_for_intensity(2), Severity::Mild);
        assert_eq!(severity_for_intensity(5), Severity::Moderate);
        assert_eq!(severity_for_intensity(8), Severity::Severe);
        assert_eq!(severity_for_intensity(10), Severity::Critical);
    }

    #[test]
    fn capitalise_first_letter_only() {
        assert_eq!(capitalise("left arm"), "Left arm");
        assert_eq!(capitalise(""), "");
    }
}

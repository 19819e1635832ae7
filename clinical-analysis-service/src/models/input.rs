use serde::{Deserialize, Deserializer, Serialize, de};

/// Optional patient background supplied alongside the transcript
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientContext {
    /// Accepts `45` or `"45"`
    #[serde(default, deserialize_with = "age_from_number_or_text")]
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub medical_history: Option<String>,
    pub medications: Option<String>,
    pub allergies: Option<String>,
    pub family_history: Option<String>,
    pub social_history: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u32),
    Text(String),
}

fn age_from_number_or_text<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(age)) => Ok(Some(age)),
        Some(NumberOrText::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("age must be a whole number, got {:?}", text)))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDepth {
    #[default]
    Comprehensive,
    Deep,
    UltraDeep,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    #[serde(default)]
    pub analysis_depth: AnalysisDepth,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    /// Budget for the whole run, shared across all stages
    pub timeout_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeTranscriptRequest {
    pub transcript: String,
    #[serde(default)]
    pub patient_context: Option<PatientContext>,
    #[serde(default)]
    pub options: Option<AnalysisOptions>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: serde_json::Value) -> serde_json::Result<PatientContext> {
        serde_json::from_value(value)
    }

    #[test]
    fn age_accepts_number_or_numeric_text() {
        assert_eq!(context(json!({"age": 45})).unwrap().age, Some(45));
        assert_eq!(context(json!({"age": "45"})).unwrap().age, Some(45));
        assert_eq!(context(json!({"age": " 72 "})).unwrap().age, Some(72));
    }

    #[test]
    fn missing_or_blank_age_is_none() {
        assert_eq!(context(json!({"gender": "female"})).unwrap().age, None);
        assert_eq!(context(json!({"age": null})).unwrap().age, None);
        assert_eq!(context(json!({"age": ""})).unwrap().age, None);
    }

    #[test]
    fn non_numeric_age_is_rejected() {
        let err = context(json!({"age": "forty"})).unwrap_err();
        assert!(err.to_string().contains("age must be a whole number"));
    }
}

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AnalysisError, Result};
use crate::extraction::WindowSizes;
use crate::stages::StageId;

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_PORT: u16 = 3000;

/// Per-stage timeouts, defaulting to [`StageId::default_timeout`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTimeouts {
    timeouts: BTreeMap<StageId, Duration>,
}

impl StageTimeouts {
    /// Same timeout for every stage.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            timeouts: StageId::ALL.into_iter().map(|s| (s, timeout)).collect(),
        }
    }

    pub fn get(&self, stage: StageId) -> Duration {
        self.timeouts
            .get(&stage)
            .copied()
            .unwrap_or_else(|| stage.default_timeout())
    }

    pub fn with(mut self, stage: StageId, timeout: Duration) -> Self {
        self.timeouts.insert(stage, timeout);
        self
    }
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            timeouts: StageId::ALL
                .into_iter()
                .map(|s| (s, s.default_timeout()))
                .collect(),
        }
    }
}

/// Everything the reasoning pipeline needs besides the reasoning client
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub timeouts: StageTimeouts,
    /// Label recorded on every result
    pub model_version: String,
    pub windows: WindowSizes,
    /// Directory with replacement reference JSON files
    pub reference_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeouts: StageTimeouts::default(),
            model_version: DEFAULT_MODEL.to_string(),
            windows: WindowSizes::default(),
            reference_dir: None,
        }
    }
}

/// Settings of the HTTP host, read from the environment
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_key: String,
    pub port: u16,
    pub model: String,
    pub pipeline: PipelineConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` uses the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("OPENROUTER_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AnalysisError::Config("OPENROUTER_API_KEY not set".to_string()))?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| AnalysisError::Config(format!("invalid PORT '{}': {}", raw, e)))?,
            None => DEFAULT_PORT,
        };

        let model = lookup("REASONING_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut timeouts = StageTimeouts::default();
        for stage in StageId::ALL {
            let key = format!("STAGE_TIMEOUT_SECS_{}", stage.as_str().to_uppercase());
            if let Some(raw) = lookup(&key) {
                let secs = raw.parse::<u64>().map_err(|e| {
                    AnalysisError::Config(format!("invalid {} '{}': {}", key, raw, e))
                })?;
                timeouts = timeouts.with(stage, Duration::from_secs(secs));
            }
        }

        Ok(Self {
            api_key,
            port,
            model: model.clone(),
            pipeline: PipelineConfig {
                timeouts,
                model_version: model,
                windows: WindowSizes::default(),
                reference_dir: lookup("CLINICAL_REFERENCE_DIR").map(PathBuf::from),
            },
        })
    }
}

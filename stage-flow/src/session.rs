use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

use crate::{Context, stage::StageRecord, stage::StageStatus};

/// One end-to-end run of a pipeline. Owns its stage records exclusively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub pipeline_id: String,
    pub started_at: DateTime<Utc>,
    /// Whole-run time budget; `None` means only per-stage timeouts apply
    pub budget_ms: Option<u64>,
    pub stages: Vec<StageRecord>,
    #[serde(skip)]
    pub context: Context,
}

/// Snapshot of how far a session has progressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub current_stage: Option<String>,
}

impl Session {
    pub fn stage(&self, id: &str) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self
                .stages
                .iter()
                .filter(|s| s.status == StageStatus::Completed)
                .count(),
            total: self.stages.len(),
            current_stage: self
                .stages
                .iter()
                .find(|s| s.status == StageStatus::Running)
                .map(|s| s.name.clone()),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.stages.is_empty() && self.stages.iter().all(|s| s.status == StageStatus::Completed)
    }

    pub fn failed_stage(&self) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.status == StageStatus::Failed)
    }

    /// Budget left at `now`, saturating at zero. `None` when the run is unbounded.
    pub fn remaining_budget(&self, now: DateTime<Utc>) -> Option<Duration> {
        let budget = self.budget_ms?;
        let elapsed = (now - self.started_at).num_milliseconds().max(0) as u64;
        Some(Duration::from_millis(budget.saturating_sub(elapsed)))
    }
}

/// Produces session identifiers. Must never hand out the same id twice.
pub trait SessionIdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Human-readable ids built from a prefix and a monotonically increasing counter
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl SessionIdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}_{:06}", self.prefix, n)
    }
}

/// Random v4 UUID ids
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl SessionIdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};
use crate::task::TaskOutput;

/// Lifecycle of a single stage. Transitions only move forward:
/// `Pending -> Running -> Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StageStatus {
    fn can_move_to(self, next: StageStatus) -> bool {
        matches!(
            (self, next),
            (StageStatus::Pending, StageStatus::Running)
                | (StageStatus::Running, StageStatus::Completed)
                | (StageStatus::Running, StageStatus::Failed)
        )
    }
}

/// Bookkeeping for one stage of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: StageStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub result: Option<TaskOutput>,
    pub error: Option<String>,
}

impl StageRecord {
    pub fn pending(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            status: StageStatus::Pending,
            start_time: None,
            end_time: None,
            result: None,
            error: None,
        }
    }

    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(StageStatus::Running)?;
        self.start_time = Some(now);
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime<Utc>, output: TaskOutput) -> Result<()> {
        self.transition(StageStatus::Completed)?;
        self.end_time = Some(now);
        self.result = Some(output);
        Ok(())
    }

    pub fn fail(&mut self, now: DateTime<Utc>, reason: impl Into<String>) -> Result<()> {
        self.transition(StageStatus::Failed)?;
        self.end_time = Some(now);
        self.error = Some(reason.into());
        Ok(())
    }

    /// Wall time between start and end, once both are known.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }

    fn transition(&mut self, next: StageStatus) -> Result<()> {
        if !self.status.can_move_to(next) {
            return Err(FlowError::InvalidTransition {
                stage_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

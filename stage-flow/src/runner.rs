//! FlowRunner – convenience wrapper that creates sessions for a pipeline and drives them to
//! completion.
//!
//! A runner owns the three collaborators a run needs besides the stages themselves: the
//! [`Pipeline`], a [`SessionIdGenerator`] and a [`Clock`]. Both of the latter are injected, so a
//! test can pin ids and timestamps while production uses [`UuidIdGenerator`] and
//! [`SystemClock`].
//!
//! ```rust,ignore
//! let runner = FlowRunner::new(Arc::new(pipeline));
//! let mut session = runner.start_session(Context::new(), None).await?;
//! runner.run(&mut session).await?;
//! assert!(session.is_complete());
//! ```
//!
//! Sessions are plain values: nothing is stored by the runner, and concurrent runs share only
//! the id generator.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    clock::{Clock, SystemClock},
    context::{Context, keys},
    error::Result,
    pipeline::Pipeline,
    session::{Session, SessionIdGenerator, UuidIdGenerator},
};

/// High-level helper that creates sessions and executes them against one pipeline.
#[derive(Clone)]
pub struct FlowRunner {
    pipeline: Arc<Pipeline>,
    ids: Arc<dyn SessionIdGenerator>,
    clock: Arc<dyn Clock>,
}

impl FlowRunner {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            ids: Arc::new(UuidIdGenerator),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn SessionIdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Create a session with every stage `Pending` and the given context.
    pub async fn start_session(&self, context: Context, budget: Option<Duration>) -> Result<Session> {
        let id = self.ids.next_id();
        context.set(keys::SESSION_ID, &id).await?;

        Ok(Session {
            id,
            pipeline_id: self.pipeline.id.clone(),
            started_at: self.clock.now(),
            budget_ms: budget.map(|b| b.as_millis() as u64),
            stages: self.pipeline.stage_records(),
            context,
        })
    }

    /// Execute every stage of the session. The session keeps the stage
    /// statuses whether or not the run succeeds.
    pub async fn run(&self, session: &mut Session) -> Result<()> {
        self.pipeline
            .execute_session(session, self.clock.as_ref())
            .await
    }
}

pub mod clock;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod runner;
pub mod session;
pub mod stage;
pub mod task;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::Context;
pub use error::{FlowError, Result};
pub use pipeline::{Pipeline, PipelineBuilder, StageSpec};
pub use runner::FlowRunner;
pub use session::{Progress, SequentialIdGenerator, Session, SessionIdGenerator, UuidIdGenerator};
pub use stage::{StageRecord, StageStatus};
pub use task::{CompletedStage, Task, TaskOutput, TaskResult};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    /// Echoes how many stages ran before it
    struct CountingTask {
        id: String,
    }

    #[async_trait]
    impl Task for CountingTask {
        fn id(&self) -> &str {
            &self.id
        }

        async fn run(&self, context: Context) -> Result<TaskResult> {
            let seen = context.completed_stages();
            let previous = seen
                .iter()
                .map(|s| s.stage_id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            Ok(TaskResult::new(TaskOutput::text(format!(
                "{} after [{}]",
                self.id, previous
            ))))
        }
    }

    struct FailingTask;

    #[async_trait]
    impl Task for FailingTask {
        fn id(&self) -> &str {
            "failing"
        }

        async fn run(&self, _context: Context) -> Result<TaskResult> {
            Err(FlowError::TaskExecutionFailed("upstream closed".to_string()))
        }
    }

    struct SlowTask;

    #[async_trait]
    impl Task for SlowTask {
        fn id(&self) -> &str {
            "slow"
        }

        async fn run(&self, _context: Context) -> Result<TaskResult> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(TaskResult::new(TaskOutput::text("too late")))
        }
    }

    fn counting(id: &str) -> Arc<dyn Task> {
        Arc::new(CountingTask { id: id.to_string() })
    }

    #[tokio::test]
    async fn test_stages_run_in_order_and_see_prior_outputs() {
        let pipeline = PipelineBuilder::new("test_pipeline")
            .add_stage(counting("one"), "One", "first")
            .add_stage(counting("two"), "Two", "second")
            .add_stage(counting("three"), "Three", "third")
            .build();
        let runner = FlowRunner::new(Arc::new(pipeline))
            .with_id_generator(Arc::new(SequentialIdGenerator::new("t")));

        let mut session = runner.start_session(Context::new(), None).await.unwrap();
        assert_eq!(session.id, "t_000001");
        assert_eq!(session.context.session_id().as_deref(), Some("t_000001"));

        runner.run(&mut session).await.unwrap();

        assert!(session.is_complete());
        let texts: Vec<_> = session
            .stages
            .iter()
            .map(|s| s.result.as_ref().unwrap().text.clone())
            .collect();
        assert_eq!(
            texts,
            vec!["one after []", "two after [one]", "three after [one,two]"]
        );
    }

    #[tokio::test]
    async fn test_failure_aborts_and_leaves_later_stages_pending() {
        let pipeline = PipelineBuilder::new("test_pipeline")
            .add_stage(counting("one"), "One", "first")
            .add_stage(Arc::new(FailingTask), "Failing", "second")
            .add_stage(counting("three"), "Three", "third")
            .build();
        let runner = FlowRunner::new(Arc::new(pipeline));

        let mut session = runner.start_session(Context::new(), None).await.unwrap();
        let err = runner.run(&mut session).await.unwrap_err();

        assert_eq!(err.failed_stage(), Some("failing"));
        assert!(matches!(err.root_cause(), FlowError::TaskExecutionFailed(_)));
        let statuses: Vec<_> = session.stages.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![StageStatus::Completed, StageStatus::Failed, StageStatus::Pending]
        );
        assert!(session.stage("failing").unwrap().end_time.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_timeout_fails_the_stage() {
        let pipeline = PipelineBuilder::new("test_pipeline")
            .add_stage(Arc::new(SlowTask), "Slow", "never finishes in time")
            .with_timeout(Duration::from_millis(500))
            .build();
        let runner = FlowRunner::new(Arc::new(pipeline));

        let mut session = runner.start_session(Context::new(), None).await.unwrap();
        let err = runner.run(&mut session).await.unwrap_err();

        assert!(matches!(
            err.root_cause(),
            FlowError::Timeout { timeout_ms: 500, .. }
        ));
        assert_eq!(session.stages[0].status, StageStatus::Failed);
    }

    #[tokio::test]
    async fn test_exhausted_budget_times_out_before_running() {
        let start = chrono::Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let pipeline = PipelineBuilder::new("test_pipeline")
            .add_stage(counting("one"), "One", "first")
            .with_timeout(Duration::from_secs(30))
            .build();
        let runner = FlowRunner::new(Arc::new(pipeline)).with_clock(clock.clone());

        let mut session = runner
            .start_session(Context::new(), Some(Duration::from_secs(10)))
            .await
            .unwrap();
        clock.advance(chrono::Duration::seconds(11));

        let err = runner.run(&mut session).await.unwrap_err();
        assert!(matches!(err.root_cause(), FlowError::Timeout { timeout_ms: 0, .. }));
    }
}

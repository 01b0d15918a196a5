//! Step-wise execution of a resolved sequence.

use crate::core::{Operation, OperationKind, StepFuture, StepResult, Value};
use crate::errors::{PipelineError, StepError};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// State of a run.
#[derive(Debug)]
pub enum RunState {
    /// The step at `index` is next, or is suspended, with `value` as input.
    Running {
        /// Index of the next step.
        index: usize,
        /// Current value.
        value: Value,
    },
    /// Every step has run.
    Succeeded(Value),
    /// An async step failed; the remaining steps are skipped.
    Failed(PipelineError),
    /// A sync step failed and its error was handed to the caller of
    /// [`Execution::advance`]. The run cannot continue.
    Aborted {
        /// Index of the failed step.
        index: usize,
    },
}

/// An async step the run is waiting on.
pub struct Suspension {
    /// Index of the suspended step.
    pub index: usize,
    /// The step's pending outcome.
    pub future: StepFuture,
}

impl std::fmt::Debug for Suspension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suspension")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// One run of a resolved sequence against an input value.
///
/// [`advance`](Self::advance) runs sync steps in place until the run ends or
/// reaches an async step, which it hands back as a [`Suspension`];
/// [`resume`](Self::resume) feeds the async outcome back in. [`finish`](Self::finish)
/// drives the loop to the end.
#[derive(Debug)]
pub struct Execution {
    pipeline: String,
    run_id: Uuid,
    plan: Arc<[Operation]>,
    state: RunState,
}

impl Execution {
    /// Creates a run positioned before the first step.
    #[must_use]
    pub fn new(pipeline: impl Into<String>, plan: Vec<Operation>, input: Value) -> Self {
        Self {
            pipeline: pipeline.into(),
            run_id: Uuid::new_v4(),
            plan: plan.into(),
            state: RunState::Running {
                index: 0,
                value: input,
            },
        }
    }

    /// Returns the run identifier used in logs.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the number of resolved steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plan.len()
    }

    /// Returns true when there are no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plan.is_empty()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Runs sync steps until the run ends or an async step starts.
    ///
    /// # Errors
    ///
    /// A sync step that raises ends the run with a sync [`StepError`].
    pub fn advance(&mut self) -> Result<Option<Suspension>, StepError> {
        loop {
            let (index, value) = match &mut self.state {
                RunState::Running { index, value } => (*index, std::mem::take(value)),
                RunState::Succeeded(_) | RunState::Failed(_) | RunState::Aborted { .. } => {
                    return Ok(None)
                }
            };

            let Some(op) = self.plan.get(index) else {
                self.state = RunState::Succeeded(value);
                return Ok(None);
            };

            match op {
                Operation::Sync(body) => match body(value) {
                    Ok(next) => {
                        self.state = RunState::Running {
                            index: index + 1,
                            value: next,
                        };
                    }
                    Err(source) => {
                        warn!(
                            pipeline = %self.pipeline,
                            run_id = %self.run_id,
                            step = index,
                            error = %source,
                            "sync step failed"
                        );
                        self.state = RunState::Aborted { index };
                        return Err(StepError::new(OperationKind::Sync, index, source));
                    }
                },
                Operation::Async(body) => {
                    debug!(run_id = %self.run_id, step = index, "suspending on async step");
                    return Ok(Some(Suspension {
                        index,
                        future: body(value),
                    }));
                }
            }
        }
    }

    /// Applies the outcome of the suspended step at `index`.
    pub fn resume(&mut self, index: usize, outcome: StepResult) {
        self.state = match outcome {
            Ok(value) => RunState::Running {
                index: index + 1,
                value,
            },
            Err(source) => {
                warn!(
                    pipeline = %self.pipeline,
                    run_id = %self.run_id,
                    step = index,
                    error = %source,
                    "async step failed"
                );
                RunState::Failed(StepError::new(OperationKind::Async, index, source).into())
            }
        };
    }

    /// Drives the run to its end, starting from `pending`.
    ///
    /// `pending` is what the last call to [`advance`](Self::advance)
    /// returned. A sync step raising after the first suspension can no
    /// longer reach the caller that started the run, so it is returned here
    /// as a sync [`StepError`].
    pub async fn finish(mut self, pending: Option<Suspension>) -> Result<Value, PipelineError> {
        let mut pending = pending;
        while let Some(Suspension { index, future }) = pending.take() {
            let outcome = future.await;
            self.resume(index, outcome);
            pending = self.advance()?;
        }
        self.into_outcome()
    }

    /// Consumes a finished run.
    ///
    /// # Errors
    ///
    /// Returns the failure of a failed run, or an internal error if the run
    /// has not finished.
    pub fn into_outcome(self) -> Result<Value, PipelineError> {
        match self.state {
            RunState::Succeeded(value) => {
                debug!(
                    pipeline = %self.pipeline,
                    run_id = %self.run_id,
                    steps = self.plan.len(),
                    "run succeeded"
                );
                Ok(value)
            }
            RunState::Failed(err) => Err(err),
            RunState::Aborted { index } => Err(PipelineError::Internal(format!(
                "run {} was aborted by sync step {index}",
                self.run_id
            ))),
            RunState::Running { index, .. } => Err(PipelineError::Internal(format!(
                "run {} ended while still at step {index}",
                self.run_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn add(n: i64) -> Operation {
        Operation::map(move |v: Value| json!(v.as_i64().unwrap() + n))
    }

    fn async_add(n: i64) -> Operation {
        Operation::from_async(move |v: Value| async move {
            tokio::task::yield_now().await;
            Ok(json!(v.as_i64().unwrap() + n))
        })
    }

    #[test]
    fn test_sync_steps_fold_left() {
        let times_ten = Operation::map(|v| json!(v.as_i64().unwrap() * 10));
        let mut run = Execution::new("test", vec![add(10), times_ten], json!(0));
        assert!(run.advance().unwrap().is_none());
        assert_eq!(run.into_outcome().unwrap(), json!(100));
    }

    #[test]
    fn test_empty_plan_succeeds_with_input() {
        let mut run = Execution::new("test", vec![], json!("same"));
        assert!(run.is_empty());
        assert!(run.advance().unwrap().is_none());
        assert!(matches!(run.state(), RunState::Succeeded(v) if v == &json!("same")));
    }

    #[test]
    fn test_advance_stops_at_async_step() {
        let mut run = Execution::new("test", vec![add(1), async_add(1), add(1)], json!(0));
        let suspension = run.advance().unwrap().unwrap();
        assert_eq!(suspension.index, 1);
        assert!(matches!(run.state(), RunState::Running { index: 1, .. }));
    }

    #[test]
    fn test_sync_failure_is_returned_from_advance() {
        let ran = std::sync::Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        let plan = vec![
            Operation::sync(|_| Err(anyhow::anyhow!("bad"))),
            Operation::map(move |v| {
                counter.fetch_add(1, Ordering::SeqCst);
                v
            }),
        ];
        let mut run = Execution::new("test", plan, json!(0));
        let err = run.advance().unwrap_err();
        assert_eq!(err.kind, OperationKind::Sync);
        assert_eq!(err.index, 0);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sync_failure_ends_the_run() {
        let attempts = std::sync::Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let plan = vec![Operation::sync(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("bad"))
        })];
        let mut run = Execution::new("test", plan, json!(0));
        assert!(run.advance().is_err());

        assert!(matches!(run.state(), RunState::Aborted { index: 0 }));
        assert!(run.advance().unwrap().is_none());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(run.into_outcome(), Err(PipelineError::Internal(_))));
    }

    #[tokio::test]
    async fn test_finish_drives_mixed_plan() {
        let mut run = Execution::new("test", vec![async_add(1), add(1), async_add(1)], json!(0));
        let pending = run.advance().unwrap();
        assert_eq!(run.finish(pending).await.unwrap(), json!(3));
    }

    #[tokio::test]
    async fn test_async_failure_skips_remaining_steps() {
        let ran = std::sync::Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        let plan = vec![
            Operation::from_async(|_v: Value| async { Err(anyhow::anyhow!("later")) }),
            Operation::map(move |v| {
                counter.fetch_add(1, Ordering::SeqCst);
                v
            }),
        ];
        let mut run = Execution::new("test", plan, json!(0));
        let pending = run.advance().unwrap();
        let err = run.finish(pending).await.unwrap_err();

        let step = err.as_step().unwrap();
        assert_eq!(step.kind, OperationKind::Async);
        assert_eq!(step.index, 0);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sync_failure_after_suspension_is_returned_from_finish() {
        let plan = vec![async_add(1), Operation::sync(|_| Err(anyhow::anyhow!("late sync")))];
        let mut run = Execution::new("test", plan, json!(0));
        let pending = run.advance().unwrap();
        let err = run.finish(pending).await.unwrap_err();
        assert_eq!(err.code(), "SYNC_STEP");
    }

    #[test]
    fn test_unfinished_run_has_no_outcome() {
        let mut run = Execution::new("test", vec![async_add(1)], json!(0));
        let _pending = run.advance().unwrap();
        assert!(matches!(run.into_outcome(), Err(PipelineError::Internal(_))));
    }
}

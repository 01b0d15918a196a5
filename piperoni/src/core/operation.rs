//! Operation descriptors.
//!
//! An [`Operation`] is one executable step. Its kind is fixed when it is
//! built: [`Operation::Sync`] bodies return their result directly, while
//! [`Operation::Async`] bodies return a future that the scheduler awaits.

use super::OperationKind;
use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

/// The value that flows from step to step.
pub type Value = serde_json::Value;

/// What a step body produces. An `Err` is the step raising.
pub type StepResult = anyhow::Result<Value>;

/// Future returned by an async step body.
pub type StepFuture = BoxFuture<'static, StepResult>;

/// Body of a synchronous step.
pub type SyncFn = Arc<dyn Fn(Value) -> StepResult + Send + Sync>;

/// Body of an asynchronous step.
pub type AsyncFn = Arc<dyn Fn(Value) -> StepFuture + Send + Sync>;

/// Trait for asynchronous steps implemented as types.
#[async_trait]
pub trait AsyncStep: Send + Sync + Debug {
    /// Returns the name of the step.
    fn name(&self) -> &str;

    /// Transforms the value.
    async fn call(&self, value: Value) -> StepResult;
}

/// One step of a pipeline, tagged with how it completes.
#[derive(Clone)]
pub enum Operation {
    /// Maps a value to a value before returning.
    Sync(SyncFn),
    /// Maps a value to a future of a value.
    Async(AsyncFn),
}

impl Operation {
    /// Creates a sync operation from a fallible body.
    pub fn sync<F>(body: F) -> Self
    where
        F: Fn(Value) -> StepResult + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(body))
    }

    /// Creates a sync operation from a body that cannot fail.
    pub fn map<F>(body: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(move |value| Ok(body(value))))
    }

    /// Creates an async operation from a function returning a future.
    pub fn from_async<F, Fut>(body: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult> + Send + 'static,
    {
        Self::Async(Arc::new(move |value| body(value).boxed()))
    }

    /// Creates an async operation from a callback-style body.
    ///
    /// The body receives the value and a [`Completion`] it must complete
    /// once. Dropping the completion without using it fails the step.
    pub fn from_callback<F>(body: F) -> Self
    where
        F: Fn(Value, Completion) + Send + Sync + 'static,
    {
        Self::Async(Arc::new(move |value| {
            let (sender, receiver) = oneshot::channel();
            body(value, Completion { sender });
            async move {
                receiver.await.unwrap_or_else(|_| {
                    Err(anyhow::anyhow!(
                        "async step dropped its completion without a result"
                    ))
                })
            }
            .boxed()
        }))
    }

    /// Creates an async operation from an [`AsyncStep`] implementation.
    pub fn from_step(step: Arc<dyn AsyncStep>) -> Self {
        Self::Async(Arc::new(move |value| {
            let step = step.clone();
            async move { step.call(value).await }.boxed()
        }))
    }

    /// Returns the kind of this operation.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Sync(_) => OperationKind::Sync,
            Self::Async(_) => OperationKind::Async,
        }
    }

    /// Returns true for sync operations.
    #[must_use]
    pub fn is_sync(&self) -> bool {
        matches!(self, Self::Sync(_))
    }

    /// Starts the operation and returns its outcome as a future.
    ///
    /// Sync bodies run immediately; the returned future is already complete.
    pub fn call(&self, value: Value) -> StepFuture {
        match self {
            Self::Sync(body) => future::ready(body(value)).boxed(),
            Self::Async(body) => body(value),
        }
    }
}

impl Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// One-shot completion handle for callback-style async steps.
#[derive(Debug)]
pub struct Completion {
    sender: oneshot::Sender<StepResult>,
}

impl Completion {
    /// Completes the step with a result.
    pub fn complete(self, result: StepResult) {
        // The run may have been abandoned (e.g. a failed parallel sibling).
        let _ = self.sender.send(result);
    }

    /// Completes the step with a value.
    pub fn ok(self, value: Value) {
        self.complete(Ok(value));
    }

    /// Fails the step.
    pub fn fail(self, error: impl Into<anyhow::Error>) {
        self.complete(Err(error.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Doubler;

    #[async_trait]
    impl AsyncStep for Doubler {
        fn name(&self) -> &str {
            "doubler"
        }

        async fn call(&self, value: Value) -> StepResult {
            let n = value.as_i64().ok_or_else(|| anyhow::anyhow!("not a number"))?;
            Ok(json!(n * 2))
        }
    }

    #[tokio::test]
    async fn test_sync_operation() {
        let op = Operation::map(|v| json!(v.as_i64().unwrap() + 1));
        assert_eq!(op.kind(), OperationKind::Sync);
        assert_eq!(op.call(json!(1)).await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn test_async_operation() {
        let op = Operation::from_async(|v: Value| async move { Ok(json!([v])) });
        assert!(!op.is_sync());
        assert_eq!(op.call(json!(7)).await.unwrap(), json!([7]));
    }

    #[tokio::test]
    async fn test_callback_operation() {
        let op = Operation::from_callback(|v, done| {
            tokio::spawn(async move { done.ok(json!(v.as_i64().unwrap() * 3)) });
        });
        assert_eq!(op.kind(), OperationKind::Async);
        assert_eq!(op.call(json!(2)).await.unwrap(), json!(6));
    }

    #[tokio::test]
    async fn test_callback_dropped_completion_fails() {
        let op = Operation::from_callback(|_v, done| drop(done));
        let err = op.call(json!(null)).await.unwrap_err();
        assert!(err.to_string().contains("dropped its completion"));
    }

    #[tokio::test]
    async fn test_step_operation() {
        let op = Operation::from_step(Arc::new(Doubler));
        assert_eq!(op.call(json!(21)).await.unwrap(), json!(42));
        assert!(op.call(json!("x")).await.is_err());
    }
}

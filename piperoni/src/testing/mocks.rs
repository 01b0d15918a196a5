//! Mock steps for testing pipelines.

use crate::core::{AsyncStep, Operation, StepResult, Value};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Records every value that flows through it.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Value>>>,
}

impl Recorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a sync pass-through step that records its input.
    #[must_use]
    pub fn operation(&self) -> Operation {
        let seen = self.seen.clone();
        Operation::map(move |value| {
            seen.lock().push(value.clone());
            value
        })
    }

    /// Returns the recorded values.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.seen.lock().clone()
    }

    /// Returns how many values were recorded.
    #[must_use]
    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }
}

/// An async step that sleeps, then passes the value through.
#[derive(Debug)]
pub struct SlowStep {
    name: String,
    delay: Duration,
    calls: Mutex<usize>,
}

impl SlowStep {
    /// Creates a slow step.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
            calls: Mutex::new(0),
        }
    }

    /// Returns how many times the step ran.
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl AsyncStep for SlowStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, value: Value) -> StepResult {
        *self.calls.lock() += 1;
        tokio::time::sleep(self.delay).await;
        Ok(value)
    }
}

/// An async step that always fails.
#[derive(Debug)]
pub struct FailingStep {
    name: String,
    error: String,
}

impl FailingStep {
    /// Creates a failing step.
    #[must_use]
    pub fn new(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: error.into(),
        }
    }
}

#[async_trait]
impl AsyncStep for FailingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, _value: Value) -> StepResult {
        Err(anyhow::anyhow!("{}", self.error))
    }
}

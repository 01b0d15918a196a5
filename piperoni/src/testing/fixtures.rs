//! Operation constructors for pipeline tests.
//!
//! Each fixture has the shape of a registered constructor, so it can be
//! passed straight to [`Pipeline::register`](crate::pipeline::Pipeline::register).

use crate::core::{Arg, Operation, TagTransform, Value};
use crate::errors::{ArgumentError, PipelineError, ResolutionError};
use crate::pipeline::Pipeline;
use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Delay used by [`wait_and_increment`] when none is given.
pub const DEFAULT_DELAY_MS: u64 = 5;

fn amount(name: &str, args: &[Arg]) -> Result<i64, ArgumentError> {
    match args.first() {
        None => Ok(0),
        Some(arg) => arg
            .as_value()
            .and_then(Value::as_i64)
            .ok_or_else(|| ArgumentError::missing(name, 0, "an integer")),
    }
}

fn delay(name: &str, args: &[Arg]) -> Result<Duration, ArgumentError> {
    match args.get(1) {
        None => Ok(Duration::from_millis(DEFAULT_DELAY_MS)),
        Some(arg) => arg
            .as_value()
            .and_then(Value::as_u64)
            .map(Duration::from_millis)
            .ok_or_else(|| ArgumentError::missing(name, 1, "a delay in milliseconds")),
    }
}

fn plus(value: &Value, by: i64) -> anyhow::Result<Value> {
    value
        .as_i64()
        .map(|n| Value::from(n + by))
        .ok_or_else(|| anyhow!("expected an integer, got {value}"))
}

/// `increment(n)`: sync step adding `n`.
pub fn increment(args: &[Arg]) -> Result<Operation, ArgumentError> {
    let by = amount("increment", args)?;
    Ok(Operation::sync(move |value| plus(&value, by)))
}

/// `incrementErr(n)`: sync step that always raises.
pub fn increment_err(args: &[Arg]) -> Result<Operation, ArgumentError> {
    amount("incrementErr", args)?;
    Ok(Operation::sync(|_| Err(anyhow!("increment failed"))))
}

/// `waitAndIncrement(n, delay_ms)`: async step adding `n` after a delay.
pub fn wait_and_increment(args: &[Arg]) -> Result<Operation, ArgumentError> {
    let by = amount("waitAndIncrement", args)?;
    let wait = delay("waitAndIncrement", args)?;
    Ok(Operation::from_async(move |value: Value| async move {
        tokio::time::sleep(wait).await;
        plus(&value, by)
    }))
}

/// `waitAndIncrementErr(n)`: async step that fails after a delay.
pub fn wait_and_increment_err(args: &[Arg]) -> Result<Operation, ArgumentError> {
    amount("waitAndIncrementErr", args)?;
    let wait = delay("waitAndIncrementErr", args)?;
    Ok(Operation::from_async(move |_value: Value| async move {
        tokio::time::sleep(wait).await;
        Err(anyhow!("something went wrong"))
    }))
}

/// `times` tag transform: repeats the region `params[0]` times.
pub fn times(inner: Vec<Operation>, params: &[Arg]) -> Result<Vec<Operation>, ResolutionError> {
    let count = params
        .first()
        .and_then(Arg::as_value)
        .and_then(Value::as_u64)
        .ok_or_else(|| ResolutionError::invalid_params("Times", "expected a repeat count"))?;
    let count = usize::try_from(count)
        .map_err(|_| ResolutionError::invalid_params("Times", "repeat count too large"))?;

    Ok(inner.iter().cloned().cycle().take(inner.len() * count).collect())
}

/// A pipeline with every fixture registered, plus the `times` tag.
#[must_use]
pub fn fixture_pipeline() -> Pipeline {
    let mut pipe = Pipeline::new();
    pipe.register("increment", increment)
        .register("incrementErr", increment_err)
        .register("waitAndIncrement", wait_and_increment)
        .register("waitAndIncrementErr", wait_and_increment_err)
        .register_tags([("times", Arc::new(times) as TagTransform)]);
    pipe
}

/// Runs `pipe` through [`Pipeline::out`] and waits for the callback.
///
/// # Errors
///
/// Returns the error `out` raised synchronously, or the one delivered to
/// the callback.
pub async fn deliver(pipe: &mut Pipeline) -> Result<Value, PipelineError> {
    let (sender, receiver) = oneshot::channel();
    pipe.out(move |outcome| {
        let _ = sender.send(outcome);
    })?;
    receiver
        .await
        .map_err(|_| PipelineError::Internal("completion callback was dropped".to_string()))?
}

//! Built-in control-flow tags: `parallel`, `which` and `maybe`.

use crate::core::value::{index, is_truthy};
use crate::core::{Arg, ArgFn, Operation, StepResult, SyncFn, TagTransform, Value};
use crate::errors::ResolutionError;
use anyhow::anyhow;
use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Returns the built-in tags, ready for `register_tags`.
#[must_use]
pub fn builtin_tags() -> Vec<(&'static str, TagTransform)> {
    vec![
        ("parallel", Arc::new(parallel) as TagTransform),
        ("which", Arc::new(which) as TagTransform),
        ("maybe", Arc::new(maybe) as TagTransform),
    ]
}

/// Runs every inner operation concurrently against the same input.
///
/// The composite completes with an array of results in declaration order.
/// The first failure observed fails the composite. Inside a tokio runtime
/// each branch runs on its own task, and branches still running at that
/// point are detached with their output discarded. Without a runtime the
/// branches are polled in place and dropped on failure.
pub fn parallel(
    inner: Vec<Operation>,
    _params: &[Arg],
) -> Result<Vec<Operation>, ResolutionError> {
    let branches: Arc<[Operation]> = inner.into();
    Ok(vec![Operation::Async(Arc::new(move |value: Value| {
        run_branches(branches.clone(), value).boxed()
    }))])
}

async fn run_branches(branches: Arc<[Operation]>, value: Value) -> StepResult {
    let runtime = Handle::try_current().ok();
    if runtime.is_none() {
        debug!(branches = branches.len(), "no tokio runtime; polling parallel branches in place");
    }

    let mut pending: FuturesUnordered<BoxFuture<'static, (usize, StepResult)>> = branches
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, op)| {
            let input = value.clone();
            match &runtime {
                Some(handle) => {
                    let handle = handle.spawn(async move { op.call(input).await });
                    async move {
                        let outcome = handle
                            .await
                            .map_err(|err| {
                                anyhow!("parallel branch {index} did not complete: {err}")
                            })
                            .and_then(|result| result);
                        (index, outcome)
                    }
                    .boxed()
                }
                None => async move { (index, op.call(input).await) }.boxed(),
            }
        })
        .collect();

    let mut results: Vec<Option<Value>> = vec![None; branches.len()];

    while let Some((index, outcome)) = pending.next().await {
        match outcome {
            Ok(result) => results[index] = Some(result),
            Err(err) => {
                if !pending.is_empty() {
                    warn!(
                        branch = index,
                        abandoned = pending.len(),
                        "parallel branch failed; discarding remaining branches"
                    );
                }
                return Err(err);
            }
        }
    }

    Ok(Value::Array(results.into_iter().flatten().collect()))
}

/// Runs only the inner operation picked by the selector.
///
/// The selector is the last param and maps the input to an index. The
/// composite is sync when every inner operation is sync.
pub fn which(inner: Vec<Operation>, params: &[Arg]) -> Result<Vec<Operation>, ResolutionError> {
    let selector = last_callable("Which", params)?;

    let sync_branches: Option<Vec<SyncFn>> = inner
        .iter()
        .map(|op| match op {
            Operation::Sync(body) => Some(body.clone()),
            Operation::Async(_) => None,
        })
        .collect();

    if let Some(bodies) = sync_branches {
        return Ok(vec![Operation::Sync(Arc::new(move |value: Value| -> StepResult {
            let chosen = index(&selector(&value), bodies.len())?;
            bodies[chosen](value)
        }))]);
    }

    let branches: Arc<[Operation]> = inner.into();
    Ok(vec![Operation::Async(Arc::new(move |value: Value| {
        match index(&selector(&value), branches.len()) {
            Ok(chosen) => branches[chosen].call(value),
            Err(err) => future::ready(Err(err)).boxed(),
        }
    }))])
}

/// Guards each inner operation with the predicate passed as the last param.
///
/// The predicate is checked at each guarded step against the value flowing
/// at that step, so one guarded step can change the outcome for the next.
pub fn maybe(inner: Vec<Operation>, params: &[Arg]) -> Result<Vec<Operation>, ResolutionError> {
    let predicate = last_callable("Maybe", params)?;

    Ok(inner
        .into_iter()
        .map(|op| {
            let predicate = predicate.clone();
            match op {
                Operation::Sync(body) => Operation::Sync(Arc::new(move |value: Value| {
                    if is_truthy(&predicate(&value)) {
                        body(value)
                    } else {
                        Ok(value)
                    }
                })),
                Operation::Async(body) => Operation::Async(Arc::new(move |value: Value| {
                    if is_truthy(&predicate(&value)) {
                        body(value)
                    } else {
                        future::ready(Ok(value)).boxed()
                    }
                })),
            }
        })
        .collect())
}

fn last_callable(tag: &str, params: &[Arg]) -> Result<ArgFn, ResolutionError> {
    params
        .last()
        .and_then(Arg::as_unary)
        .cloned()
        .ok_or_else(|| ResolutionError::invalid_params(tag, "last parameter must be a function"))
}

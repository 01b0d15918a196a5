//! Test assertions for pipeline outcomes.

use crate::core::{OperationKind, Value};
use crate::errors::PipelineError;

/// Asserts that the run succeeded with `expected`.
pub fn assert_delivered(outcome: &Result<Value, PipelineError>, expected: &Value) {
    match outcome {
        Ok(value) => assert_eq!(value, expected, "Expected {expected}, got {value}"),
        Err(err) => panic!("Expected {expected}, got error: {err}"),
    }
}

/// Asserts that step `index` of the given kind failed.
pub fn assert_step_failed(
    outcome: &Result<Value, PipelineError>,
    kind: OperationKind,
    index: usize,
) {
    match outcome {
        Err(PipelineError::Step(step)) => {
            assert_eq!(step.kind, kind, "Expected a {kind} step failure, got {step}");
            assert_eq!(step.index, index, "Expected step {index} to fail, got {step}");
        }
        other => panic!("Expected {kind} step {index} to fail, got {other:?}"),
    }
}

/// Asserts that tag resolution failed, optionally for a specific tag.
pub fn assert_resolution_failed<T: std::fmt::Debug>(
    outcome: &Result<T, PipelineError>,
    tag: Option<&str>,
) {
    match outcome {
        Err(PipelineError::Resolution(err)) => {
            if let Some(tag) = tag {
                assert_eq!(err.tag.as_deref(), Some(tag), "Expected tag {tag}, got {err}");
            }
        }
        other => panic!("Expected a resolution error, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ResolutionError, StepError};
    use serde_json::json;

    #[test]
    fn test_assert_delivered() {
        assert_delivered(&Ok(json!(1)), &json!(1));
    }

    #[test]
    #[should_panic(expected = "Expected 2")]
    fn test_assert_delivered_mismatch() {
        assert_delivered(&Ok(json!(1)), &json!(2));
    }

    #[test]
    fn test_assert_step_failed() {
        let outcome: Result<Value, PipelineError> =
            Err(StepError::new(OperationKind::Async, 2, anyhow::anyhow!("x")).into());
        assert_step_failed(&outcome, OperationKind::Async, 2);
    }

    #[test]
    fn test_assert_resolution_failed() {
        let outcome: Result<(), PipelineError> =
            Err(ResolutionError::unresolved("Times", 0).into());
        assert_resolution_failed(&outcome, Some("Times"));
        assert_resolution_failed(&outcome, None);
    }
}

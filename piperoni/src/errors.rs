//! Error types for piperoni pipelines.
//!
//! Every failure a caller can observe is a [`PipelineError`]. The variants
//! wrap one struct per failure class so that callers can match on the class
//! and still reach the structured details.

use crate::core::OperationKind;
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A registered constructor does not yield a well-formed operation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The staged sequence could not be rewritten into plain operations.
    #[error("{0}")]
    Resolution(#[from] ResolutionError),

    /// A name is unknown to both the registry and the function library.
    #[error("{0}")]
    UnknownOperation(#[from] UnknownOperationError),

    /// A constructor rejected the arguments it was invoked with.
    #[error("{0}")]
    Argument(#[from] ArgumentError),

    /// A step failed while the pipeline was running.
    #[error("{0}")]
    Step(#[from] StepError),

    /// A run was started outside of a tokio runtime.
    #[error("No tokio runtime available to schedule the run")]
    RuntimeUnavailable,

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Returns a stable short code for the error class.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::Resolution(_) => "RESOLUTION",
            Self::UnknownOperation(_) => "UNKNOWN_OPERATION",
            Self::Argument(_) => "ARGUMENT",
            Self::Step(err) => match err.kind {
                OperationKind::Sync => "SYNC_STEP",
                OperationKind::Async => "ASYNC_STEP",
            },
            Self::RuntimeUnavailable => "RUNTIME_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Returns the step error if this is a step failure.
    #[must_use]
    pub fn as_step(&self) -> Option<&StepError> {
        match self {
            Self::Step(err) => Some(err),
            _ => None,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = match self {
            Self::Resolution(err) => err.to_dict(),
            Self::Step(err) => err.to_dict(),
            _ => HashMap::new(),
        };
        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Error raised by `validate()` when a constructor is malformed.
#[derive(Debug, Clone, Error)]
#[error("Operation '{name}' is not a valid constructor: {reason}")]
pub struct ValidationError {
    /// The registered name.
    pub name: String,
    /// Why the constructor was rejected.
    pub reason: String,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Error raised when control-flow tags cannot be resolved.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ResolutionError {
    /// The error message.
    pub message: String,
    /// The tag involved, if known.
    pub tag: Option<String>,
    /// Position in the staged sequence, if known.
    pub position: Option<usize>,
}

impl ResolutionError {
    /// Creates a new resolution error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tag: None,
            position: None,
        }
    }

    /// A close marker with no open marker of the same tag before it.
    #[must_use]
    pub fn unmatched_close(tag: &str, position: usize) -> Self {
        Self::new(format!("No matching begin tag for: {tag}"))
            .with_tag(tag)
            .with_position(position)
    }

    /// A marker that survived resolution.
    #[must_use]
    pub fn unresolved(tag: &str, position: usize) -> Self {
        Self::new(format!("Tag not resolved: {tag}"))
            .with_tag(tag)
            .with_position(position)
    }

    /// Two distinct tag regions overlap without nesting.
    #[must_use]
    pub fn interleaved(outer: &str, inner: &str, position: usize) -> Self {
        Self::new(format!(
            "Tag '{inner}' opened inside '{outer}' is not closed before '{outer}' closes"
        ))
        .with_tag(outer)
        .with_position(position)
    }

    /// A tag transform received parameters it cannot use.
    #[must_use]
    pub fn invalid_params(tag: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(format!("Invalid parameters for tag '{tag}': {reason}")).with_tag(tag)
    }

    /// Sets the tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the position.
    #[must_use]
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("message".to_string(), serde_json::json!(self.message));
        if let Some(ref tag) = self.tag {
            map.insert("tag".to_string(), serde_json::json!(tag));
        }
        if let Some(position) = self.position {
            map.insert("position".to_string(), serde_json::json!(position));
        }
        map
    }
}

/// Error raised when invoking a name that nothing provides.
#[derive(Debug, Clone, Error)]
#[error("Method not added to pipe: {name}")]
pub struct UnknownOperationError {
    /// The requested name.
    pub name: String,
}

impl UnknownOperationError {
    /// Creates a new unknown operation error.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Error raised when a constructor cannot use its arguments.
#[derive(Debug, Clone, Error)]
#[error("Bad arguments for '{operation}': {reason}")]
pub struct ArgumentError {
    /// The operation being constructed.
    pub operation: String,
    /// What was wrong.
    pub reason: String,
}

impl ArgumentError {
    /// Creates a new argument error.
    #[must_use]
    pub fn new(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// A required argument is missing.
    #[must_use]
    pub fn missing(operation: impl Into<String>, index: usize, expected: &str) -> Self {
        Self::new(operation, format!("argument {index} must be {expected}"))
    }
}

/// Error raised when a step body fails during a run.
#[derive(Debug, Error)]
#[error("{kind} step {index} failed: {source}")]
pub struct StepError {
    /// Whether the failing step was sync or async.
    pub kind: OperationKind,
    /// Index of the step in the resolved sequence.
    pub index: usize,
    /// The error raised by the step body.
    #[source]
    pub source: anyhow::Error,
}

impl StepError {
    /// Creates a new step error.
    #[must_use]
    pub fn new(kind: OperationKind, index: usize, source: anyhow::Error) -> Self {
        Self {
            kind,
            index,
            source,
        }
    }

    /// Whether the step was synchronous.
    #[must_use]
    pub fn is_sync(&self) -> bool {
        self.kind == OperationKind::Sync
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), serde_json::json!(self.kind.to_string()));
        map.insert("index".to_string(), serde_json::json!(self.index));
        map.insert("source".to_string(), serde_json::json!(format!("{:#}", self.source)));
        map
    }
}

//! Core domain model types for piperoni.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Operation descriptors (sync and async steps)
//! - Invocation arguments
//! - Staged entries and tag markers
//! - Value helpers shared by the built-in operations

mod arg;
mod kind;
mod operation;
mod staged;
pub mod value;

pub use arg::{Arg, ArgFn, ArgFn2};
pub use kind::{OperationKind, TagRole};
pub use operation::{
    AsyncFn, AsyncStep, Completion, Operation, StepFuture, StepResult, SyncFn, Value,
};
pub use staged::{Staged, TagMarker, TagTransform};

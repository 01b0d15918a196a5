//! Execution scheduler.
//!
//! A run is an explicit state machine over a resolved sequence. Sync steps
//! execute in place; an async step suspends the run until its future
//! resolves. Only the synchronous prefix of a run executes on the caller's
//! stack; everything after the first suspension runs on a spawned task.

mod execution;

pub use execution::{Execution, RunState, Suspension};

//! Testing utilities for piperoni pipelines.
//!
//! This module provides:
//! - Fixture constructors mirroring common step shapes
//! - Mock steps that record or delay values
//! - Assertions for run outcomes

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_delivered, assert_resolution_failed, assert_step_failed};
pub use fixtures::{
    deliver, fixture_pipeline, increment, increment_err, times, wait_and_increment,
    wait_and_increment_err, DEFAULT_DELAY_MS,
};
pub use mocks::{FailingStep, Recorder, SlowStep};

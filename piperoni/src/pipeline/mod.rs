//! Pipeline building and execution.
//!
//! This module provides:
//! - Pipeline configuration
//! - The chainable [`Pipeline`] with its registry and staged sequence
//! - Callback and future based runs

mod config;
mod state;


pub use config::{PipelineConfig, DEFAULT_PIPELINE_NAME};
pub use state::Pipeline;

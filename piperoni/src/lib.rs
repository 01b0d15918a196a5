//! # Piperoni
//!
//! Chainable data-transformation pipelines mixing sync and async steps.
//!
//! Piperoni provides:
//!
//! - **Named operations**: register constructors once, stage them by name
//! - **Sync and async steps**: one left fold, suspending only at async steps
//! - **Control-flow tags**: `parallel`, `which`, `maybe`, and your own
//! - **Function library fallback**: `map`, `reduce` and friends out of the box
//! - **Snapshot runs**: staging after a run starts never affects that run
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use piperoni::prelude::*;
//!
//! let mut pipe = Pipeline::new();
//! pipe.register("add", |args: &[Arg]| {
//!     let n = args.first().and_then(Arg::as_value).and_then(Value::as_i64).unwrap_or(0);
//!     Ok(Operation::map(move |v| Value::from(v.as_i64().unwrap_or(0) + n)))
//! });
//!
//! pipe.invoke("startParallel", &[])?
//!     .invoke("add", &[Arg::from(1)])?
//!     .invoke("add", &[Arg::from(2)])?
//!     .invoke("stopParallel", &[])?
//!     .invoke("sum", &[])?;
//!
//! let total = pipe.run(Value::from(0)).await?;
//! assert_eq!(total, Value::from(3));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod core;
pub mod errors;
pub mod library;
pub mod pipeline;
pub mod registry;
pub mod scheduler;
pub mod tags;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        Arg, AsyncStep, Completion, Operation, OperationKind, Staged, StepResult, TagTransform,
        Value,
    };
    pub use crate::errors::{
        ArgumentError, PipelineError, ResolutionError, StepError, UnknownOperationError,
        ValidationError,
    };
    pub use crate::library::{CoreLibrary, EmptyLibrary, FunctionLibrary};
    pub use crate::pipeline::{Pipeline, PipelineConfig};
    pub use crate::registry::{Constructor, OperationRegistry};
}

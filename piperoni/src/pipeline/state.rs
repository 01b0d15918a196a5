//! Pipeline state: registry, staged sequence and pending input.

use super::PipelineConfig;
use crate::core::{Arg, Operation, Staged, TagTransform, Value};
use crate::errors::{ArgumentError, PipelineError, UnknownOperationError};
use crate::library::{CoreLibrary, FunctionLibrary};
use crate::registry::{Constructor, OperationRegistry};
use crate::scheduler::Execution;
use crate::tags::{builtin_tags, resolve};
use futures::future::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info};

/// A chainable pipeline of sync and async steps.
///
/// Building mutates the pipeline through `&mut self`. Running only needs
/// `&self`: each run snapshots the staged sequence first, so steps staged
/// after a run starts never affect it, and runs can overlap.
pub struct Pipeline {
    config: PipelineConfig,
    registry: OperationRegistry,
    staged: Vec<Staged>,
    input: Option<Value>,
    library: Arc<dyn FunctionLibrary>,
}

impl Pipeline {
    /// Creates a pipeline with the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Creates a pipeline with the given config.
    #[must_use]
    pub fn with_config(config: PipelineConfig) -> Self {
        let mut registry = OperationRegistry::new();
        if config.builtin_tags {
            registry.register_tags(builtin_tags());
        }
        Self {
            config,
            registry,
            staged: Vec::new(),
            input: None,
            library: Arc::new(CoreLibrary),
        }
    }

    /// Replaces the fallback function library.
    #[must_use]
    pub fn with_library(mut self, library: Arc<dyn FunctionLibrary>) -> Self {
        self.library = library;
        self
    }

    /// Returns the config.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Registers an operation constructor under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, ctor: F) -> &mut Self
    where
        F: Fn(&[Arg]) -> Result<Operation, ArgumentError> + Send + Sync + 'static,
    {
        self.registry.register(name, ctor);
        self
    }

    /// Registers a shared constructor under `name`.
    pub fn register_constructor(
        &mut self,
        name: impl Into<String>,
        ctor: Constructor,
    ) -> &mut Self {
        self.registry.register_constructor(name, ctor);
        self
    }

    /// Registers tags, installing `start<Tag>` and `stop<Tag>` for each.
    pub fn register_tags<I, K>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, TagTransform)>,
        K: AsRef<str>,
    {
        self.registry.register_tags(tags);
        self
    }

    /// Copies another registry's names into this pipeline.
    pub fn merge(&mut self, other: &OperationRegistry) -> &mut Self {
        self.registry.merge(other);
        self
    }

    /// Copies another pipeline's names, but not its staged steps.
    pub fn mixin(&mut self, other: &Self) -> &mut Self {
        self.merge(&other.registry)
    }

    /// Validates every registered constructor.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] for the first malformed one.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.registry.validate().map_err(Into::into)
    }

    /// Builds the staged entry for `name`, looking in the registry first
    /// and then in the function library.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownOperation`] if neither knows the name
    /// and [`PipelineError::Argument`] if the constructor rejects `args`.
    pub fn resolve_name(&self, name: &str, args: &[Arg]) -> Result<Staged, PipelineError> {
        if let Some(entry) = self.registry.get(name) {
            return entry.build(args).map_err(Into::into);
        }
        if self.config.library_fallback {
            if let Some(found) = self.library.lookup(name, args) {
                return Ok(Staged::Op(Operation::Sync(found?)));
            }
        }
        Err(UnknownOperationError::new(name).into())
    }

    /// Stages the operation or marker `name` builds from `args`.
    ///
    /// # Errors
    ///
    /// See [`resolve_name`](Self::resolve_name).
    pub fn invoke(&mut self, name: &str, args: &[Arg]) -> Result<&mut Self, PipelineError> {
        let staged = self.resolve_name(name, args)?;
        debug!(pipeline = %self.config.name, operation = %name, "staged");
        self.staged.push(staged);
        Ok(self)
    }

    /// Stages an operation directly, without a registered name.
    pub fn push(&mut self, op: Operation) -> &mut Self {
        self.staged.push(Staged::Op(op));
        self
    }

    /// Sets the input used by [`out`](Self::out).
    pub fn input(&mut self, value: Value) -> &mut Self {
        self.input = Some(value);
        self
    }

    /// Returns the pending input, if set.
    #[must_use]
    pub fn pending_input(&self) -> Option<&Value> {
        self.input.as_ref()
    }

    /// Returns the staged sequence.
    #[must_use]
    pub fn staged(&self) -> &[Staged] {
        &self.staged
    }

    /// Returns the number of staged entries, markers included.
    #[must_use]
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Returns every registered name, sorted.
    #[must_use]
    pub fn registered_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Drops every staged step. Registered names are kept.
    pub fn clear(&mut self) -> &mut Self {
        self.staged.clear();
        self
    }

    /// Snapshots the staged sequence and resolves its tags into a run
    /// positioned before the first step.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Resolution`] if the tags cannot be resolved.
    pub fn prepare(&self, input: Value) -> Result<Execution, PipelineError> {
        let plan = resolve(self.staged.clone())?;
        let execution = Execution::new(self.config.name.clone(), plan, input);
        info!(
            pipeline = %self.config.name,
            run_id = %execution.run_id(),
            steps = execution.len(),
            "starting run"
        );
        Ok(execution)
    }

    /// Runs the pipeline against `input` and hands the outcome to `callback`.
    ///
    /// The callback always runs on a spawned task, never before this call
    /// returns. Failures that happen before the first async step are
    /// returned from this call instead and the callback is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RuntimeUnavailable`] outside a tokio runtime,
    /// [`PipelineError::Resolution`] for unresolvable tags, and
    /// [`PipelineError::Step`] for a sync step raising before the first
    /// suspension.
    pub fn exec<F>(&self, input: Value, callback: F) -> Result<(), PipelineError>
    where
        F: FnOnce(Result<Value, PipelineError>) + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| PipelineError::RuntimeUnavailable)?;
        let mut execution = self.prepare(input)?;
        let pending = execution.advance()?;
        runtime.spawn(async move {
            let outcome = execution.finish(pending).await;
            callback(outcome);
        });
        Ok(())
    }

    /// Runs the pipeline against the pending input.
    ///
    /// # Errors
    ///
    /// See [`exec`](Self::exec).
    pub fn out<F>(&mut self, callback: F) -> Result<&mut Self, PipelineError>
    where
        F: FnOnce(Result<Value, PipelineError>) + Send + 'static,
    {
        let input = self.input.clone().unwrap_or(Value::Null);
        self.exec(input, callback)?;
        Ok(self)
    }

    /// Runs the pipeline against `input`, returning the outcome as a future.
    ///
    /// The staged sequence is captured when this is called, not when the
    /// future is first polled.
    pub fn run(
        &self,
        input: Value,
    ) -> impl Future<Output = Result<Value, PipelineError>> + Send + 'static {
        let prepared = self.prepare(input);
        async move {
            let mut execution = prepared?;
            let pending = execution.advance()?;
            execution.finish(pending).await
        }
    }

    /// Wraps this pipeline, as currently staged, into one async operation.
    ///
    /// Later changes to this pipeline do not affect the operation.
    #[must_use]
    pub fn as_operation(&self, name: impl Into<String>) -> Operation {
        let mut nested = self.clone();
        nested.config.name = name.into();
        let nested = Arc::new(nested);
        Operation::Async(Arc::new(move |value: Value| {
            nested.run(value).map(|outcome| outcome.map_err(anyhow::Error::from)).boxed()
        }))
    }

    /// Returns a constructor that stages [`as_operation`](Self::as_operation).
    #[must_use]
    pub fn as_constructor(&self, name: impl Into<String>) -> Constructor {
        let op = self.as_operation(name);
        Arc::new(move |_args: &[Arg]| Ok(op.clone()))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Pipeline {
    /// Copies the registry and the staged sequence. The pending input is
    /// not copied.
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            registry: self.registry.clone(),
            staged: self.staged.clone(),
            input: None,
            library: self.library.clone(),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("staged", &self.staged.len())
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

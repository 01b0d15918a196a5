//! Operation registry.
//!
//! Maps names to constructors. Invoking a name produces the staged entry to
//! append: an operation for plain constructors, or a tag marker for the
//! `start<Tag>`/`stop<Tag>` pair installed by [`OperationRegistry::register_tag`].

use crate::core::{Arg, Operation, Staged, TagMarker, TagTransform};
use crate::errors::{ArgumentError, ValidationError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Builds an operation from invocation arguments.
pub type Constructor = Arc<dyn Fn(&[Arg]) -> Result<Operation, ArgumentError> + Send + Sync>;

/// A registered name.
#[derive(Clone)]
pub enum Entry {
    /// Produces an operation.
    Operation(Constructor),
    /// `start<Tag>`: produces an open marker capturing the call's args.
    OpenTag {
        /// The tag name.
        tag: String,
        /// Transform applied to the region at resolution.
        transform: TagTransform,
    },
    /// `stop<Tag>`: produces a close marker.
    CloseTag {
        /// The tag name.
        tag: String,
    },
}

impl Entry {
    /// Builds the staged entry for an invocation.
    pub fn build(&self, args: &[Arg]) -> Result<Staged, ArgumentError> {
        match self {
            Self::Operation(ctor) => ctor(args).map(Staged::Op),
            Self::OpenTag { tag, transform } => Ok(Staged::Marker(TagMarker::open(
                tag.clone(),
                args.to_vec(),
                transform.clone(),
            ))),
            Self::CloseTag { tag } => Ok(Staged::Marker(TagMarker::close(tag.clone()))),
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operation(_) => f.write_str("Operation(..)"),
            Self::OpenTag { tag, .. } => write!(f, "OpenTag({tag})"),
            Self::CloseTag { tag } => write!(f, "CloseTag({tag})"),
        }
    }
}

/// Returns the canonical tag name and its open/close method names.
///
/// `"times"` becomes `("Times", "startTimes", "stopTimes")`. An empty name
/// is not rejected: it yields `("", "start", "stop")`, so registering it
/// installs bare `start` and `stop` entries.
#[must_use]
pub fn tag_names(name: &str) -> (String, String, String) {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    let tag = chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect::<String>())
        .unwrap_or_default();
    let start = format!("start{tag}");
    let stop = format!("stop{tag}");
    (tag, start, stop)
}

/// Registry of named constructors.
#[derive(Clone, Default)]
pub struct OperationRegistry {
    entries: HashMap<String, Entry>,
}

impl OperationRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation constructor.
    pub fn register<F>(&mut self, name: impl Into<String>, ctor: F)
    where
        F: Fn(&[Arg]) -> Result<Operation, ArgumentError> + Send + Sync + 'static,
    {
        self.register_constructor(name, Arc::new(ctor));
    }

    /// Registers an already shared constructor.
    pub fn register_constructor(&mut self, name: impl Into<String>, ctor: Constructor) {
        let name = name.into();
        debug!(operation = %name, "registered operation");
        self.entries.insert(name, Entry::Operation(ctor));
    }

    /// Registers a tag, installing its `start<Tag>` and `stop<Tag>` names.
    pub fn register_tag(&mut self, name: &str, transform: TagTransform) {
        let (tag, start, stop) = tag_names(name);
        debug!(tag = %tag, start = %start, stop = %stop, "registered tag");
        self.entries.insert(
            start,
            Entry::OpenTag {
                tag: tag.clone(),
                transform,
            },
        );
        self.entries.insert(stop, Entry::CloseTag { tag });
    }

    /// Registers several tags at once.
    pub fn register_tags<I, K>(&mut self, tags: I)
    where
        I: IntoIterator<Item = (K, TagTransform)>,
        K: AsRef<str>,
    {
        for (name, transform) in tags {
            self.register_tag(name.as_ref(), transform);
        }
    }

    /// Copies every entry of `other` into this registry.
    ///
    /// Names present in both end up with `other`'s entry.
    pub fn merge(&mut self, other: &Self) {
        for (name, entry) in &other.entries {
            self.entries.insert(name.clone(), entry.clone());
        }
    }

    /// Checks that every operation constructor yields an operation when
    /// invoked without arguments.
    ///
    /// # Errors
    ///
    /// Returns the first failing constructor, in name order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for name in self.names() {
            if let Some(Entry::Operation(ctor)) = self.entries.get(&name) {
                ctor(&[]).map_err(|err| ValidationError::new(&name, err.reason))?;
            }
        }
        Ok(())
    }

    /// Looks up a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Returns true if the name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns all registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("names", &self.names())
            .finish()
    }
}

//! Staged entries and tag markers.

use super::{Arg, Operation, TagRole};
use crate::errors::ResolutionError;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Rewrites the operations of a region given the open marker's params.
pub type TagTransform =
    Arc<dyn Fn(Vec<Operation>, &[Arg]) -> Result<Vec<Operation>, ResolutionError> + Send + Sync>;

/// Boundary of a control-flow region inside a staged sequence.
#[derive(Clone)]
pub struct TagMarker {
    tag: String,
    role: TagRole,
    params: Vec<Arg>,
    transform: Option<TagTransform>,
}

impl TagMarker {
    /// Creates an open marker carrying params and the region transform.
    #[must_use]
    pub fn open(tag: impl Into<String>, params: Vec<Arg>, transform: TagTransform) -> Self {
        Self {
            tag: tag.into(),
            role: TagRole::Open,
            params,
            transform: Some(transform),
        }
    }

    /// Creates a close marker.
    #[must_use]
    pub fn close(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            role: TagRole::Close,
            params: Vec::new(),
            transform: None,
        }
    }

    /// Returns the tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the marker role.
    #[must_use]
    pub fn role(&self) -> TagRole {
        self.role
    }

    /// Returns true for open markers.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.role == TagRole::Open
    }

    /// Returns the params captured by an open marker.
    #[must_use]
    pub fn params(&self) -> &[Arg] {
        &self.params
    }

    /// Returns the transform captured by an open marker.
    #[must_use]
    pub fn transform(&self) -> Option<&TagTransform> {
        self.transform.as_ref()
    }
}

impl Debug for TagMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagMarker")
            .field("tag", &self.tag)
            .field("role", &self.role)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// One entry of a staged sequence.
#[derive(Debug, Clone)]
pub enum Staged {
    /// A plain operation.
    Op(Operation),
    /// A region boundary.
    Marker(TagMarker),
}

impl Staged {
    /// Returns the marker, if this entry is one.
    #[must_use]
    pub fn as_marker(&self) -> Option<&TagMarker> {
        match self {
            Self::Marker(marker) => Some(marker),
            Self::Op(_) => None,
        }
    }

    /// Returns true for close markers.
    #[must_use]
    pub fn is_close(&self) -> bool {
        self.as_marker().is_some_and(|m| m.role() == TagRole::Close)
    }

    /// Returns true for open markers.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.as_marker().is_some_and(TagMarker::is_open)
    }
}

impl From<Operation> for Staged {
    fn from(op: Operation) -> Self {
        Self::Op(op)
    }
}

impl From<TagMarker> for Staged {
    fn from(marker: TagMarker) -> Self {
        Self::Marker(marker)
    }
}

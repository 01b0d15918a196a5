//! Operation kind and tag role enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an operation completes.
///
/// Decided once, when the operation is constructed, and never inferred from
/// the shape of its body afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Returns its result before the scheduler moves on.
    Sync,
    /// Completes later; the scheduler suspends until it does.
    Async,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => write!(f, "sync"),
            Self::Async => write!(f, "async"),
        }
    }
}

/// Which end of a control-flow region a marker delimits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagRole {
    /// `start<Tag>`: opens a region and carries its params and transform.
    Open,
    /// `stop<Tag>`: closes the nearest open region of the same tag.
    Close,
}

impl fmt::Display for TagRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Close => write!(f, "close"),
        }
    }
}

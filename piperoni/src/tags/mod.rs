//! Control-flow tags.
//!
//! A tag delimits a region of a staged sequence with a `start<Tag>` and a
//! `stop<Tag>` marker. Right before a run, [`resolve`] hands each region's
//! operations to the tag's transform and splices the result back in.

mod builtin;
mod resolver;

pub use builtin::{builtin_tags, maybe, parallel, which};
pub use resolver::resolve;

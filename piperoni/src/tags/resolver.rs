//! Tag resolution.
//!
//! Rewrites a staged snapshot containing paired tag markers into a flat
//! list of operations. The innermost region is always the one closed first,
//! so repeatedly resolving the first close marker against the nearest open
//! marker of the same tag handles arbitrary nesting.

use crate::core::{Operation, Staged};
use crate::errors::ResolutionError;
use tracing::debug;

/// Resolves every tag region in `staged`.
///
/// # Errors
///
/// Returns a [`ResolutionError`] for a close marker without a matching open
/// marker, for regions that overlap without nesting, for transforms that
/// reject their params, and for any marker left once no close marker
/// remains.
pub fn resolve(staged: Vec<Staged>) -> Result<Vec<Operation>, ResolutionError> {
    let mut nodes = staged;

    while let Some(close) = nodes.iter().position(Staged::is_close) {
        let tag = marker_tag(&nodes[close]).to_string();

        let open = nodes[..close]
            .iter()
            .rposition(|node| node.as_marker().is_some_and(|m| m.is_open() && m.tag() == tag))
            .ok_or_else(|| ResolutionError::unmatched_close(&tag, close))?;

        // Any marker left inside the span belongs to a region that started
        // here but closes after `tag` does.
        if let Some((offset, inner)) = nodes[open + 1..close]
            .iter()
            .enumerate()
            .find_map(|(i, node)| node.as_marker().map(|m| (i, m)))
        {
            return Err(ResolutionError::interleaved(&tag, inner.tag(), open + 1 + offset));
        }

        let mut region: Vec<Staged> = nodes.drain(open..=close).collect();
        region.pop();
        let Staged::Marker(start) = region.remove(0) else {
            return Err(ResolutionError::new("open marker vanished during resolution"));
        };
        let inner: Vec<Operation> = region
            .into_iter()
            .filter_map(|node| match node {
                Staged::Op(op) => Some(op),
                Staged::Marker(_) => None,
            })
            .collect();

        let transform = start.transform().ok_or_else(|| {
            ResolutionError::new(format!("Open tag has no transform: {tag}")).with_tag(&tag)
        })?;
        let inner_len = inner.len();
        let replacement = transform(inner, start.params())?;

        debug!(
            tag = %tag,
            position = open,
            inner = inner_len,
            replaced_with = replacement.len(),
            "resolved tag region"
        );

        nodes.splice(open..open, replacement.into_iter().map(Staged::Op));
    }

    nodes
        .into_iter()
        .enumerate()
        .map(|(position, node)| match node {
            Staged::Op(op) => Ok(op),
            Staged::Marker(marker) => Err(ResolutionError::unresolved(marker.tag(), position)),
        })
        .collect()
}

fn marker_tag(node: &Staged) -> &str {
    node.as_marker().map_or("", |m| m.tag())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Arg, OperationKind, TagMarker, TagTransform, Value};
    use serde_json::json;
    use std::sync::Arc;

    fn add(n: i64) -> Staged {
        Staged::Op(Operation::map(move |v: Value| json!(v.as_i64().unwrap() + n)))
    }

    fn times() -> TagTransform {
        Arc::new(|ops: Vec<Operation>, params: &[Arg]| {
            let n = params
                .first()
                .and_then(Arg::as_value)
                .and_then(Value::as_u64)
                .ok_or_else(|| ResolutionError::invalid_params("Times", "expected a count"))?;
            Ok((0..n).flat_map(|_| ops.clone()).collect())
        })
    }

    fn collapse() -> TagTransform {
        Arc::new(|ops: Vec<Operation>, _params: &[Arg]| {
            let count = ops.len();
            Ok(vec![Operation::map(move |_| json!(count))])
        })
    }

    fn open(tag: &str, params: Vec<Arg>, transform: TagTransform) -> Staged {
        Staged::Marker(TagMarker::open(tag, params, transform))
    }

    fn close(tag: &str) -> Staged {
        Staged::Marker(TagMarker::close(tag))
    }

    fn fold(ops: &[Operation], input: Value) -> Value {
        ops.iter().fold(input, |acc, op| match op {
            Operation::Sync(f) => f(acc).unwrap(),
            Operation::Async(_) => panic!("unexpected async op"),
        })
    }

    #[test]
    fn test_no_tags_passes_through() {
        let ops = resolve(vec![add(1), add(2)]).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(fold(&ops, json!(0)), json!(3));
    }

    #[test]
    fn test_region_is_replaced_in_place() {
        let staged = vec![
            add(100),
            open("Times", vec![Arg::from(3)], times()),
            add(1),
            close("Times"),
            add(1000),
        ];
        let ops = resolve(staged).unwrap();
        assert_eq!(ops.len(), 5);
        assert_eq!(fold(&ops, json!(0)), json!(1103));
    }

    #[test]
    fn test_nested_regions_resolve_inside_out() {
        // collapse(times(2)[+1, +1]) sees four resolved ops.
        let staged = vec![
            open("Collapse", vec![], collapse()),
            open("Times", vec![Arg::from(2)], times()),
            add(1),
            add(1),
            close("Times"),
            close("Collapse"),
        ];
        let ops = resolve(staged).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(fold(&ops, json!(0)), json!(4));
    }

    #[test]
    fn test_same_tag_nesting_matches_nearest() {
        let staged = vec![
            open("Times", vec![Arg::from(2)], times()),
            open("Times", vec![Arg::from(3)], times()),
            add(1),
            close("Times"),
            close("Times"),
        ];
        let ops = resolve(staged).unwrap();
        assert_eq!(fold(&ops, json!(0)), json!(6));
    }

    #[test]
    fn test_sibling_regions() {
        let staged = vec![
            open("Times", vec![Arg::from(2)], times()),
            add(1),
            close("Times"),
            open("Collapse", vec![], collapse()),
            add(5),
            add(5),
            close("Collapse"),
        ];
        let ops = resolve(staged).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(fold(&ops, json!(0)), json!(2));
    }

    #[test]
    fn test_unmatched_close() {
        let err = resolve(vec![add(1), close("Times")]).unwrap_err();
        assert_eq!(err.to_string(), "No matching begin tag for: Times");
        assert_eq!(err.position, Some(1));
    }

    #[test]
    fn test_close_does_not_match_other_tag() {
        let staged = vec![open("Collapse", vec![], collapse()), add(1), close("Times")];
        assert!(resolve(staged).is_err());
    }

    #[test]
    fn test_leftover_open_marker() {
        let staged = vec![open("Times", vec![Arg::from(5)], times()), add(1)];
        let err = resolve(staged).unwrap_err();
        assert_eq!(err.to_string(), "Tag not resolved: Times");
    }

    #[test]
    fn test_interleaved_regions_are_rejected() {
        let staged = vec![
            open("Times", vec![Arg::from(2)], times()),
            open("Collapse", vec![], collapse()),
            add(1),
            close("Times"),
            close("Collapse"),
        ];
        let err = resolve(staged).unwrap_err();
        assert!(err.to_string().contains("not closed before"));
        assert_eq!(err.tag.as_deref(), Some("Times"));
    }

    #[test]
    fn test_transform_errors_surface() {
        let staged = vec![open("Times", vec![], times()), add(1), close("Times")];
        let err = resolve(staged).unwrap_err();
        assert!(err.to_string().contains("expected a count"));
    }

    #[test]
    fn test_empty_region() {
        let staged = vec![open("Collapse", vec![], collapse()), close("Collapse")];
        let ops = resolve(staged).unwrap();
        assert_eq!(ops[0].kind(), OperationKind::Sync);
        assert_eq!(fold(&ops, json!(9)), json!(0));
    }
}

//! Fallback function library.
//!
//! When a pipeline is asked for a name it has no constructor for, it asks
//! its [`FunctionLibrary`]. A library answers with a one-argument pure
//! function, already applied to the invocation arguments, which the
//! pipeline stages as a sync operation.

use crate::core::value::{add, is_truthy, multiply};
use crate::core::{Arg, ArgFn, ArgFn2, SyncFn, Value};
use crate::errors::ArgumentError;
use anyhow::anyhow;
use std::sync::Arc;

/// A collection of named pure functions.
#[cfg_attr(test, mockall::automock)]
pub trait FunctionLibrary: Send + Sync {
    /// Returns the function for `name` applied to `args`, or `None` if the
    /// library has no such function.
    fn lookup(&self, name: &str, args: &[Arg]) -> Option<Result<SyncFn, ArgumentError>>;
}

/// A library without any functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLibrary;

impl FunctionLibrary for EmptyLibrary {
    fn lookup(&self, _name: &str, _args: &[Arg]) -> Option<Result<SyncFn, ArgumentError>> {
        None
    }
}

/// Small set of list and arithmetic helpers.
///
/// | name       | args              | input  |
/// |------------|-------------------|--------|
/// | `map`      | unary fn          | array  |
/// | `filter`   | predicate         | array  |
/// | `reduce`   | binary fn, init   | array  |
/// | `sum`      |                   | array  |
/// | `add`      | number            | number |
/// | `multiply` | number            | number |
/// | `identity` |                   | any    |
/// | `always`   | value             | any    |
/// | `head`     |                   | array  |
/// | `last`     |                   | array  |
/// | `length`   |                   | array or string |
/// | `reverse`  |                   | array  |
/// | `prop`     | key               | object |
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreLibrary;

impl CoreLibrary {
    /// Names this library provides.
    pub const NAMES: &'static [&'static str] = &[
        "map", "filter", "reduce", "sum", "add", "multiply", "identity", "always", "head", "last",
        "length", "reverse", "prop",
    ];
}

impl FunctionLibrary for CoreLibrary {
    fn lookup(&self, name: &str, args: &[Arg]) -> Option<Result<SyncFn, ArgumentError>> {
        let built = match name {
            "map" => unary_arg(name, args, 0).map(|f| {
                sync(move |v| {
                    let items = array("map", v)?;
                    Ok(Value::Array(items.iter().map(|item| f(item)).collect()))
                })
            }),
            "filter" => unary_arg(name, args, 0).map(|f| {
                sync(move |v| {
                    let items = array("filter", v)?;
                    Ok(Value::Array(
                        items.into_iter().filter(|item| is_truthy(&f(item))).collect(),
                    ))
                })
            }),
            "reduce" => binary_arg(name, args, 0).map(|f| {
                let init = args.get(1).and_then(Arg::as_value).cloned().unwrap_or(Value::Null);
                sync(move |v| {
                    let items = array("reduce", v)?;
                    Ok(items.iter().fold(init.clone(), |acc, item| f(acc, item)))
                })
            }),
            "sum" => Ok(sync(|v| {
                array("sum", v)?
                    .iter()
                    .try_fold(Value::from(0), |acc, item| add(&acc, item))
            })),
            "add" => value_arg(name, args, 0).map(|n| sync(move |v| add(&v, &n))),
            "multiply" => value_arg(name, args, 0).map(|n| sync(move |v| multiply(&v, &n))),
            "identity" => Ok(sync(Ok)),
            "always" => {
                let constant = args.first().and_then(Arg::as_value).cloned().unwrap_or(Value::Null);
                Ok(sync(move |_| Ok(constant.clone())))
            }
            "head" => Ok(sync(|v| {
                Ok(array("head", v)?.into_iter().next().unwrap_or(Value::Null))
            })),
            "last" => Ok(sync(|v| {
                Ok(array("last", v)?.pop().unwrap_or(Value::Null))
            })),
            "length" => Ok(sync(|v| match v {
                Value::Array(items) => Ok(Value::from(items.len())),
                Value::String(s) => Ok(Value::from(s.chars().count())),
                other => Err(anyhow!("length expects an array or string, got {other}")),
            })),
            "reverse" => Ok(sync(|v| {
                let mut items = array("reverse", v)?;
                items.reverse();
                Ok(Value::Array(items))
            })),
            "prop" => value_arg(name, args, 0).and_then(|key| {
                let key = key
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ArgumentError::missing("prop", 0, "a string key"))?;
                Ok(sync(move |v| Ok(v.get(&key).cloned().unwrap_or(Value::Null))))
            }),
            _ => return None,
        };
        Some(built)
    }
}

fn sync<F>(body: F) -> SyncFn
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Arc::new(body)
}

fn array(name: &str, value: Value) -> anyhow::Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(anyhow!("{name} expects an array, got {other}")),
    }
}

fn value_arg(name: &str, args: &[Arg], index: usize) -> Result<Value, ArgumentError> {
    args.get(index)
        .and_then(Arg::as_value)
        .cloned()
        .ok_or_else(|| ArgumentError::missing(name, index, "a value"))
}

fn unary_arg(name: &str, args: &[Arg], index: usize) -> Result<ArgFn, ArgumentError> {
    args.get(index)
        .and_then(Arg::as_unary)
        .cloned()
        .ok_or_else(|| ArgumentError::missing(name, index, "a one-argument function"))
}

fn binary_arg(name: &str, args: &[Arg], index: usize) -> Result<ArgFn2, ArgumentError> {
    args.get(index)
        .and_then(Arg::as_binary)
        .cloned()
        .ok_or_else(|| ArgumentError::missing(name, index, "a two-argument function"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn apply(name: &str, args: &[Arg], input: Value) -> anyhow::Result<Value> {
        let f = CoreLibrary.lookup(name, args).expect("known name").expect("valid args");
        f(input)
    }

    #[test]
    fn test_unknown_name() {
        assert!(CoreLibrary.lookup("foo", &[]).is_none());
        assert!(EmptyLibrary.lookup("map", &[]).is_none());
    }

    #[test]
    fn test_map_then_reduce() {
        let plus_one = Arg::unary(|v| json!(v.as_i64().unwrap() + 1));
        let mapped = apply("map", &[plus_one], json!([1, 2, 3])).unwrap();
        assert_eq!(mapped, json!([2, 3, 4]));

        let sum = Arg::binary(|acc, x| json!(acc.as_i64().unwrap() + x.as_i64().unwrap()));
        let reduced = apply("reduce", &[sum, Arg::from(0)], mapped).unwrap();
        assert_eq!(reduced, json!(9));
    }

    #[test]
    fn test_filter_and_sum() {
        let is_even = Arg::predicate(|v| v.as_i64().unwrap() % 2 == 0);
        let evens = apply("filter", &[is_even], json!([1, 2, 3, 4])).unwrap();
        assert_eq!(evens, json!([2, 4]));
        assert_eq!(apply("sum", &[], evens).unwrap(), json!(6));
    }

    #[test]
    fn test_scalar_helpers() {
        assert_eq!(apply("add", &[Arg::from(10)], json!(0)).unwrap(), json!(10));
        assert_eq!(apply("multiply", &[Arg::from(10)], json!(10)).unwrap(), json!(100));
        assert_eq!(apply("identity", &[], json!("x")).unwrap(), json!("x"));
        assert_eq!(apply("always", &[Arg::from(7)], json!("x")).unwrap(), json!(7));
    }

    #[test]
    fn test_list_helpers() {
        assert_eq!(apply("head", &[], json!([1, 2])).unwrap(), json!(1));
        assert_eq!(apply("last", &[], json!([1, 2])).unwrap(), json!(2));
        assert_eq!(apply("head", &[], json!([])).unwrap(), json!(null));
        assert_eq!(apply("length", &[], json!("abc")).unwrap(), json!(3));
        assert_eq!(apply("reverse", &[], json!([1, 2, 3])).unwrap(), json!([3, 2, 1]));
        assert_eq!(apply("prop", &[Arg::from("a")], json!({"a": 5})).unwrap(), json!(5));
    }

    #[test]
    fn test_type_errors_happen_at_run_time() {
        let err = apply("sum", &[], json!(3)).unwrap_err();
        assert!(err.to_string().contains("sum expects an array"));
    }

    #[test]
    fn test_missing_arguments_are_argument_errors() {
        let err = CoreLibrary.lookup("map", &[]).unwrap().err().unwrap();
        assert_eq!(err.operation, "map");
        assert!(CoreLibrary.lookup("prop", &[Arg::from(1)]).unwrap().is_err());
    }
}

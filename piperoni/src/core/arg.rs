//! Invocation arguments.
//!
//! Constructors and tag markers receive their arguments as a slice of
//! [`Arg`]. An argument is either plain data or a callable, since control
//! flow tags take predicates and selectors and library helpers take mappers
//! and reducers.

use super::Value;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Unary callable argument.
pub type ArgFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Binary callable argument, e.g. a reducer `(acc, item) -> acc`.
pub type ArgFn2 = Arc<dyn Fn(Value, &Value) -> Value + Send + Sync>;

/// A single invocation argument.
#[derive(Clone)]
pub enum Arg {
    /// Plain data.
    Value(Value),
    /// A one-argument function.
    Unary(ArgFn),
    /// A two-argument function.
    Binary(ArgFn2),
}

impl Arg {
    /// Wraps a one-argument function.
    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::Unary(Arc::new(f))
    }

    /// Wraps a two-argument function.
    pub fn binary<F>(f: F) -> Self
    where
        F: Fn(Value, &Value) -> Value + Send + Sync + 'static,
    {
        Self::Binary(Arc::new(f))
    }

    /// Wraps a predicate, for `startMaybe` and `filter`.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Unary(Arc::new(move |v| Value::Bool(f(v))))
    }

    /// Wraps an index selector, for `startWhich`.
    pub fn selector<F>(f: F) -> Self
    where
        F: Fn(&Value) -> usize + Send + Sync + 'static,
    {
        Self::Unary(Arc::new(move |v| Value::from(f(v))))
    }

    /// Returns the plain value, if any.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the unary function, if any.
    #[must_use]
    pub fn as_unary(&self) -> Option<&ArgFn> {
        match self {
            Self::Unary(f) => Some(f),
            _ => None,
        }
    }

    /// Returns the binary function, if any.
    #[must_use]
    pub fn as_binary(&self) -> Option<&ArgFn2> {
        match self {
            Self::Binary(f) => Some(f),
            _ => None,
        }
    }
}

impl Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Unary(_) => f.write_str("Unary(..)"),
            Self::Binary(_) => f.write_str("Binary(..)"),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Arg::from(3).as_value(), Some(&json!(3)));
        assert_eq!(Arg::from("key").as_value(), Some(&json!("key")));
        assert!(Arg::from(true).as_unary().is_none());
    }

    #[test]
    fn test_predicate_and_selector() {
        let pred = Arg::predicate(|v| v.as_i64() == Some(0));
        let f = pred.as_unary().unwrap();
        assert_eq!(f(&json!(0)), json!(true));
        assert_eq!(f(&json!(5)), json!(false));

        let pick = Arg::selector(|_| 2);
        assert_eq!(pick.as_unary().unwrap()(&json!(null)), json!(2));
    }

    #[test]
    fn test_binary() {
        let sum = Arg::binary(|acc, x| json!(acc.as_i64().unwrap() + x.as_i64().unwrap()));
        assert_eq!(sum.as_binary().unwrap()(json!(1), &json!(2)), json!(3));
        assert_eq!(format!("{sum:?}"), "Binary(..)");
    }
}

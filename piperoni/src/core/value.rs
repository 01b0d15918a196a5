//! Helpers for working with pipeline values.

use super::Value;
use anyhow::{anyhow, bail};

/// Truthiness used by predicates: `false`, `null`, `0`, `""` are false.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Adds two numbers, staying integral when both sides are integers.
pub fn add(a: &Value, b: &Value) -> anyhow::Result<Value> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Ok(Value::from(sum));
        }
    }
    Ok(Value::from(number(a)? + number(b)?))
}

/// Multiplies two numbers, staying integral when both sides are integers.
pub fn multiply(a: &Value, b: &Value) -> anyhow::Result<Value> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(product) = x.checked_mul(y) {
            return Ok(Value::from(product));
        }
    }
    Ok(Value::from(number(a)? * number(b)?))
}

/// Reads a value as a float.
pub fn number(value: &Value) -> anyhow::Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| anyhow!("expected a number, got {value}"))
}

/// Reads a value as an index into a sequence of `len` items.
pub fn index(value: &Value, len: usize) -> anyhow::Result<usize> {
    let Some(i) = value.as_u64() else {
        bail!("expected a non-negative integer index, got {value}");
    };
    let i = usize::try_from(i)?;
    if i >= len {
        bail!("index {i} out of range for {len} operations");
    }
    Ok(i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(2)));
        assert!(is_truthy(&json!([])));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
    }

    #[test]
    fn test_add_keeps_integers() {
        assert_eq!(add(&json!(1), &json!(2)).unwrap(), json!(3));
        assert_eq!(add(&json!(1.5), &json!(2)).unwrap(), json!(3.5));
        assert!(add(&json!("a"), &json!(2)).is_err());
    }

    #[test]
    fn test_multiply() {
        assert_eq!(multiply(&json!(10), &json!(10)).unwrap(), json!(100));
    }

    #[test]
    fn test_index_bounds() {
        assert_eq!(index(&json!(1), 3).unwrap(), 1);
        assert!(index(&json!(3), 3).is_err());
        assert!(index(&json!(-1), 3).is_err());
    }
}

//! Structural equality for JSON values.
//!
//! `serde_json::Value`'s own `PartialEq` distinguishes integer and float
//! representations (`23` vs `23.0`). Values arriving from different sources
//! (coerced literals, stored values, message payloads) must compare by
//! numeric value instead, so change detection and block rules use this
//! function.

use serde_json::{Number, Value};

/// Deep structural equality over nested objects, arrays and primitives.
///
/// Object key order is irrelevant. Numbers compare by value.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| deep_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, l)| y.get(key).map_or(false, |r| deep_equal(l, r)))
        }
        _ => false,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(l), Some(r)) = (x.as_i64(), y.as_i64()) {
        return l == r;
    }
    if let (Some(l), Some(r)) = (x.as_u64(), y.as_u64()) {
        return l == r;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitives() {
        assert!(deep_equal(&json!(true), &json!(true)));
        assert!(!deep_equal(&json!(true), &json!(false)));
        assert!(deep_equal(&json!("a"), &json!("a")));
        assert!(deep_equal(&Value::Null, &Value::Null));
        assert!(!deep_equal(&json!(0), &json!(false)));
        assert!(!deep_equal(&json!("1"), &json!(1)));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(deep_equal(&json!(23), &json!(23.0)));
        assert!(deep_equal(&json!(-4), &json!(-4)));
        assert!(!deep_equal(&json!(2.5), &json!(2)));
        assert!(deep_equal(&json!(u64::MAX), &json!(u64::MAX)));
    }

    #[test]
    fn test_nested_structures() {
        let a = json!({"a": 1, "nested": {"list": [1, 2, {"x": null}]}});
        let b = json!({"nested": {"list": [1, 2, {"x": null}]}, "a": 1.0});
        assert!(deep_equal(&a, &b));

        let c = json!({"a": 1, "nested": {"list": [1, 2, {"x": false}]}});
        assert!(!deep_equal(&a, &c));
    }

    #[test]
    fn test_shape_differences() {
        assert!(!deep_equal(&json!([1, 2]), &json!([1, 2, 3])));
        assert!(!deep_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!deep_equal(&json!({"a": 1}), &json!({"b": 1})));
        assert!(!deep_equal(&json!([]), &json!({})));
    }
}

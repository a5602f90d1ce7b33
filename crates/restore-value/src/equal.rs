use std::sync::Arc;

use crate::Value;

/// Structural equality between two tree values.
///
/// Shared containers short-circuit: two handles to one allocation are equal
/// without visiting their children, which keeps comparisons between
/// snapshots proportional to the part that actually changed.
///
/// ```
/// use restore_value::{deep_equal, Value};
/// use serde_json::json;
///
/// let a = Value::from(json!({"foo": [1, 2, 3]}));
/// let b = Value::from(json!({"foo": [1, 2, 3]}));
/// let c = Value::from(json!({"foo": [1, 2, 4]}));
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,

        (Value::Array(arr_a), Value::Array(arr_b)) => {
            if Arc::ptr_eq(arr_a, arr_b) {
                return true;
            }
            arr_a.len() == arr_b.len()
                && arr_a.iter().zip(arr_b.iter()).all(|(x, y)| deep_equal(x, y))
        }

        // Member order is not significant for equality.
        (Value::Object(obj_a), Value::Object(obj_b)) => {
            if Arc::ptr_eq(obj_a, obj_b) {
                return true;
            }
            if obj_a.len() != obj_b.len() {
                return false;
            }
            obj_a
                .iter()
                .all(|(key, val_a)| obj_b.get(key).is_some_and(|val_b| deep_equal(val_a, val_b)))
        }

        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        deep_equal(self, other)
    }
}

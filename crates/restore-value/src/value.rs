use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Number;

/// Ordered key/value storage backing [`Value::Object`].
pub type Map = IndexMap<String, Value>;

/// A tree value whose containers are reference counted.
///
/// Cloning a `Value` never copies a container: arrays and objects are shared
/// through [`Arc`], so two snapshots of a tree can hold the very same subtree.
/// Use [`Value::same`] to ask whether two values are the same instance and
/// `==` to compare them structurally.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
    Array(Arc<Vec<Value>>),
    Object(Arc<Map>),
}

impl Value {
    /// Builds an array value from owned items.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }

    /// Builds an object value from an owned map.
    pub fn object(map: Map) -> Self {
        Value::Object(Arc::new(map))
    }

    /// Builds an empty object.
    pub fn empty_object() -> Self {
        Value::Object(Arc::new(Map::new()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// True for arrays and objects, the only values a path can step into.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Arc<Vec<Value>>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<Map>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up an object member.
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Looks up an array element.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }

    /// Number of direct children: array length, object size, zero for scalars.
    pub fn len(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short lowercase name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Reference identity.
    ///
    /// Containers are the same when they share one allocation; scalars have no
    /// identity of their own and compare by value.
    ///
    /// ```
    /// use restore_value::Value;
    ///
    /// let a = Value::from(serde_json::json!({"tags": ["x"]}));
    /// let b = a.clone();
    /// let c = Value::from(serde_json::json!({"tags": ["x"]}));
    /// assert!(a.same(&b));
    /// assert!(!a.same(&c));
    /// assert_eq!(a, c);
    /// ```
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clone_shares_containers() {
        let value = Value::from(json!({"users": [{"name": "Diego"}]}));
        let copy = value.clone();
        assert!(value.same(&copy));

        let users = value.get_key("users").unwrap();
        let users_copy = copy.get_key("users").unwrap();
        assert!(users.same(users_copy));
    }

    #[test]
    fn test_scalars_compare_by_value_for_identity() {
        assert!(Value::from(3).same(&Value::from(3)));
        assert!(Value::from("a").same(&Value::from("a")));
        assert!(!Value::from(true).same(&Value::Null));
    }

    #[test]
    fn test_accessors() {
        let value = Value::from(json!({"list": [1, 2], "flag": true, "name": "x"}));
        assert_eq!(value.len(), 3);
        assert_eq!(value.get_key("list").map(Value::len), Some(2));
        assert_eq!(value.get_key("list").and_then(|l| l.get_index(1)).and_then(Value::as_i64), Some(2));
        assert_eq!(value.get_key("flag").and_then(Value::as_bool), Some(true));
        assert_eq!(value.get_key("name").and_then(Value::as_str), Some("x"));
        assert!(value.get_key("missing").is_none());
        assert_eq!(Value::Null.kind_name(), "null");
        assert!(Value::empty_object().is_empty());
    }
}

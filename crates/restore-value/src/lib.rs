//! restore-value - structurally shared tree values.
//!
//! [`Value`] mirrors the JSON data model but keeps arrays and objects behind
//! reference counts so that successive snapshots of a tree can share every
//! subtree a mutation did not touch.

mod convert;
pub mod equal;
mod value;

pub use equal::deep_equal;
pub use value::{Map, Value};

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Builds a [`Value`] with `serde_json::json!` syntax.
///
/// ```
/// use restore_value::{value, Value};
///
/// let v = value!({"users": [{"name": "Diego"}]});
/// assert!(v.is_object());
/// assert_eq!(value!(null), Value::Null);
/// ```
#[macro_export]
macro_rules! value {
    ($($json:tt)+) => {
        $crate::Value::from($crate::__serde_json::json!($($json)+))
    };
}

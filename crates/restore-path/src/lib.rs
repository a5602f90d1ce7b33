//! Structural paths for the restore tree store.
//!
//! A [`Path`] is an interned sequence of [`Segment`]s. Interning gives every
//! distinct address a single instance, so caches keyed by path compare and
//! hash by pointer instead of walking segments.
//!
//! # Example
//!
//! ```
//! use restore_path::Path;
//! use restore_value::value;
//!
//! let doc = value!({"users": [{"name": "Diego"}]});
//! let path = Path::parse("/users/0/name").unwrap();
//! assert_eq!(path.walk(&doc).unwrap().as_str(), Some("Diego"));
//! assert_eq!(path.parent().unwrap().to_string(), "/users/0");
//! ```

mod error;
mod path;
mod pattern;
mod segment;

pub use error::PathError;
pub use path::Path;
pub use pattern::Pattern;
pub use segment::{is_valid_index, Segment};

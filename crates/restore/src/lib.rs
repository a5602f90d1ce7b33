//! restore - an immutable, path-addressed tree store.
//!
//! - [`ImmutableStore`] holds one snapshot of a [`Value`] tree. Every mutation
//!   copies only the containers along the mutated path and shares the rest.
//! - [`Node`] handles are cached per path. A mutation evicts the handles on
//!   its path; handles for untouched siblings keep their identity.
//! - Listeners subscribe to every snapshot change, or to one
//!   [`MutationKind`] on paths matching a regular expression.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use restore::{value, ImmutableStore, Node};
//!
//! let store = ImmutableStore::new(value!({"users": [{"name": "Diego", "comments": []}]}));
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = Rc::clone(&seen);
//! store
//!     .subscribe_create("/users/.*/comments", move |item| log.borrow_mut().push(item.clone()))
//!     .unwrap();
//!
//! let user = store.node_at("/users/0").unwrap();
//! user.child("comments").unwrap().push(value!({"text": "hi"})).unwrap();
//!
//! assert_eq!(*seen.borrow(), vec![value!({"text": "hi"})]);
//! assert!(!Node::ptr_eq(&user, &store.node_at("/users/0").unwrap()));
//! ```

mod cursor;
mod error;
mod events;
mod mutation;
mod node;
mod options;
mod store;

pub use cursor::Cursor;
pub use error::StoreError;
pub use events::MutationKind;
pub use node::{ArrayIter, ArrayNode, Mutator, Node, ObjectIter, ObjectNode, ValueNode};
pub use options::StoreOptions;
pub use restore_path::{Path, PathError, Pattern, Segment};
pub use restore_value::{value, Map, Value};
pub use store::{ImmutableStore, Subscription};

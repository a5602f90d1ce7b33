//! Navigation handles over a store.
//!
//! A [`Node`] is bound to one (store, path) pair. Reads always go to the
//! store's current snapshot and writes go through the store's mutation
//! methods, so a handle never holds stale data; what the cache preserves is
//! the handle's identity ([`Node::ptr_eq`]).

mod array;
pub(crate) mod cache;
mod object;
mod value;

use std::fmt;
use std::rc::Rc;

pub use array::{ArrayIter, ArrayNode};
pub use object::{ObjectIter, ObjectNode};
use restore_path::{Path, Segment};
use restore_value::Value;
pub use value::ValueNode;

use crate::{ImmutableStore, StoreError};
use cache::{NodeCore, NodeKind};

/// Read and replace the value at a handle's path.
pub trait Mutator {
    fn path(&self) -> &Path;

    fn store(&self) -> &ImmutableStore;

    /// The current value at this handle's path.
    fn value(&self) -> Result<Value, StoreError> {
        self.store().get(self.path())
    }

    /// Replaces the value at this handle's path.
    fn set(&self, value: Value) -> Result<(), StoreError> {
        self.store().put(self.path(), value)
    }

    /// The node one level up.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidPath`] for the root.
    fn parent(&self) -> Result<Node, StoreError> {
        let parent = self.path().parent()?;
        self.store().node(&parent)
    }
}

/// A navigation handle, typed by the kind of value it was built for.
#[derive(Clone)]
pub enum Node {
    Object(ObjectNode),
    Array(ArrayNode),
    Value(ValueNode),
}

impl Node {
    pub(crate) fn from_core(store: ImmutableStore, core: Rc<NodeCore>) -> Self {
        match core.kind() {
            NodeKind::Object => Node::Object(ObjectNode::new(store, core)),
            NodeKind::Array => Node::Array(ArrayNode::new(store, core)),
            NodeKind::Value => Node::Value(ValueNode::new(store, core)),
        }
    }

    fn mutator(&self) -> &dyn Mutator {
        match self {
            Node::Object(node) => node,
            Node::Array(node) => node,
            Node::Value(node) => node,
        }
    }

    fn unsupported(&self, operation: &str) -> StoreError {
        StoreError::invalid_mutation(
            self.path(),
            format!("{operation} is not supported on {} nodes", self.kind_name()),
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Object(_) => "object",
            Node::Array(_) => "array",
            Node::Value(_) => "value",
        }
    }

    pub fn path(&self) -> &Path {
        self.mutator().path()
    }

    pub fn store(&self) -> &ImmutableStore {
        self.mutator().store()
    }

    /// Navigates one level down.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidMutation`] on a value node, otherwise whatever the
    /// container view reports for a missing child.
    pub fn child(&self, segment: impl Into<Segment>) -> Result<Node, StoreError> {
        match self {
            Node::Object(node) => node.child(segment),
            Node::Array(node) => node.child(segment),
            Node::Value(_) => Err(self.unsupported("child navigation")),
        }
    }

    pub fn value(&self) -> Result<Value, StoreError> {
        self.mutator().value()
    }

    pub fn set(&self, value: impl Into<Value>) -> Result<(), StoreError> {
        self.mutator().set(value.into())
    }

    pub fn parent(&self) -> Result<Node, StoreError> {
        self.mutator().parent()
    }

    /// Shallow-merges `partial` into an object node.
    pub fn merge(&self, partial: impl Into<Value>) -> Result<(), StoreError> {
        match self {
            Node::Object(node) => node.merge(partial),
            _ => Err(self.unsupported("merge")),
        }
    }

    /// Appends to an array node.
    pub fn push(&self, item: impl Into<Value>) -> Result<(), StoreError> {
        match self {
            Node::Array(node) => node.push(item),
            _ => Err(self.unsupported("push")),
        }
    }

    /// Removes an element from an array node.
    pub fn remove(&self, index: usize) -> Result<Value, StoreError> {
        match self {
            Node::Array(node) => node.remove(index),
            _ => Err(self.unsupported("remove")),
        }
    }

    /// Member count for objects, view length for arrays, zero for values.
    pub fn len(&self) -> usize {
        match self {
            Node::Object(node) => node.len(),
            Node::Array(node) => node.len(),
            Node::Value(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Node::Object(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayNode> {
        match self {
            Node::Array(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&ValueNode> {
        match self {
            Node::Value(node) => Some(node),
            _ => None,
        }
    }

    /// True when both handles share one cached identity.
    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        match (a, b) {
            (Node::Object(a), Node::Object(b)) => ObjectNode::ptr_eq(a, b),
            (Node::Array(a), Node::Array(b)) => ArrayNode::ptr_eq(a, b),
            (Node::Value(a), Node::Value(b)) => ValueNode::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Mutator for Node {
    fn path(&self) -> &Path {
        self.mutator().path()
    }

    fn store(&self) -> &ImmutableStore {
        self.mutator().store()
    }

    fn value(&self) -> Result<Value, StoreError> {
        self.mutator().value()
    }

    fn set(&self, value: Value) -> Result<(), StoreError> {
        self.mutator().set(value)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Object(node) => fmt::Debug::fmt(node, f),
            Node::Array(node) => fmt::Debug::fmt(node, f),
            Node::Value(node) => fmt::Debug::fmt(node, f),
        }
    }
}

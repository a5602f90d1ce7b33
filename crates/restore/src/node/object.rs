use std::fmt;
use std::rc::Rc;

use restore_path::{Path, Segment};
use restore_value::Value;

use super::cache::NodeCore;
use super::{Mutator, Node};
use crate::{ImmutableStore, StoreError};

/// Handle for an object-valued path.
#[derive(Clone)]
pub struct ObjectNode {
    store: ImmutableStore,
    core: Rc<NodeCore>,
}

impl ObjectNode {
    pub(crate) fn new(store: ImmutableStore, core: Rc<NodeCore>) -> Self {
        Self { store, core }
    }

    pub fn child(&self, segment: impl Into<Segment>) -> Result<Node, StoreError> {
        self.store.node(&self.core.path().child(segment))
    }

    /// Replaces (or creates) one member.
    pub fn set_child(
        &self,
        segment: impl Into<Segment>,
        value: impl Into<Value>,
    ) -> Result<(), StoreError> {
        self.store.put(&self.core.path().child(segment), value)
    }

    pub fn merge(&self, partial: impl Into<Value>) -> Result<(), StoreError> {
        self.store.patch(self.core.path(), partial)
    }

    /// Member names in insertion order; empty if the path no longer holds an
    /// object.
    pub fn keys(&self) -> Vec<String> {
        match self.value() {
            Ok(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(key, node)` for every member, in insertion order.
    pub fn entries(&self) -> Result<Vec<(String, Node)>, StoreError> {
        self.iter().collect()
    }

    /// Members in insertion order. The key list is read once, when the
    /// iterator is created.
    pub fn iter(&self) -> ObjectIter<'_> {
        ObjectIter {
            object: self,
            keys: self.keys(),
            position: 0,
        }
    }

    pub fn ptr_eq(a: &ObjectNode, b: &ObjectNode) -> bool {
        Rc::ptr_eq(&a.core, &b.core)
    }
}

impl Mutator for ObjectNode {
    fn path(&self) -> &Path {
        self.core.path()
    }

    fn store(&self) -> &ImmutableStore {
        &self.store
    }
}

/// Iterator over the `(key, node)` members of an [`ObjectNode`].
pub struct ObjectIter<'a> {
    object: &'a ObjectNode,
    keys: Vec<String>,
    position: usize,
}

impl Iterator for ObjectIter<'_> {
    type Item = Result<(String, Node), StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys.get(self.position)?.clone();
        self.position += 1;
        Some(self.object.child(key.as_str()).map(|node| (key, node)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.keys.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ObjectIter<'_> {}

impl<'a> IntoIterator for &'a ObjectNode {
    type Item = Result<(String, Node), StoreError>;
    type IntoIter = ObjectIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for ObjectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectNode").field(self.core.path()).finish()
    }
}

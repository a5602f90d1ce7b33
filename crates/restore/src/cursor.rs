use std::fmt;

use restore_path::{Path, Segment};
use restore_value::Value;

use crate::node::{Mutator, Node};
use crate::{ImmutableStore, StoreError};

/// A path under construction, bound to a store.
///
/// Each step returns a new cursor; nothing is read until a terminal call such
/// as [`get`](Self::get) or [`set`](Self::set), and navigating never requires
/// the intermediate values to exist.
///
/// ```
/// use restore::{value, ImmutableStore};
///
/// let store = ImmutableStore::new(value!({"users": [{"name": "Diego"}]}));
/// let name = store.at("users").at(0).at("name");
/// assert_eq!(name.path().as_str(), "/users/0/name");
/// name.set("Bianca").unwrap();
/// assert_eq!(name.get().unwrap(), value!("Bianca"));
/// ```
#[derive(Clone)]
pub struct Cursor {
    store: ImmutableStore,
    path: Path,
}

impl Cursor {
    pub(crate) fn new(store: ImmutableStore, path: Path) -> Self {
        Self { store, path }
    }

    pub fn at(&self, segment: impl Into<Segment>) -> Cursor {
        Cursor::new(self.store.clone(), self.path.child(segment))
    }

    /// Extends the cursor by a relative `/seg/seg` string.
    pub fn at_ptr(&self, relative: &str) -> Result<Cursor, StoreError> {
        let tail = Path::parse(relative)?;
        let path = Path::new(self.path.iter().chain(tail.iter()));
        Ok(Cursor::new(self.store.clone(), path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.walk(&self.store.snapshot()).is_ok()
    }

    pub fn get(&self) -> Result<Value, StoreError> {
        self.store.get(&self.path)
    }

    pub fn set(&self, value: impl Into<Value>) -> Result<(), StoreError> {
        self.store.put(&self.path, value)
    }

    pub fn merge(&self, partial: impl Into<Value>) -> Result<(), StoreError> {
        self.store.patch(&self.path, partial)
    }

    pub fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&Value) -> Value,
    {
        self.store.map(&self.path, f)
    }

    pub fn push(&self, item: impl Into<Value>) -> Result<(), StoreError> {
        self.store.append(&self.path, item)
    }

    pub fn remove(&self, index: usize) -> Result<Value, StoreError> {
        self.store.delete(&self.path, index)
    }

    /// The cached node at this cursor's path.
    pub fn node(&self) -> Result<Node, StoreError> {
        self.store.node(&self.path)
    }
}

impl Mutator for Cursor {
    fn path(&self) -> &Path {
        &self.path
    }

    fn store(&self) -> &ImmutableStore {
        &self.store
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.path).finish()
    }
}

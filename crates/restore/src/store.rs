use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use restore_path::{Path, Pattern, Segment};
use restore_value::Value;
use tracing::{debug, trace};

use crate::cursor::Cursor;
use crate::events::{dispatch, Listeners, MutationKind, PatternRegistry};
use crate::mutation::{Mutation, Operation, Outcome};
use crate::node::cache::NodeCache;
use crate::node::Node;
use crate::{StoreError, StoreOptions};

struct StoreInner {
    snapshot: RefCell<Value>,
    listeners: RefCell<Listeners>,
    patterns: RefCell<PatternRegistry>,
    nodes: RefCell<NodeCache>,
    options: StoreOptions,
}

/// An immutable, path-addressed tree with copy-on-write updates.
///
/// Every successful mutation installs a new snapshot that shares all
/// untouched subtrees with the previous one, then notifies listeners.
/// Cloning the store clones the handle; all clones see the same snapshot.
///
/// ```
/// use restore::{value, ImmutableStore, Path};
///
/// let store = ImmutableStore::new(value!({"users": [{"name": "Diego", "comments": []}]}));
/// let before = store.snapshot();
/// store.put(&Path::parse("/users/0/name").unwrap(), "Bianca").unwrap();
///
/// assert_eq!(store.get_ptr("/users/0/name").unwrap(), value!("Bianca"));
/// assert_eq!(
///     before.get_key("users").and_then(|users| users.get_index(0)),
///     Some(&value!({"name": "Diego", "comments": []}))
/// );
/// ```
#[derive(Clone)]
pub struct ImmutableStore {
    inner: Rc<StoreInner>,
}

impl ImmutableStore {
    pub fn new(initial: impl Into<Value>) -> Self {
        Self::with_options(initial, StoreOptions::default())
    }

    pub fn with_options(initial: impl Into<Value>, options: StoreOptions) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                snapshot: RefCell::new(initial.into()),
                listeners: RefCell::new(Listeners::default()),
                patterns: RefCell::new(PatternRegistry::default()),
                nodes: RefCell::new(NodeCache::new(options.cache_nodes)),
                options,
            }),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    /// The current snapshot. Cloning is cheap; the returned value never
    /// changes.
    pub fn snapshot(&self) -> Value {
        self.inner.snapshot.borrow().clone()
    }

    /// # Errors
    ///
    /// [`StoreError::PathNotFound`] when any segment of `path` is absent.
    pub fn get(&self, path: &Path) -> Result<Value, StoreError> {
        let snapshot = self.snapshot();
        Ok(path.walk(&snapshot)?.clone())
    }

    /// [`get`](Self::get) with a `/seg/seg` string.
    pub fn get_ptr(&self, path: &str) -> Result<Value, StoreError> {
        self.get(&Path::parse(path)?)
    }

    /// Replaces the subtree at `path`.
    ///
    /// A missing final object member is created, as is the element at index
    /// `len` of a sequence. Notifies `replace` subscribers with the new value.
    pub fn put(&self, path: &Path, value: impl Into<Value>) -> Result<(), StoreError> {
        let outcome = self.commit(path, MutationKind::Replace, Operation::Set(value.into()))?;
        self.notify(MutationKind::Replace, path, &outcome.value);
        Ok(())
    }

    /// Shallow-merges the members of `partial` into the object at `path`.
    /// Notifies `merge` subscribers with the merged object.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidMutation`] when `partial` or the target is not an
    /// object.
    pub fn patch(&self, path: &Path, partial: impl Into<Value>) -> Result<(), StoreError> {
        let partial = match partial.into() {
            Value::Object(map) => Arc::unwrap_or_clone(map),
            other => {
                return Err(StoreError::invalid_mutation(
                    path,
                    format!("patch requires an object, got {}", other.kind_name()),
                ))
            }
        };
        let outcome = self.commit(path, MutationKind::Merge, Operation::Merge(partial))?;
        self.notify(MutationKind::Merge, path, &outcome.value);
        Ok(())
    }

    /// Replaces the value at `path` with `f(current)`. Notifies `replace`
    /// subscribers.
    pub fn map<F>(&self, path: &Path, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&Value) -> Value,
    {
        let op = Operation::Apply(Box::new(move |current: &Value| -> Result<Value, StoreError> {
            Ok(f(current))
        }));
        let outcome = self.commit(path, MutationKind::Replace, op)?;
        self.notify(MutationKind::Replace, path, &outcome.value);
        Ok(())
    }

    /// Appends `item` to the sequence at `path`. Notifies `create`
    /// subscribers with the item.
    pub fn append(&self, path: &Path, item: impl Into<Value>) -> Result<(), StoreError> {
        let item = item.into();
        let payload = item.clone();
        let op = Operation::Apply(Box::new(move |current: &Value| match current {
            Value::Array(items) => {
                let mut next = Vec::with_capacity(items.len() + 1);
                next.extend(items.iter().cloned());
                next.push(item);
                Ok(Value::array(next))
            }
            other => Err(StoreError::invalid_mutation(
                path,
                format!("cannot append to {}", other.kind_name()),
            )),
        }));
        self.commit(path, MutationKind::Create, op)?;
        self.notify(MutationKind::Create, path, &payload);
        Ok(())
    }

    /// Removes and returns the element at `index` of the sequence at `path`.
    /// Notifies `remove` subscribers with the removed element.
    pub fn delete(&self, path: &Path, index: usize) -> Result<Value, StoreError> {
        let outcome = self.commit(path, MutationKind::Remove, Operation::Remove { index })?;
        let removed = outcome.removed.into_iter().next().unwrap_or_default();
        self.notify(MutationKind::Remove, path, &removed);
        Ok(removed)
    }

    /// Removes up to `delete_count` elements starting at `start` and inserts
    /// `items` in their place. Returns the removed elements and notifies
    /// `replace` subscribers with the new sequence.
    pub fn splice(
        &self,
        path: &Path,
        start: usize,
        delete_count: usize,
        items: Vec<Value>,
    ) -> Result<Vec<Value>, StoreError> {
        let op = Operation::Splice {
            start,
            delete_count,
            insert: items,
        };
        let outcome = self.commit(path, MutationKind::Replace, op)?;
        self.notify(MutationKind::Replace, path, &outcome.value);
        Ok(outcome.removed)
    }

    /// Computes and installs the next snapshot, then invalidates cached nodes
    /// along `path`. Nothing changes if the mutation fails.
    fn commit(
        &self,
        path: &Path,
        kind: MutationKind,
        op: Operation<'_>,
    ) -> Result<Outcome, StoreError> {
        // No borrow of the snapshot may be held while `op` runs user code.
        let current = self.snapshot();
        let (next, outcome) = Mutation::new(path, op).apply(path, Some(&current))?;
        *self.inner.snapshot.borrow_mut() = next;
        self.inner.nodes.borrow_mut().invalidate(path);
        debug!(%kind, path = %path, "committed mutation");
        Ok(outcome)
    }

    fn notify(&self, kind: MutationKind, path: &Path, payload: &Value) {
        let listeners = self.inner.listeners.borrow().collect();
        if !listeners.is_empty() {
            dispatch(&listeners, &self.snapshot());
        }
        let matching = self.inner.patterns.borrow().matching(kind, path);
        if let Some(callback) = matching {
            trace!(%kind, path = %path, "notifying pattern subscriber");
            callback(payload);
        }
    }

    /// Registers a listener called with the new snapshot after every
    /// mutation.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        let id = self.inner.listeners.borrow_mut().insert(Rc::new(listener));
        Subscription {
            store: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Registers `callback` for mutations of `kind` whose path matches
    /// `pattern`.
    ///
    /// `pattern` is a regular expression over the path string, such as
    /// `/users/.*/comments`. There is one slot per pattern string and kind:
    /// registering the same pattern again replaces the earlier callback.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidPattern`] when `pattern` does not compile.
    pub fn subscribe_pattern<F>(
        &self,
        kind: MutationKind,
        pattern: &str,
        callback: F,
    ) -> Result<(), StoreError>
    where
        F: Fn(&Value) + 'static,
    {
        let pattern = if self.inner.options.anchor_patterns {
            Pattern::new(pattern)?
        } else {
            Pattern::unanchored(pattern)?
        };
        trace!(%kind, pattern = pattern.as_str(), "registering pattern subscription");
        self.inner
            .patterns
            .borrow_mut()
            .insert(kind, pattern, Rc::new(callback));
        Ok(())
    }

    pub fn subscribe_create<F>(&self, pattern: &str, callback: F) -> Result<(), StoreError>
    where
        F: Fn(&Value) + 'static,
    {
        self.subscribe_pattern(MutationKind::Create, pattern, callback)
    }

    pub fn subscribe_replace<F>(&self, pattern: &str, callback: F) -> Result<(), StoreError>
    where
        F: Fn(&Value) + 'static,
    {
        self.subscribe_pattern(MutationKind::Replace, pattern, callback)
    }

    pub fn subscribe_merge<F>(&self, pattern: &str, callback: F) -> Result<(), StoreError>
    where
        F: Fn(&Value) + 'static,
    {
        self.subscribe_pattern(MutationKind::Merge, pattern, callback)
    }

    pub fn subscribe_remove<F>(&self, pattern: &str, callback: F) -> Result<(), StoreError>
    where
        F: Fn(&Value) + 'static,
    {
        self.subscribe_pattern(MutationKind::Remove, pattern, callback)
    }

    /// Clears the slot for `pattern` under `kind`. Returns whether one was
    /// registered.
    pub fn unsubscribe_pattern(&self, kind: MutationKind, pattern: &str) -> bool {
        self.inner.patterns.borrow_mut().remove(kind, pattern)
    }

    /// The cached node for `path`.
    ///
    /// # Errors
    ///
    /// [`StoreError::PathNotFound`] when `path` does not exist in the current
    /// snapshot.
    pub fn node(&self, path: &Path) -> Result<Node, StoreError> {
        let snapshot = self.snapshot();
        let core = self.inner.nodes.borrow_mut().resolve(&snapshot, path)?;
        Ok(Node::from_core(self.clone(), core))
    }

    /// [`node`](Self::node) with a `/seg/seg` string.
    pub fn node_at(&self, path: &str) -> Result<Node, StoreError> {
        self.node(&Path::parse(path)?)
    }

    /// The node for the whole snapshot.
    pub fn root(&self) -> Node {
        let snapshot = self.snapshot();
        let core = self.inner.nodes.borrow_mut().root(&snapshot);
        Node::from_core(self.clone(), core)
    }

    /// A cursor at the root.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.clone(), Path::root())
    }

    /// A cursor one step below the root.
    pub fn at(&self, segment: impl Into<Segment>) -> Cursor {
        self.cursor().at(segment)
    }

    /// True when both handles refer to the same store.
    pub fn ptr_eq(a: &ImmutableStore, b: &ImmutableStore) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl Default for ImmutableStore {
    fn default() -> Self {
        Self::new(Value::empty_object())
    }
}

impl fmt::Debug for ImmutableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImmutableStore")
            .field("snapshot", &*self.inner.snapshot.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .field("pattern_subscriptions", &{
                let patterns = self.inner.patterns.borrow();
                MutationKind::ALL
                    .iter()
                    .map(|&kind| patterns.len(kind))
                    .sum::<usize>()
            })
            .field("options", &self.inner.options)
            .finish()
    }
}

/// Handle returned by [`ImmutableStore::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug)]
pub struct Subscription {
    store: Weak<StoreInner>,
    id: u64,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Removes exactly this listener. Returns `false` if the store is gone or
    /// the listener was already removed.
    pub fn unsubscribe(self) -> bool {
        match self.store.upgrade() {
            Some(inner) => inner.listeners.borrow_mut().remove(self.id),
            None => false,
        }
    }
}

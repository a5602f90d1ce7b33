//! The store's tree of cached node cores.
//!
//! Cores are linked from the root through their `children` maps. A mutation
//! at `P` evicts every core on the chain from the root to `P`. The surviving
//! children of each evicted ancestor are parked under the ancestor's path and
//! re-attached when that ancestor is next built, so navigating to a sibling
//! of the chain hands back the same core as before the mutation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use restore_path::{Path, Segment};
use restore_value::Value;
use tracing::trace;

use crate::StoreError;

type Children = IndexMap<Segment, Rc<NodeCore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Object,
    Array,
    Value,
}

impl NodeKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => NodeKind::Object,
            Value::Array(_) => NodeKind::Array,
            _ => NodeKind::Value,
        }
    }
}

/// The shared identity behind every handle for one path.
pub(crate) struct NodeCore {
    path: Path,
    kind: NodeKind,
    children: RefCell<Children>,
}

impl NodeCore {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn kind(&self) -> NodeKind {
        self.kind
    }
}

pub(crate) struct NodeCache {
    root: Option<Rc<NodeCore>>,
    parked: HashMap<Path, Children>,
    enabled: bool,
}

impl NodeCache {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            root: None,
            parked: HashMap::new(),
            enabled,
        }
    }

    /// The core for the whole snapshot.
    pub(crate) fn root(&mut self, snapshot: &Value) -> Rc<NodeCore> {
        if !self.enabled {
            return fresh(Path::root(), snapshot);
        }
        if let Some(root) = &self.root {
            return Rc::clone(root);
        }
        let root = self.build(Path::root(), snapshot);
        self.root = Some(Rc::clone(&root));
        root
    }

    /// Returns the cached core for `path`, building any missing cores along
    /// the way.
    ///
    /// # Errors
    ///
    /// [`StoreError::PathNotFound`] when `path` does not exist in `snapshot`.
    pub(crate) fn resolve(
        &mut self,
        snapshot: &Value,
        path: &Path,
    ) -> Result<Rc<NodeCore>, StoreError> {
        let target = path.walk(snapshot)?;
        if !self.enabled {
            return Ok(fresh(path.clone(), target));
        }

        let mut current = self.root(snapshot);
        let mut value = snapshot;
        for (depth, segment) in path.iter().enumerate() {
            value = segment
                .index_into(value)
                .ok_or_else(|| StoreError::not_found(path))?;
            let cached = current.children.borrow().get(segment).cloned();
            current = match cached {
                Some(child) => child,
                None => {
                    let child = self.build(path.prefix(depth + 1), value);
                    current
                        .children
                        .borrow_mut()
                        .insert(segment.clone(), Rc::clone(&child));
                    child
                }
            };
        }
        Ok(current)
    }

    fn build(&mut self, path: Path, value: &Value) -> Rc<NodeCore> {
        let children = self.parked.remove(&path).unwrap_or_default();
        trace!(path = %path, reattached = children.len(), "building node");
        Rc::new(NodeCore {
            path,
            kind: NodeKind::of(value),
            children: RefCell::new(children),
        })
    }

    /// Evicts the chain from the root to `path` and everything beneath `path`.
    pub(crate) fn invalidate(&mut self, path: &Path) {
        if !self.enabled {
            return;
        }
        let mut current = self.root.take();
        let mut prefix = Path::root();
        for segment in path {
            let mut children = match current.take() {
                Some(core) => core.children.take(),
                None => self.parked.remove(&prefix).unwrap_or_default(),
            };
            current = children.shift_remove(segment);
            if !children.is_empty() {
                self.parked.insert(prefix.clone(), children);
            }
            prefix = prefix.child(segment);
        }
        drop(current);
        self.parked
            .retain(|parked, _| parked != path && !path.is_ancestor_of(parked));
        trace!(path = %path, parked = self.parked.len(), "invalidated node cache");
    }

    /// True when a core for `path` is reachable from the root without
    /// rebuilding anything.
    #[cfg(test)]
    pub(crate) fn is_cached(&self, path: &Path) -> bool {
        let Some(mut current) = self.root.clone() else {
            return false;
        };
        for segment in path {
            let next = current.children.borrow().get(segment).cloned();
            match next {
                Some(child) => current = child,
                None => return false,
            }
        }
        true
    }
}

fn fresh(path: Path, value: &Value) -> Rc<NodeCore> {
    Rc::new(NodeCore {
        path,
        kind: NodeKind::of(value),
        children: RefCell::new(Children::new()),
    })
}

use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::rc::Rc;
use std::sync::Arc;

use restore_path::{Path, Segment};
use restore_value::Value;

use super::cache::NodeCore;
use super::{Mutator, Node};
use crate::{ImmutableStore, StoreError};

/// Handle for a sequence-valued path, optionally restricted to a subset of
/// its indices.
///
/// A view produced by [`slice`](Self::slice) or [`filter`](Self::filter)
/// keeps the backing path and a fixed list of backing indices. Index
/// arguments are positions in the view and are translated before reaching the
/// store, so writes through a view land on the underlying sequence:
///
/// ```
/// use restore::{value, ImmutableStore};
///
/// let store = ImmutableStore::new(value!({"users": [{"name": "Diego"}, {"name": "Bianca"}]}));
/// let users = store.node_at("/users").unwrap();
/// let rest = users.as_array().unwrap().slice(1..);
/// rest.get(0).unwrap().child("name").unwrap().set("Bia").unwrap();
/// assert_eq!(store.get_ptr("/users/1/name").unwrap(), value!("Bia"));
/// ```
///
/// The index list is computed when the view is created; it does not follow
/// later insertions or removals.
#[derive(Clone)]
pub struct ArrayNode {
    store: ImmutableStore,
    core: Rc<NodeCore>,
    view: Option<Rc<[usize]>>,
}

impl ArrayNode {
    pub(crate) fn new(store: ImmutableStore, core: Rc<NodeCore>) -> Self {
        Self {
            store,
            core,
            view: None,
        }
    }

    fn with_view(&self, indices: Vec<usize>) -> Self {
        Self {
            store: self.store.clone(),
            core: Rc::clone(&self.core),
            view: Some(indices.into()),
        }
    }

    fn backing(&self) -> Result<Arc<Vec<Value>>, StoreError> {
        match self.store.get(self.core.path())? {
            Value::Array(items) => Ok(items),
            other => Err(StoreError::invalid_mutation(
                self.core.path(),
                format!("expected a sequence, found {}", other.kind_name()),
            )),
        }
    }

    /// True when this handle addresses a subset of the sequence.
    pub fn is_view(&self) -> bool {
        self.view.is_some()
    }

    /// Backing indices this handle exposes, in view order.
    pub fn indices(&self) -> Vec<usize> {
        match &self.view {
            Some(view) => view.to_vec(),
            None => (0..self.backing().map_or(0, |items| items.len())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.view {
            Some(view) => view.len(),
            None => self.backing().map_or(0, |items| items.len()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn translate(&self, index: usize) -> Result<usize, StoreError> {
        match &self.view {
            None => Ok(index),
            Some(view) => view.get(index).copied().ok_or_else(|| {
                StoreError::invalid_mutation(
                    self.core.path(),
                    format!("index {index} out of range for a view of length {}", view.len()),
                )
            }),
        }
    }

    /// Node for the element at view position `index`.
    pub fn get(&self, index: usize) -> Result<Node, StoreError> {
        let backing = self.translate(index)?;
        self.store.node(&self.core.path().child(backing))
    }

    pub fn child(&self, segment: impl Into<Segment>) -> Result<Node, StoreError> {
        let segment = segment.into();
        match segment.as_index() {
            Some(index) => self.get(index),
            None => Err(StoreError::not_found(&self.core.path().child(segment))),
        }
    }

    /// Replaces the element at view position `index`. On a full handle,
    /// `index == len()` appends.
    pub fn set_at(&self, index: usize, value: impl Into<Value>) -> Result<(), StoreError> {
        let backing = self.translate(index)?;
        self.store.put(&self.core.path().child(backing), value)
    }

    /// Appends to the backing sequence. A view does not grow to include the
    /// new element.
    pub fn push(&self, item: impl Into<Value>) -> Result<(), StoreError> {
        self.store.append(self.core.path(), item)
    }

    /// Removes the last element of this handle, if any.
    pub fn pop(&self) -> Result<Option<Value>, StoreError> {
        let last = match &self.view {
            Some(view) => view.last().copied(),
            None => self.backing()?.len().checked_sub(1),
        };
        match last {
            Some(index) => self.store.delete(self.core.path(), index).map(Some),
            None => Ok(None),
        }
    }

    /// Removes and returns the element at view position `index`.
    pub fn remove(&self, index: usize) -> Result<Value, StoreError> {
        let backing = self.translate(index)?;
        self.store.delete(self.core.path(), backing)
    }

    /// Splices at view position `start`, returning the removed elements.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidMutation`] when `start` is past the end, or when a
    /// view would delete elements that are not adjacent in the backing
    /// sequence.
    pub fn splice(
        &self,
        start: usize,
        delete_count: usize,
        items: Vec<Value>,
    ) -> Result<Vec<Value>, StoreError> {
        let Some(view) = &self.view else {
            return self.store.splice(self.core.path(), start, delete_count, items);
        };
        if start > view.len() {
            return Err(StoreError::invalid_mutation(
                self.core.path(),
                format!("splice start {start} is past the end of a view of length {}", view.len()),
            ));
        }
        let deleted = &view[start..start + delete_count.min(view.len() - start)];
        if deleted.windows(2).any(|pair| pair[1] != pair[0] + 1) {
            return Err(StoreError::invalid_mutation(
                self.core.path(),
                "splice through a view must delete adjacent elements",
            ));
        }
        let backing_start = match (deleted.first(), view.get(start), view.last()) {
            (Some(&first), _, _) => first,
            (None, Some(&at), _) => at,
            (None, None, Some(&last)) => last + 1,
            (None, None, None) => self.backing()?.len(),
        };
        self.store
            .splice(self.core.path(), backing_start, deleted.len(), items)
    }

    /// A view over the positions of this handle selected by `range`. Bounds
    /// past the end are clamped.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> ArrayNode {
        let indices = self.indices();
        let len = indices.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        }
        .clamp(start, len);
        self.with_view(indices[start..end].to_vec())
    }

    /// A view over the elements for which `predicate` holds right now.
    pub fn filter<F>(&self, mut predicate: F) -> Result<ArrayNode, StoreError>
    where
        F: FnMut(&Value) -> bool,
    {
        let items = self.backing()?;
        let selected = self
            .indices()
            .into_iter()
            .filter(|&index| items.get(index).is_some_and(&mut predicate))
            .collect();
        Ok(self.with_view(selected))
    }

    /// Calls `f` with the node for each position.
    pub fn map<T, F>(&self, mut f: F) -> Result<Vec<T>, StoreError>
    where
        F: FnMut(Node) -> T,
    {
        self.iter().map(|node| node.map(&mut f)).collect()
    }

    pub fn iter(&self) -> ArrayIter<'_> {
        ArrayIter {
            array: self,
            indices: self.indices(),
            position: 0,
        }
    }

    /// True when both handles share the cached identity and the same view.
    pub fn ptr_eq(a: &ArrayNode, b: &ArrayNode) -> bool {
        let same_view = match (&a.view, &b.view) {
            (None, None) => true,
            (Some(x), Some(y)) => Rc::ptr_eq(x, y),
            _ => false,
        };
        Rc::ptr_eq(&a.core, &b.core) && same_view
    }
}

impl Mutator for ArrayNode {
    fn path(&self) -> &Path {
        self.core.path()
    }

    fn store(&self) -> &ImmutableStore {
        &self.store
    }

    /// The selected elements for a view, the whole sequence otherwise.
    fn value(&self) -> Result<Value, StoreError> {
        let Some(view) = &self.view else {
            return self.store.get(self.core.path());
        };
        let items = self.backing()?;
        view.iter()
            .map(|&index| {
                items
                    .get(index)
                    .cloned()
                    .ok_or_else(|| StoreError::not_found(&self.core.path().child(index)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::array)
    }
}

/// Iterator over the element nodes of an [`ArrayNode`].
pub struct ArrayIter<'a> {
    array: &'a ArrayNode,
    indices: Vec<usize>,
    position: usize,
}

impl Iterator for ArrayIter<'_> {
    type Item = Result<Node, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = *self.indices.get(self.position)?;
        self.position += 1;
        Some(
            self.array
                .store
                .node(&self.array.core.path().child(index)),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.indices.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ArrayIter<'_> {}

impl<'a> IntoIterator for &'a ArrayNode {
    type Item = Result<Node, StoreError>;
    type IntoIter = ArrayIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for ArrayNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("ArrayNode");
        out.field("path", self.core.path());
        if let Some(view) = &self.view {
            out.field("view", &view);
        }
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restore_value::value;

    fn numbers() -> (ImmutableStore, ArrayNode) {
        let store = ImmutableStore::new(value!({"list": [10, 11, 12, 13, 14]}));
        let list = store.node_at("/list").unwrap().as_array().unwrap().clone();
        (store, list)
    }

    #[test]
    fn test_slice_bounds_are_clamped() {
        let (_, list) = numbers();
        assert_eq!(list.slice(1..3).indices(), vec![1, 2]);
        assert_eq!(list.slice(3..).indices(), vec![3, 4]);
        assert_eq!(list.slice(..=1).indices(), vec![0, 1]);
        assert_eq!(list.slice(4..100).indices(), vec![4]);
        assert!(list.slice(9..).is_empty());
        assert_eq!(list.slice(1..).slice(1..2).indices(), vec![2]);
    }

    #[test]
    fn test_view_value_and_translation() {
        let (store, list) = numbers();
        let odd = list.filter(|v| v.as_i64().is_some_and(|n| n % 2 == 1)).unwrap();
        assert_eq!(odd.indices(), vec![1, 3]);
        assert_eq!(odd.value().unwrap(), value!([11, 13]));

        odd.set_at(1, 99).unwrap();
        assert_eq!(store.get_ptr("/list").unwrap(), value!([10, 11, 12, 99, 14]));
        assert!(matches!(odd.set_at(2, 0), Err(StoreError::InvalidMutation { .. })));
    }

    #[test]
    fn test_filter_is_evaluated_once() {
        let (store, list) = numbers();
        let big = list.filter(|v| v.as_i64().is_some_and(|n| n > 12)).unwrap();
        store.put(&Path::parse("/list/0").unwrap(), 50).unwrap();
        assert_eq!(big.indices(), vec![3, 4]);
    }

    #[test]
    fn test_remove_and_pop_through_view() {
        let (store, list) = numbers();
        let tail = list.slice(2..);
        assert_eq!(tail.remove(0).unwrap(), Value::from(12));
        assert_eq!(store.get_ptr("/list").unwrap(), value!([10, 11, 13, 14]));

        assert_eq!(list.pop().unwrap(), Some(Value::from(14)));
        assert_eq!(list.len(), 3);
        assert_eq!(list.slice(5..).pop().unwrap(), None);
    }

    #[test]
    fn test_splice_through_view() {
        let (store, list) = numbers();
        let middle = list.slice(1..4);
        let removed = middle.splice(1, 2, vec![Value::from("x")]).unwrap();
        assert_eq!(removed, vec![Value::from(12), Value::from(13)]);
        assert_eq!(store.get_ptr("/list").unwrap(), value!([10, 11, "x", 14]));

        let (_, list) = numbers();
        let even = list.filter(|v| v.as_i64().is_some_and(|n| n % 2 == 0)).unwrap();
        assert!(matches!(
            even.splice(0, 2, Vec::new()),
            Err(StoreError::InvalidMutation { .. })
        ));
    }

    #[test]
    fn test_splice_at_view_end_inserts_after_last() {
        let (store, list) = numbers();
        list.slice(0..2).splice(2, 0, vec![Value::from(0)]).unwrap();
        assert_eq!(store.get_ptr("/list").unwrap(), value!([10, 11, 0, 12, 13, 14]));
    }

    #[test]
    fn test_iteration_and_map() {
        let (_, list) = numbers();
        let paths: Vec<String> = list
            .slice(3..)
            .iter()
            .map(|node| node.unwrap().path().to_string())
            .collect();
        assert_eq!(paths, vec!["/list/3", "/list/4"]);

        let values = list.map(|node| node.value().unwrap()).unwrap();
        assert_eq!(Value::array(values), value!([10, 11, 12, 13, 14]));

        let mut count = 0;
        for node in &list {
            assert!(node.is_ok());
            count += 1;
        }
        assert_eq!(count, 5);
        assert_eq!(list.iter().len(), 5);
    }

    #[test]
    fn test_views_share_element_identity() {
        let (_, list) = numbers();
        let from_view = list.slice(2..).get(0).unwrap();
        let direct = list.get(2).unwrap();
        assert!(Node::ptr_eq(&from_view, &direct));
        assert!(!ArrayNode::ptr_eq(&list, &list.slice(..)));
    }

    #[test]
    fn test_child_requires_index() {
        let (_, list) = numbers();
        assert!(matches!(list.child("name"), Err(StoreError::PathNotFound { .. })));
        assert_eq!(list.child(1).unwrap().value().unwrap(), Value::from(11));
    }
}

//! Copy-on-write application of one operation at one path.
//!
//! A path `/a/b/c` and an operation `op` fold into
//! `Descend(a, Descend(b, Descend(c, Leaf(op))))`. Applying that instruction
//! copies exactly the containers along the path (root, `a`, `b`) and runs the
//! leaf against the value at `c`; every sibling subtree is carried into the
//! new tree by reference.

use restore_path::{Path, Segment};
use restore_value::{Map, Value};

use crate::StoreError;

pub(crate) type ApplyFn<'f> = Box<dyn FnOnce(&Value) -> Result<Value, StoreError> + 'f>;

/// The concrete change made at the end of a path.
pub(crate) enum Operation<'f> {
    /// Replace the value (creating a missing object member or the element one
    /// past the end of a sequence).
    Set(Value),
    /// Shallow-merge members into an object.
    Merge(Map),
    /// Replace the value with a function of itself.
    Apply(ApplyFn<'f>),
    /// Take one element out of a sequence.
    Remove { index: usize },
    Splice {
        start: usize,
        delete_count: usize,
        insert: Vec<Value>,
    },
}

pub(crate) enum Mutation<'f> {
    Descend {
        segment: Segment,
        inner: Box<Mutation<'f>>,
    },
    Leaf(Operation<'f>),
}

/// What the leaf produced.
#[derive(Debug)]
pub(crate) struct Outcome {
    /// The value now stored at the mutated path.
    pub value: Value,
    /// Elements taken out of a sequence, in order.
    pub removed: Vec<Value>,
}

impl Outcome {
    fn replaced(value: Value) -> Self {
        Self {
            value,
            removed: Vec::new(),
        }
    }
}

impl<'f> Mutation<'f> {
    pub(crate) fn new(path: &Path, op: Operation<'f>) -> Self {
        path.reversed()
            .fold(Mutation::Leaf(op), |inner, segment| Mutation::Descend {
                segment: segment.clone(),
                inner: Box::new(inner),
            })
    }

    /// Produces the new tree; `current` is the value this level addresses,
    /// `None` when it does not exist yet.
    pub(crate) fn apply(
        self,
        target: &Path,
        current: Option<&Value>,
    ) -> Result<(Value, Outcome), StoreError> {
        match self {
            Mutation::Leaf(op) => op.apply(target, current),
            Mutation::Descend { segment, inner } => descend(target, &segment, *inner, current),
        }
    }

    fn is_set(&self) -> bool {
        matches!(self, Mutation::Leaf(Operation::Set(_)))
    }
}

fn descend(
    target: &Path,
    segment: &Segment,
    inner: Mutation<'_>,
    current: Option<&Value>,
) -> Result<(Value, Outcome), StoreError> {
    match current {
        Some(Value::Object(map)) => {
            let key = segment.to_key();
            let (next, outcome) = inner.apply(target, map.get(key.as_str()))?;
            let mut copy = Map::clone(map);
            copy.insert(key, next);
            Ok((Value::object(copy), outcome))
        }
        Some(Value::Array(items)) => {
            let Some(index) = segment.as_index() else {
                return Err(StoreError::not_found(target));
            };
            if index < items.len() {
                let (next, outcome) = inner.apply(target, Some(&items[index]))?;
                let mut copy = Vec::clone(items);
                copy[index] = next;
                return Ok((Value::array(copy), outcome));
            }
            if !inner.is_set() {
                return Err(StoreError::not_found(target));
            }
            if index > items.len() {
                return Err(StoreError::invalid_mutation(
                    target,
                    format!(
                        "index {index} is past the end of a sequence of length {}",
                        items.len()
                    ),
                ));
            }
            let (next, outcome) = inner.apply(target, None)?;
            let mut copy = Vec::with_capacity(items.len() + 1);
            copy.extend(items.iter().cloned());
            copy.push(next);
            Ok((Value::array(copy), outcome))
        }
        _ => Err(StoreError::not_found(target)),
    }
}

impl Operation<'_> {
    fn apply(
        self,
        target: &Path,
        current: Option<&Value>,
    ) -> Result<(Value, Outcome), StoreError> {
        let current = match (current, &self) {
            (Some(current), _) => current,
            (None, Operation::Set(_)) => &Value::Null,
            (None, _) => return Err(StoreError::not_found(target)),
        };
        match self {
            Operation::Set(value) => Ok((value.clone(), Outcome::replaced(value))),
            Operation::Merge(partial) => {
                let Value::Object(map) = current else {
                    return Err(StoreError::invalid_mutation(
                        target,
                        format!("cannot merge into {}", current.kind_name()),
                    ));
                };
                let mut merged = Map::clone(map);
                merged.extend(partial);
                let value = Value::object(merged);
                Ok((value.clone(), Outcome::replaced(value)))
            }
            Operation::Apply(f) => {
                let value = f(current)?;
                Ok((value.clone(), Outcome::replaced(value)))
            }
            Operation::Remove { index } => {
                let items = sequence(target, current)?;
                if index >= items.len() {
                    return Err(StoreError::invalid_mutation(
                        target,
                        format!(
                            "index {index} out of range for sequence of length {}",
                            items.len()
                        ),
                    ));
                }
                let mut copy = items.clone();
                let removed = copy.remove(index);
                let value = Value::array(copy);
                Ok((
                    value.clone(),
                    Outcome {
                        value,
                        removed: vec![removed],
                    },
                ))
            }
            Operation::Splice {
                start,
                delete_count,
                insert,
            } => {
                let items = sequence(target, current)?;
                if start > items.len() {
                    return Err(StoreError::invalid_mutation(
                        target,
                        format!(
                            "splice start {start} is past the end of a sequence of length {}",
                            items.len()
                        ),
                    ));
                }
                let end = start + delete_count.min(items.len() - start);
                let mut copy = items.clone();
                let removed: Vec<Value> = copy.splice(start..end, insert).collect();
                let value = Value::array(copy);
                Ok((value.clone(), Outcome { value, removed }))
            }
        }
    }
}

fn sequence<'v>(target: &Path, value: &'v Value) -> Result<&'v Vec<Value>, StoreError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(StoreError::invalid_mutation(
            target,
            format!("expected a sequence, found {}", other.kind_name()),
        )),
    }
}

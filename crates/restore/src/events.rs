//! Listener registries owned by the store.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use restore_path::{Path, Pattern};
use restore_value::Value;

/// May be called again while already running; state lives in `Cell`/`RefCell`
/// captures.
pub(crate) type Listener = Rc<dyn Fn(&Value)>;

/// Category of a committed mutation, used to route pattern subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// An element was appended to a sequence.
    Create,
    /// A subtree was replaced (`put`, `map`, `splice`).
    Replace,
    /// Members were merged into an object.
    Merge,
    /// An element was removed from a sequence.
    Remove,
}

impl MutationKind {
    pub const ALL: [MutationKind; 4] = [
        MutationKind::Create,
        MutationKind::Replace,
        MutationKind::Merge,
        MutationKind::Remove,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Replace => "replace",
            MutationKind::Merge => "merge",
            MutationKind::Remove => "remove",
        }
    }

    fn slot(self) -> usize {
        match self {
            MutationKind::Create => 0,
            MutationKind::Replace => 1,
            MutationKind::Merge => 2,
            MutationKind::Remove => 3,
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-snapshot listeners, notified in registration order.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: BTreeMap<u64, Listener>,
}

impl Listeners {
    pub(crate) fn insert(&mut self, listener: Listener) -> u64 {
        self.next_id = self.next_id.saturating_add(1);
        self.entries.insert(self.next_id, listener);
        self.next_id
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Current listeners, detached from the registry so callbacks may
    /// subscribe or unsubscribe while being notified.
    pub(crate) fn collect(&self) -> Vec<Listener> {
        self.entries.values().cloned().collect()
    }
}

struct PatternSlot {
    pattern: Pattern,
    callback: Listener,
}

/// One slot per exact pattern string per category.
///
/// Re-registering a pattern replaces the callback in place, so the slot keeps
/// its original position in the notification order.
#[derive(Default)]
pub(crate) struct PatternRegistry {
    by_kind: [IndexMap<String, PatternSlot>; 4],
}

impl PatternRegistry {
    pub(crate) fn insert(&mut self, kind: MutationKind, pattern: Pattern, callback: Listener) {
        let slots = &mut self.by_kind[kind.slot()];
        slots.insert(pattern.as_str().to_owned(), PatternSlot { pattern, callback });
    }

    pub(crate) fn remove(&mut self, kind: MutationKind, pattern: &str) -> bool {
        self.by_kind[kind.slot()].shift_remove(pattern).is_some()
    }

    pub(crate) fn len(&self, kind: MutationKind) -> usize {
        self.by_kind[kind.slot()].len()
    }

    /// Callback of the first slot of `kind`, in registration order, whose
    /// pattern matches `path`.
    pub(crate) fn matching(&self, kind: MutationKind, path: &Path) -> Option<Listener> {
        self.by_kind[kind.slot()]
            .values()
            .find(|slot| slot.pattern.is_match(path))
            .map(|slot| Rc::clone(&slot.callback))
    }
}

/// Calls each listener with `value`.
pub(crate) fn dispatch(listeners: &[Listener], value: &Value) {
    for listener in listeners {
        listener(value);
    }
}

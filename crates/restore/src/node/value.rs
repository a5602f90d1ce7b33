use std::fmt;
use std::rc::Rc;

use restore_path::Path;

use super::cache::NodeCore;
use super::Mutator;
use crate::ImmutableStore;

/// Handle for a scalar-valued path. Supports only the [`Mutator`] operations.
#[derive(Clone)]
pub struct ValueNode {
    store: ImmutableStore,
    core: Rc<NodeCore>,
}

impl ValueNode {
    pub(crate) fn new(store: ImmutableStore, core: Rc<NodeCore>) -> Self {
        Self { store, core }
    }

    pub fn ptr_eq(a: &ValueNode, b: &ValueNode) -> bool {
        Rc::ptr_eq(&a.core, &b.core)
    }
}

impl Mutator for ValueNode {
    fn path(&self) -> &Path {
        self.core.path()
    }

    fn store(&self) -> &ImmutableStore {
        &self.store
    }
}

impl fmt::Debug for ValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueNode").field(self.core.path()).finish()
    }
}

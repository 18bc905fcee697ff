use std::fmt;

use parking_lot::RwLock;

use crate::node::{NodeName, NodeRef};
use crate::registry::HandlerRegistry;
use crate::stack::{Stack, StackBuilder, DEFAULT_MAX_HOPS};

/// The live presentation hierarchy as seen by the router: a root node and
/// the handlers used to walk it.
pub struct Hierarchy {
    root: NodeRef,
    registry: RwLock<HandlerRegistry>,
    max_hops: usize,
}

impl Hierarchy {
    pub fn new(root: NodeRef, registry: HandlerRegistry) -> Self {
        Self {
            root,
            registry: RwLock::new(registry),
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops.max(1);
        self
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Walks the live hierarchy. Call on the presentation thread.
    pub fn current_stack(&self) -> Stack {
        let registry = self.registry.read();
        let stack = StackBuilder::new(&registry)
            .max_hops(self.max_hops)
            .build(&self.root);
        log::trace!("current stack: {stack:?}");
        stack
    }

    pub fn update_registry<R>(&self, f: impl FnOnce(&mut HandlerRegistry) -> R) -> R {
        f(&mut self.registry.write())
    }

    pub fn registry_len(&self) -> usize {
        self.registry.read().len()
    }
}

impl fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hierarchy")
            .field("root", &NodeName(&self.root).to_string())
            .field("handlers", &self.registry_len())
            .field("max_hops", &self.max_hops)
            .finish()
    }
}

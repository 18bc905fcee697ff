//! Hierarchy nodes and the container capabilities the built-in handlers
//! understand.
//!
//! The router does not own the presentation hierarchy. Hosts expose their
//! screens and containers as [`Node`]s and opt into capabilities by overriding
//! the accessor methods; everything else is reached through registered
//! container handlers.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::routable::Routable;

/// Shared reference to a live node. Identity is pointer identity.
pub type NodeRef = Arc<dyn Node>;

/// A node in the host's presentation hierarchy.
pub trait Node: Any + Send + Sync {
    /// The screen capability, if this node is an addressable screen.
    fn routable(&self) -> Option<&dyn Routable> {
        None
    }

    /// Overlay currently presented on top of this node.
    fn presented(&self) -> Option<NodeRef> {
        None
    }

    fn as_tab_container(&self) -> Option<&dyn TabContainer> {
        None
    }

    fn as_stack_container(&self) -> Option<&dyn StackContainer> {
        None
    }

    /// Name used in diagnostics.
    fn debug_name(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

impl dyn Node {
    pub fn as_any(&self) -> &dyn Any {
        self
    }

    pub fn is<T: Node>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Node>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is_routable(&self) -> bool {
        self.routable().is_some()
    }
}

/// Container that shows exactly one of its children at a time.
pub trait TabContainer: Send + Sync {
    fn selected(&self) -> Option<NodeRef>;
}

/// Container that shows an ordered, linear list of children; the last child
/// is the visible one.
pub trait StackContainer: Send + Sync {
    fn children(&self) -> Vec<NodeRef>;
}

/// Compares nodes by reference identity.
pub fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Formats a node for log output without requiring `Debug` on host types.
pub(crate) struct NodeName<'a>(pub &'a NodeRef);

impl fmt::Display for NodeName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.debug_name())
    }
}

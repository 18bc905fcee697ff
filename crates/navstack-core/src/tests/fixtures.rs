//! Minimal static hierarchy nodes for unit tests inside this crate.

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::node::{Node, NodeRef, StackContainer, TabContainer};
use crate::routable::Routable;
use crate::segment::{Segment, SegmentGroup};

pub(crate) struct Screen {
    name: String,
    groups: Vec<SegmentGroup>,
    presented: Mutex<Option<NodeRef>>,
}

impl Screen {
    pub(crate) fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            groups: Vec::new(),
            presented: Mutex::new(None),
        })
    }

    pub(crate) fn in_groups(name: &str, groups: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            groups: groups.iter().map(|g| SegmentGroup::new(g)).collect(),
            presented: Mutex::new(None),
        })
    }

    pub(crate) fn present(&self, node: NodeRef) {
        *self.presented.lock() = Some(node);
    }
}

impl Node for Screen {
    fn routable(&self) -> Option<&dyn Routable> {
        Some(self)
    }

    fn presented(&self) -> Option<NodeRef> {
        self.presented.lock().clone()
    }

    fn debug_name(&self) -> Cow<'static, str> {
        Cow::Owned(self.name.clone())
    }
}

impl Routable for Screen {
    /// Reuse when the segment label names this screen.
    fn should_reuse(&self, segment: &Segment) -> bool {
        segment.label() == Some(self.name.as_str())
    }

    fn segment_groups(&self) -> Vec<SegmentGroup> {
        self.groups.clone()
    }
}

/// Node without the screen capability.
pub(crate) struct Inert {
    name: String,
    presented: Mutex<Option<NodeRef>>,
}

impl Inert {
    pub(crate) fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            presented: Mutex::new(None),
        })
    }

    pub(crate) fn present(&self, node: NodeRef) {
        *self.presented.lock() = Some(node);
    }
}

impl Node for Inert {
    fn presented(&self) -> Option<NodeRef> {
        self.presented.lock().clone()
    }

    fn debug_name(&self) -> Cow<'static, str> {
        Cow::Owned(self.name.clone())
    }
}

pub(crate) struct Tabs {
    name: String,
    selected: Mutex<Option<NodeRef>>,
    presented: Mutex<Option<NodeRef>>,
}

impl Tabs {
    pub(crate) fn new(name: &str, selected: Option<NodeRef>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            selected: Mutex::new(selected),
            presented: Mutex::new(None),
        })
    }

    pub(crate) fn present(&self, node: NodeRef) {
        *self.presented.lock() = Some(node);
    }
}

impl Node for Tabs {
    fn presented(&self) -> Option<NodeRef> {
        self.presented.lock().clone()
    }

    fn as_tab_container(&self) -> Option<&dyn TabContainer> {
        Some(self)
    }

    fn debug_name(&self) -> Cow<'static, str> {
        Cow::Owned(self.name.clone())
    }
}

impl TabContainer for Tabs {
    fn selected(&self) -> Option<NodeRef> {
        self.selected.lock().clone()
    }
}

pub(crate) struct NavStack {
    name: String,
    children: Vec<NodeRef>,
    presented: Mutex<Option<NodeRef>>,
}

impl NavStack {
    pub(crate) fn new(name: &str, children: Vec<NodeRef>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            children,
            presented: Mutex::new(None),
        })
    }

    pub(crate) fn present(&self, node: NodeRef) {
        *self.presented.lock() = Some(node);
    }
}

impl Node for NavStack {
    fn presented(&self) -> Option<NodeRef> {
        self.presented.lock().clone()
    }

    fn as_stack_container(&self) -> Option<&dyn StackContainer> {
        Some(self)
    }

    fn debug_name(&self) -> Cow<'static, str> {
        Cow::Owned(self.name.clone())
    }
}

impl StackContainer for NavStack {
    fn children(&self) -> Vec<NodeRef> {
        self.children.clone()
    }
}

/// `root -> a -> b -> ...` as a presentation chain of screens.
pub(crate) fn chain(names: &[&str]) -> (NodeRef, Vec<Arc<Screen>>) {
    let screens: Vec<Arc<Screen>> = names.iter().map(|name| Screen::new(name)).collect();
    for pair in screens.windows(2) {
        pair[0].present(pair[1].clone());
    }
    let root: NodeRef = screens[0].clone();
    (root, screens)
}

pub(crate) fn names(stack: &crate::stack::Stack) -> Vec<String> {
    stack.names()
}

//! Flattening the presentation hierarchy into the current stack.
//!
//! The walk starts at the root and repeatedly resolves a handler for the
//! node under consideration. The handler output is appended to the walk and
//! its last element becomes the next node to resolve, until a fixed point is
//! reached. The stack is never cached; every read walks the live hierarchy.

use std::fmt;

use crate::node::{same_node, NodeName, NodeRef};
use crate::registry::HandlerRegistry;
use crate::routable::{Routable, EMPTY_ROUTABLE};
use crate::segment::SegmentGroup;

pub const DEFAULT_MAX_HOPS: usize = 64;

/// Ordered, flattened list of addressable screens. Index 0 is the root.
#[derive(Clone, Default)]
pub struct Stack {
    screens: Vec<NodeRef>,
}

impl Stack {
    pub fn new(screens: Vec<NodeRef>) -> Self {
        Self { screens }
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NodeRef> {
        self.screens.get(index)
    }

    pub fn last(&self) -> Option<&NodeRef> {
        self.screens.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeRef> {
        self.screens.iter()
    }

    pub fn as_slice(&self) -> &[NodeRef] {
        &self.screens
    }

    /// Capability of the screen at `index`; inert nodes get [`EmptyRoutable`].
    ///
    /// [`EmptyRoutable`]: crate::routable::EmptyRoutable
    pub fn routable_at(&self, index: usize) -> Option<&dyn Routable> {
        self.screens
            .get(index)
            .map(|node| node.routable().unwrap_or(&EMPTY_ROUTABLE))
    }

    pub fn position_of(&self, node: &NodeRef) -> Option<usize> {
        self.screens.iter().position(|screen| same_node(screen, node))
    }

    /// Index of the shallowest non-root screen that belongs to `group`.
    pub fn first_member_of(&self, group: &SegmentGroup) -> Option<usize> {
        (1..self.screens.len()).find(|&index| {
            self.routable_at(index)
                .is_some_and(|routable| routable.member_of(group))
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.screens
            .iter()
            .map(|screen| screen.debug_name().into_owned())
            .collect()
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Walks a hierarchy through a [`HandlerRegistry`].
pub struct StackBuilder<'a> {
    registry: &'a HandlerRegistry,
    max_hops: usize,
}

impl<'a> StackBuilder<'a> {
    pub fn new(registry: &'a HandlerRegistry) -> Self {
        Self {
            registry,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    pub fn max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops.max(1);
        self
    }

    /// Every node visited by the walk, containers and inert nodes included.
    pub fn walk(&self, root: &NodeRef) -> Vec<NodeRef> {
        let mut nodes: Vec<NodeRef> = Vec::new();
        let mut current = root.clone();
        let mut trailing_used = false;
        let mut hops = 0usize;

        loop {
            hops += 1;
            if hops > self.max_hops {
                log::warn!(
                    "stack walk exceeded {} hops at {}; check container handlers for cycles",
                    self.max_hops,
                    NodeName(&current)
                );
                nodes.push(current);
                break;
            }

            let Some(entry) = self.registry.resolve(&*current) else {
                log::trace!("no handler for {}; terminal", NodeName(&current));
                nodes.push(current);
                break;
            };

            let mut output = self.registry.extract(entry, &current);
            let next = match output.last() {
                None => None,
                Some(last) if same_node(last, &current) => None,
                Some(last) => Some(last.clone()),
            };

            let Some(next) = next else {
                nodes.append(&mut output);
                if !entry.is_presentation_chain() && !trailing_used {
                    if let Some(overlay) = current.presented() {
                        log::trace!(
                            "following overlay {} presented over {}",
                            NodeName(&overlay),
                            NodeName(&current)
                        );
                        trailing_used = true;
                        current = overlay;
                        continue;
                    }
                }
                break;
            };

            output.pop();
            if nodes
                .iter()
                .chain(output.iter())
                .any(|seen| same_node(seen, &next))
            {
                log::warn!(
                    "container handler `{}` revisited {}; stopping the walk",
                    entry.name(),
                    NodeName(&next)
                );
                nodes.append(&mut output);
                break;
            }
            nodes.append(&mut output);
            current = next;
        }

        nodes
    }

    /// The current stack: the first walked node, followed by every later
    /// node that exposes the screen capability. When the walk yields nothing,
    /// as for an empty stack container, the root itself is index 0.
    pub fn build(&self, root: &NodeRef) -> Stack {
        let mut walked = self.walk(root).into_iter();
        let first = walked.next().unwrap_or_else(|| root.clone());
        let mut screens = vec![first];
        screens.extend(walked.filter(|node| node.is_routable()));
        Stack::new(screens)
    }
}

/// Builds the current stack for `root` with default settings.
pub fn current_stack(root: &NodeRef, registry: &HandlerRegistry) -> Stack {
    StackBuilder::new(registry).build(root)
}

#[cfg(test)]
#[path = "tests/stack_tests.rs"]
mod tests;

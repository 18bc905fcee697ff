//! Container handler registry.
//!
//! Handlers turn a container node into the ordered list of nodes it currently
//! shows. Lookup scans entries newest first, so a specialised handler
//! registered after a general one takes precedence for the nodes it matches.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::node::{Node, NodeRef};

type Predicate = Arc<dyn Fn(&dyn Node) -> bool + Send + Sync>;
type ExtractFn = Arc<dyn Fn(&NodeRef) -> Vec<NodeRef> + Send + Sync>;

/// Decides which nodes a handler applies to.
#[derive(Clone)]
pub struct Matcher {
    predicate: Predicate,
    fallback: bool,
}

impl Matcher {
    /// Matches nodes whose concrete type is `T`.
    pub fn type_of<T: Node>() -> Self {
        Self::when(|node| node.is::<T>())
    }

    /// Matches nodes satisfying `predicate`, typically a capability check.
    pub fn when(predicate: impl Fn(&dyn Node) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Arc::new(predicate),
            fallback: false,
        }
    }

    /// Matches every node. Fallback matchers never mark a node as managed by
    /// a dedicated handler.
    pub fn any() -> Self {
        Self {
            predicate: Arc::new(|_| true),
            fallback: true,
        }
    }

    pub fn matches(&self, node: &dyn Node) -> bool {
        (self.predicate)(node)
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

/// How a handler produces a node's visible children.
#[derive(Clone)]
pub enum Extraction {
    /// Host-supplied extraction function.
    Children(ExtractFn),
    /// The node followed by its chain of presented overlays, stopping at the
    /// first overlay claimed by a dedicated handler.
    PresentationChain,
}

#[derive(Clone)]
pub struct HandlerEntry {
    name: Cow<'static, str>,
    matcher: Matcher,
    extraction: Extraction,
}

impl HandlerEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn is_presentation_chain(&self) -> bool {
        matches!(self.extraction, Extraction::PresentationChain)
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("name", &self.name)
            .field("fallback", &self.matcher.fallback)
            .field("presentation_chain", &self.is_presentation_chain())
            .finish()
    }
}

pub const PRESENTATION_CHAIN: &str = "presentation-chain";
pub const TAB_CONTAINER: &str = "tab-container";
pub const STACK_CONTAINER: &str = "stack-container";

/// Ordered list of container handlers. Index 0 is the newest registration.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    entries: Vec<HandlerEntry>,
}

impl HandlerRegistry {
    /// Registry without any handlers. Every node resolves as terminal.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry seeded with the built-in container kinds.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_entry(
            PRESENTATION_CHAIN,
            Matcher::any(),
            Extraction::PresentationChain,
        );
        registry.register(
            TAB_CONTAINER,
            Matcher::when(|node| node.as_tab_container().is_some()),
            |node: &NodeRef| {
                let mut stack = vec![node.clone()];
                if let Some(selected) = node.as_tab_container().and_then(|tabs| tabs.selected()) {
                    stack.push(selected);
                }
                stack
            },
        );
        registry.register(
            STACK_CONTAINER,
            Matcher::when(|node| node.as_stack_container().is_some()),
            |node: &NodeRef| {
                node.as_stack_container()
                    .map(|stack| stack.children())
                    .unwrap_or_default()
            },
        );
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        matcher: Matcher,
        extract: impl Fn(&NodeRef) -> Vec<NodeRef> + Send + Sync + 'static,
    ) {
        self.register_entry(name, matcher, Extraction::Children(Arc::new(extract)));
    }

    /// Registers a handler for nodes of concrete type `T`.
    pub fn register_type<T: Node>(
        &mut self,
        extract: impl Fn(&T) -> Vec<NodeRef> + Send + Sync + 'static,
    ) {
        self.register(
            std::any::type_name::<T>(),
            Matcher::type_of::<T>(),
            move |node: &NodeRef| {
                node.downcast_ref::<T>()
                    .map(|typed| extract(typed))
                    .unwrap_or_default()
            },
        );
    }

    pub fn register_entry(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        matcher: Matcher,
        extraction: Extraction,
    ) {
        self.entries.insert(
            0,
            HandlerEntry {
                name: name.into(),
                matcher,
                extraction,
            },
        );
    }

    pub fn resolve(&self, node: &dyn Node) -> Option<&HandlerEntry> {
        self.entries
            .iter()
            .find(|entry| entry.matcher.matches(node))
    }

    /// Whether a non-fallback handler claims `node`.
    pub fn is_managed(&self, node: &dyn Node) -> bool {
        self.entries
            .iter()
            .any(|entry| !entry.matcher.fallback && entry.matcher.matches(node))
    }

    /// Runs the handler in `entry` against `node`.
    pub fn extract(&self, entry: &HandlerEntry, node: &NodeRef) -> Vec<NodeRef> {
        match &entry.extraction {
            Extraction::Children(extract) => extract(node),
            Extraction::PresentationChain => self.presentation_chain(node),
        }
    }

    fn presentation_chain(&self, node: &NodeRef) -> Vec<NodeRef> {
        let mut chain = vec![node.clone()];
        let mut current = node.presented();
        while let Some(next) = current {
            if chain.iter().any(|seen| crate::node::same_node(seen, &next)) {
                log::warn!("presentation chain revisits a node; stopping the walk");
                break;
            }
            chain.push(next.clone());
            if self.is_managed(&*next) {
                break;
            }
            current = next.presented();
        }
        chain
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HandlerEntry> {
        self.entries.iter()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

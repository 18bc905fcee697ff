use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::action::Plan;
use crate::config::RouterConfig;
use crate::error::{RouteResult, RouterError};
use crate::executor::{Request, SequentialExecutor};
use crate::hierarchy::Hierarchy;
use crate::node::{Node, NodeRef};
use crate::platform::PresentationScheduler;
use crate::reconcile::plan_route;
use crate::registry::{HandlerRegistry, Matcher};
use crate::segment::{Segment, SegmentGroup};
use crate::stack::Stack;

/// Declarative entry point: callers describe the stack they want and the
/// router works out and performs the transitions.
///
/// Every request method may be called from any thread. Requests are queued
/// and executed one after another; `completion` runs exactly once per
/// request, on the presentation thread.
pub struct Router {
    hierarchy: Arc<Hierarchy>,
    executor: SequentialExecutor,
}

impl Router {
    pub fn new(
        root: NodeRef,
        scheduler: Arc<dyn PresentationScheduler>,
    ) -> Result<Self, RouterError> {
        Self::with_config(root, scheduler, RouterConfig::default())
    }

    pub fn with_config(
        root: NodeRef,
        scheduler: Arc<dyn PresentationScheduler>,
        config: RouterConfig,
    ) -> Result<Self, RouterError> {
        Self::with_registry(root, scheduler, HandlerRegistry::with_builtins(), config)
    }

    /// Builds a router around a caller-assembled registry instead of the
    /// built-in container kinds.
    pub fn with_registry(
        root: NodeRef,
        scheduler: Arc<dyn PresentationScheduler>,
        registry: HandlerRegistry,
        config: RouterConfig,
    ) -> Result<Self, RouterError> {
        let hierarchy = Arc::new(Hierarchy::new(root, registry).with_max_hops(config.max_hops));
        let executor = SequentialExecutor::spawn(Arc::clone(&hierarchy), scheduler, &config)?;
        Ok(Self {
            hierarchy,
            executor,
        })
    }

    /// Reconciles the stack with `segments`, which describe every screen
    /// above the root.
    pub fn route(
        &self,
        segments: Vec<Segment>,
        animated: bool,
        completion: impl FnOnce(RouteResult) + Send + 'static,
    ) {
        self.submit(Request::Route(segments), animated, completion);
    }

    /// Pushes `segments` on top of whatever is currently shown.
    pub fn push(
        &self,
        segments: Vec<Segment>,
        animated: bool,
        completion: impl FnOnce(RouteResult) + Send + 'static,
    ) {
        self.submit(Request::Push(segments), animated, completion);
    }

    /// Removes the top `count` screens, never the root.
    pub fn pop_last(
        &self,
        count: usize,
        animated: bool,
        completion: impl FnOnce(RouteResult) + Send + 'static,
    ) {
        self.submit(Request::PopLast(count), animated, completion);
    }

    /// Removes the shallowest screen in `group` and everything above it.
    pub fn pop_to_group(
        &self,
        group: impl Into<SegmentGroup>,
        animated: bool,
        completion: impl FnOnce(RouteResult) + Send + 'static,
    ) {
        self.submit(Request::PopToGroup(group.into()), animated, completion);
    }

    /// Queues a prebuilt plan behind any pending requests.
    pub fn perform(
        &self,
        actions: Plan,
        animated: bool,
        completion: impl FnOnce(RouteResult) + Send + 'static,
    ) {
        self.executor
            .run_queued(actions, animated, Box::new(completion));
    }

    fn submit(
        &self,
        request: Request,
        animated: bool,
        completion: impl FnOnce(RouteResult) + Send + 'static,
    ) {
        self.executor.submit(request, animated, Box::new(completion));
    }

    /// Registers a handler for containers of concrete type `T`. Newer
    /// registrations take precedence over older ones and the built-ins.
    pub fn register_container_handler<T: Node>(
        &self,
        extract: impl Fn(&T) -> Vec<NodeRef> + Send + Sync + 'static,
    ) {
        self.hierarchy
            .update_registry(|registry| registry.register_type::<T>(extract));
    }

    /// Registers a handler for every node `matcher` accepts.
    pub fn register_container_matcher(
        &self,
        name: impl Into<Cow<'static, str>>,
        matcher: Matcher,
        extract: impl Fn(&NodeRef) -> Vec<NodeRef> + Send + Sync + 'static,
    ) {
        self.hierarchy
            .update_registry(|registry| registry.register(name, matcher, extract));
    }

    /// Walks the live hierarchy. Call on the presentation thread.
    pub fn current_stack(&self) -> Stack {
        self.hierarchy.current_stack()
    }

    /// Plan `route(desired)` would execute against the current stack. Call on
    /// the presentation thread.
    pub fn plan_route(&self, desired: &[Segment]) -> Plan {
        plan_route(&self.current_stack(), desired)
    }

    pub fn root(&self) -> &NodeRef {
        self.hierarchy.root()
    }

    pub fn hierarchy(&self) -> &Arc<Hierarchy> {
        &self.hierarchy
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("hierarchy", &self.hierarchy)
            .finish()
    }
}

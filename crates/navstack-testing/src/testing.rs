//! Recording screens and containers that mutate a small in-memory hierarchy.
//!
//! A [`Stage`] is the shared test environment: it creates screens, keeps an
//! event log of every transition, and decides per screen how that screen
//! acknowledges transitions it performs.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use navstack_core::{
    same_node, Ack, Node, NodeRef, RouteResult, Routable, Segment, SegmentGroup, StackContainer,
    TabContainer,
};
use parking_lot::Mutex;

/// How a screen completes the acknowledgments for transitions it performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckMode {
    #[default]
    Immediate,
    /// Completes from a helper thread after the delay, like an animation.
    Delayed(Duration),
    /// Keeps the acknowledgment until [`Stage::release_held`].
    Hold,
    /// Drops the acknowledgment without completing it.
    Drop,
    /// Panics after recording the transition, like a faulty host screen.
    Panic,
}

/// Whether a screen accepts a segment for in-place update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReusePolicy {
    /// Reuse when the segment label equals the screen name.
    #[default]
    SameLabel,
    Always,
    Never,
}

#[derive(Default)]
struct StageInner {
    events: Mutex<Vec<String>>,
    modes: Mutex<HashMap<String, AckMode>>,
    reuse: Mutex<HashMap<String, ReusePolicy>>,
    held: Mutex<Vec<(String, Ack)>>,
}

/// Shared environment for a test hierarchy.
#[derive(Clone, Default)]
pub struct Stage {
    inner: Arc<StageInner>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self, name: &str) -> Arc<TestScreen> {
        self.screen_in_groups(name, Vec::new())
    }

    pub fn screen_in_groups(&self, name: &str, groups: Vec<SegmentGroup>) -> Arc<TestScreen> {
        Arc::new(TestScreen {
            name: name.to_string(),
            stage: self.clone(),
            groups,
            presented: Mutex::new(None),
            applied: Mutex::new(Vec::new()),
        })
    }

    /// Builds `names[0] -> names[1] -> ...` as a chain of presented screens.
    pub fn chain(&self, names: &[&str]) -> Vec<Arc<TestScreen>> {
        let screens: Vec<Arc<TestScreen>> = names.iter().map(|name| self.screen(name)).collect();
        for pair in screens.windows(2) {
            pair[0].present(pair[1].clone());
        }
        screens
    }

    /// Sets how the screen called `name` acknowledges transitions it performs.
    /// Applies to screens created later under that name too.
    pub fn set_mode(&self, name: &str, mode: AckMode) {
        self.inner.modes.lock().insert(name.to_string(), mode);
    }

    pub fn set_reuse(&self, name: &str, policy: ReusePolicy) {
        self.inner.reuse.lock().insert(name.to_string(), policy);
    }

    pub fn record(&self, event: impl Into<String>) {
        self.inner.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.inner.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.inner.events.lock().clear();
    }

    pub fn held_count(&self) -> usize {
        self.inner.held.lock().len()
    }

    /// Completes every held acknowledgment. Returns how many were released.
    pub fn release_held(&self) -> usize {
        let held: Vec<(String, Ack)> = self.inner.held.lock().drain(..).collect();
        let count = held.len();
        for (_, ack) in held {
            ack.done();
        }
        count
    }

    fn mode_of(&self, name: &str) -> AckMode {
        self.inner
            .modes
            .lock()
            .get(name)
            .copied()
            .unwrap_or_default()
    }

    fn reuse_of(&self, name: &str) -> ReusePolicy {
        self.inner
            .reuse
            .lock()
            .get(name)
            .copied()
            .unwrap_or_default()
    }

    fn acknowledge(&self, performer: &str, ack: Ack) {
        match self.mode_of(performer) {
            AckMode::Immediate => ack.done(),
            AckMode::Delayed(delay) => {
                thread::spawn(move || {
                    thread::sleep(delay);
                    ack.done();
                });
            }
            AckMode::Hold => self.inner.held.lock().push((performer.to_string(), ack)),
            AckMode::Drop => drop(ack),
            AckMode::Panic => panic!("{performer} failed to finish its transition"),
        }
    }
}

/// Screen that presents children as overlays and records every transition.
pub struct TestScreen {
    name: String,
    stage: Stage,
    groups: Vec<SegmentGroup>,
    presented: Mutex<Option<NodeRef>>,
    applied: Mutex<Vec<String>>,
}

impl TestScreen {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn present(&self, node: NodeRef) {
        *self.presented.lock() = Some(node);
    }

    pub fn dismiss(&self) {
        self.presented.lock().take();
    }

    /// Labels of segments applied through `update`, oldest first.
    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().clone()
    }
}

fn label_of(segment: &Segment) -> String {
    segment.label().unwrap_or("<opaque>").to_string()
}

impl Node for TestScreen {
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

impl Routable for TestScreen {
    fn push(&self, segment: &Segment, _animated: bool, ack: Ack) {
        let label = label_of(segment);
        let child = self
            .stage
            .screen_in_groups(&label, segment.groups().to_vec());
        self.present(child);
        self.stage.record(format!("push:{}->{}", self.name, label));
        self.stage.acknowledge(&self.name, ack);
    }

    fn pop(&self, screen: &NodeRef, _animated: bool, ack: Ack) {
        let removed = {
            let mut presented = self.presented.lock();
            match presented.as_ref() {
                Some(current) if same_node(current, screen) => presented.take().is_some(),
                _ => false,
            }
        };
        let event = if removed { "pop" } else { "pop-miss" };
        self.stage
            .record(format!("{event}:{}->{}", self.name, screen.debug_name()));
        self.stage.acknowledge(&self.name, ack);
    }

    fn update(&self, segment: &Segment, _animated: bool, ack: Ack) {
        let label = label_of(segment);
        self.applied.lock().push(label.clone());
        self.stage.record(format!("update:{}->{}", self.name, label));
        self.stage.acknowledge(&self.name, ack);
    }

    fn should_reuse(&self, segment: &Segment) -> bool {
        match self.stage.reuse_of(&self.name) {
            ReusePolicy::SameLabel => segment.label() == Some(self.name.as_str()),
            ReusePolicy::Always => true,
            ReusePolicy::Never => false,
        }
    }

    fn segment_groups(&self) -> Vec<SegmentGroup> {
        self.groups.clone()
    }
}

/// Node without the screen capability, e.g. a window.
pub struct InertNode {
    name: String,
    presented: Mutex<Option<NodeRef>>,
}

impl InertNode {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            presented: Mutex::new(None),
        })
    }

    pub fn present(&self, node: NodeRef) {
        *self.presented.lock() = Some(node);
    }
}

impl Node for InertNode {
    fn presented(&self) -> Option<NodeRef> {
        self.presented.lock().clone()
    }

    fn debug_name(&self) -> Cow<'static, str> {
        Cow::Owned(self.name.clone())
    }
}

/// Tab container showing one selected child.
pub struct TestTabs {
    name: String,
    tabs: Vec<NodeRef>,
    selected: Mutex<Option<usize>>,
    presented: Mutex<Option<NodeRef>>,
}

impl TestTabs {
    pub fn new(name: &str, tabs: Vec<NodeRef>) -> Arc<Self> {
        let selected = if tabs.is_empty() { None } else { Some(0) };
        Arc::new(Self {
            name: name.to_string(),
            tabs,
            selected: Mutex::new(selected),
            presented: Mutex::new(None),
        })
    }

    pub fn select(&self, index: Option<usize>) {
        *self.selected.lock() = index.filter(|&i| i < self.tabs.len());
    }

    pub fn present(&self, node: NodeRef) {
        *self.presented.lock() = Some(node);
    }
}

impl Node for TestTabs {
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

impl TabContainer for TestTabs {
    fn selected(&self) -> Option<NodeRef> {
        let selected = *self.selected.lock();
        selected.and_then(|index| self.tabs.get(index).cloned())
    }
}

/// Linear stack container; the last child is on top.
pub struct TestNavStack {
    name: String,
    children: Mutex<Vec<NodeRef>>,
    presented: Mutex<Option<NodeRef>>,
}

impl TestNavStack {
    pub fn new(name: &str, children: Vec<NodeRef>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            children: Mutex::new(children),
            presented: Mutex::new(None),
        })
    }

    pub fn push_child(&self, child: NodeRef) {
        self.children.lock().push(child);
    }

    pub fn pop_child(&self) -> Option<NodeRef> {
        self.children.lock().pop()
    }

    pub fn present(&self, node: NodeRef) {
        *self.presented.lock() = Some(node);
    }
}

impl Node for TestNavStack {
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

impl StackContainer for TestNavStack {
    fn children(&self) -> Vec<NodeRef> {
        self.children.lock().clone()
    }
}

/// Collects request completions so tests can wait on them.
pub struct CompletionProbe {
    sender: mpsc::Sender<(usize, RouteResult, thread::ThreadId)>,
    receiver: mpsc::Receiver<(usize, RouteResult, thread::ThreadId)>,
}

/// One observed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub tag: usize,
    pub result: RouteResult,
    pub thread: thread::ThreadId,
}

impl CompletionProbe {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// Completion closure that reports under `tag`.
    pub fn completion(&self, tag: usize) -> impl FnOnce(RouteResult) + Send + 'static {
        let sender = self.sender.clone();
        move |result| {
            let _ = sender.send((tag, result, thread::current().id()));
        }
    }

    pub fn wait(&self, timeout: Duration) -> Option<Completed> {
        self.receiver
            .recv_timeout(timeout)
            .ok()
            .map(|(tag, result, thread)| Completed {
                tag,
                result,
                thread,
            })
    }

    /// Waits for `count` completions in arrival order.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> Vec<Completed> {
        (0..count).map_while(|_| self.wait(timeout)).collect()
    }
}

impl Default for CompletionProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of the screens in `stack`, for assertions.
pub fn stack_names(stack: &navstack_core::Stack) -> Vec<String> {
    stack.names()
}

use std::borrow::Cow;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use navstack_core::{
    same_node, Ack, Completion, Node, NodeRef, Routable, Router, RouterConfig, Segment,
    SegmentGroup, TabContainer,
};
use navstack_runtime_std::StdRuntime;
use parking_lot::Mutex;

const TRANSITION: Duration = Duration::from_millis(40);
const WAIT: Duration = Duration::from_secs(2);

/// Screen that presents pushed segments as overlays and acknowledges once a
/// short fake animation has finished.
struct Page {
    title: String,
    groups: Vec<SegmentGroup>,
    presented: Mutex<Option<NodeRef>>,
}

impl Page {
    fn new(title: &str, groups: &[SegmentGroup]) -> Arc<Self> {
        Arc::new(Self {
            title: title.to_string(),
            groups: groups.to_vec(),
            presented: Mutex::new(None),
        })
    }

    fn finish(animated: bool, ack: Ack) {
        if animated {
            thread::spawn(move || {
                thread::sleep(TRANSITION);
                ack.done();
            });
        } else {
            ack.done();
        }
    }
}

impl Node for Page {
    fn routable(&self) -> Option<&dyn Routable> {
        Some(self)
    }

    fn presented(&self) -> Option<NodeRef> {
        self.presented.lock().clone()
    }

    fn debug_name(&self) -> Cow<'static, str> {
        Cow::Owned(self.title.clone())
    }
}

impl Routable for Page {
    fn push(&self, segment: &Segment, animated: bool, ack: Ack) {
        let title = segment.label().unwrap_or("untitled");
        log::info!("{} presents {}", self.title, title);
        let page: NodeRef = Page::new(title, segment.groups());
        *self.presented.lock() = Some(page);
        Self::finish(animated, ack);
    }

    fn pop(&self, screen: &NodeRef, animated: bool, ack: Ack) {
        let mut presented = self.presented.lock();
        if presented.as_ref().is_some_and(|top| same_node(top, screen)) {
            log::info!("{} dismisses {}", self.title, screen.debug_name());
            presented.take();
        }
        drop(presented);
        Self::finish(animated, ack);
    }

    fn update(&self, segment: &Segment, _animated: bool, ack: Ack) {
        log::info!("{} refreshed with {:?}", self.title, segment.label());
        ack.done();
    }

    fn should_reuse(&self, segment: &Segment) -> bool {
        segment.label() == Some(self.title.as_str())
    }

    fn segment_groups(&self) -> Vec<SegmentGroup> {
        self.groups.clone()
    }
}

/// Tab bar with a fixed selection.
struct TabBar {
    tabs: Vec<NodeRef>,
    selected: usize,
}

impl Node for TabBar {
    fn as_tab_container(&self) -> Option<&dyn TabContainer> {
        Some(self)
    }

    fn debug_name(&self) -> Cow<'static, str> {
        "tab-bar".into()
    }
}

impl TabContainer for TabBar {
    fn selected(&self) -> Option<NodeRef> {
        self.tabs.get(self.selected).cloned()
    }
}

fn run_step(router: &Router, label: &str, request: impl FnOnce(&Router, Completion)) {
    let (sender, receiver) = mpsc::channel();
    request(
        router,
        Box::new(move |result| {
            let _ = sender.send(result);
        }),
    );
    match receiver.recv_timeout(WAIT) {
        Ok(Ok(())) => println!("{label}: ok"),
        Ok(Err(err)) => println!("{label}: failed: {err}"),
        Err(_) => println!("{label}: no completion within {WAIT:?}"),
    }
}

fn print_stack(runtime: &StdRuntime, router: &Router) {
    let hierarchy = Arc::clone(router.hierarchy());
    match runtime.run_sync(WAIT, move || hierarchy.current_stack().names()) {
        Some(names) => println!("  stack: {}", names.join(" > ")),
        None => println!("  stack: presentation thread unavailable"),
    }
}

fn main() {
    env_logger::init();

    println!("=== navstack headless demo ===");

    let runtime = match StdRuntime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start presentation thread: {err}");
            return;
        }
    };

    let inbox = Page::new("inbox", &[]);
    let archive = Page::new("archive", &[]);
    let tabs: NodeRef = Arc::new(TabBar {
        tabs: vec![inbox, archive],
        selected: 0,
    });

    let config = RouterConfig::default().ack_timeout(Duration::from_secs(1));
    let router = match runtime.router(tabs, config) {
        Ok(router) => router,
        Err(err) => {
            eprintln!("failed to start router: {err}");
            return;
        }
    };
    print_stack(&runtime, &router);

    run_step(&router, "route inbox > thread > reply", |router, done| {
        router.route(
            vec![
                Segment::named("inbox"),
                Segment::named("thread"),
                Segment::named("reply").with_group("compose"),
            ],
            true,
            done,
        )
    });
    print_stack(&runtime, &router);

    run_step(&router, "route inbox > settings", |router, done| {
        router.route(
            vec![Segment::named("inbox"), Segment::named("settings")],
            true,
            done,
        )
    });
    print_stack(&runtime, &router);

    run_step(&router, "push attachment (compose)", |router, done| {
        router.push(
            vec![Segment::named("attachment").with_group("compose")],
            true,
            done,
        )
    });
    print_stack(&runtime, &router);

    run_step(&router, "pop to compose", |router, done| {
        router.pop_to_group("compose", true, done)
    });
    print_stack(&runtime, &router);

    run_step(&router, "pop last 5", |router, done| {
        router.pop_last(5, false, done)
    });
    print_stack(&runtime, &router);
}

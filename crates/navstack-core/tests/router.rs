use std::borrow::Cow;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use navstack_core::{
    Matcher, Node, NodeRef, RouteResult, Router, RouterConfig, Segment, TransitionError,
};
use navstack_runtime_std::StdRuntime;
use navstack_testing::{AckMode, CompletionProbe, InertNode, Stage, TestNavStack};

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    runtime: StdRuntime,
    router: Router,
}

impl Harness {
    fn new(root: NodeRef) -> Self {
        Self::with_config(root, RouterConfig::default().ack_timeout(WAIT))
    }

    fn with_config(root: NodeRef, config: RouterConfig) -> Self {
        let runtime = StdRuntime::new().expect("presentation thread");
        let router = runtime.router(root, config).expect("router");
        Self { runtime, router }
    }

    fn stack_names(&self) -> Vec<String> {
        let hierarchy = Arc::clone(self.router.hierarchy());
        self.runtime
            .run_sync(WAIT, move || hierarchy.current_stack().names())
            .expect("stack from presentation thread")
    }
}

fn segments(labels: &[&str]) -> Vec<Segment> {
    labels.iter().map(|label| Segment::named(label)).collect()
}

fn wait_one(probe: &CompletionProbe) -> RouteResult {
    probe.wait(WAIT).expect("completion").result
}

#[test]
fn route_pushes_missing_screens_from_the_root() {
    let stage = Stage::new();
    let root = stage.screen("root");
    let harness = Harness::new(root);
    let probe = CompletionProbe::new();

    harness
        .router
        .route(segments(&["a", "b"]), true, probe.completion(0));

    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(harness.stack_names(), ["root", "a", "b"]);
    assert_eq!(stage.events(), ["push:root->a", "push:a->b"]);
}

#[test]
fn route_updates_shared_prefix_then_pops_and_pushes() {
    let stage = Stage::new();
    let screens = stage.chain(&["root", "list", "detail"]);
    let harness = Harness::new(screens[0].clone());
    let probe = CompletionProbe::new();

    harness
        .router
        .route(segments(&["list", "settings"]), false, probe.completion(0));

    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(harness.stack_names(), ["root", "list", "settings"]);
    assert_eq!(
        stage.events(),
        [
            "update:list->list",
            "pop:list->detail",
            "push:list->settings"
        ]
    );
    assert_eq!(screens[1].applied(), ["list"]);
}

#[test]
fn routing_to_the_current_stack_only_updates() {
    let stage = Stage::new();
    let screens = stage.chain(&["root", "a", "b"]);
    let harness = Harness::new(screens[0].clone());
    let probe = CompletionProbe::new();

    harness
        .router
        .route(segments(&["a", "b"]), false, probe.completion(0));

    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(harness.stack_names(), ["root", "a", "b"]);
    assert_eq!(stage.events(), ["update:a->a", "update:b->b"]);
}

#[test]
fn empty_route_pops_back_to_the_root() {
    let stage = Stage::new();
    let screens = stage.chain(&["root", "a", "b"]);
    let harness = Harness::new(screens[0].clone());
    let probe = CompletionProbe::new();

    harness.router.route(Vec::new(), false, probe.completion(0));

    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(harness.stack_names(), ["root"]);
    assert_eq!(stage.events(), ["pop:root->a"]);
}

#[test]
fn requests_are_planned_after_earlier_ones_finish() {
    let stage = Stage::new();
    stage.set_mode("root", AckMode::Delayed(Duration::from_millis(100)));
    let root = stage.screen("root");
    let harness = Harness::new(root);
    let probe = CompletionProbe::new();

    harness
        .router
        .route(segments(&["a"]), true, probe.completion(1));
    harness
        .router
        .push(segments(&["b"]), true, probe.completion(2));

    let done = probe.wait_for(2, WAIT);
    let tags: Vec<usize> = done.iter().map(|completed| completed.tag).collect();
    assert_eq!(tags, [1, 2]);
    assert!(done.iter().all(|completed| completed.result.is_ok()));
    // The push was planned against [root, a], so `a` performed it.
    assert_eq!(stage.events(), ["push:root->a", "push:a->b"]);
    assert_eq!(harness.stack_names(), ["root", "a", "b"]);
}

#[test]
fn stuck_transition_abandons_the_request_but_not_the_router() {
    let stage = Stage::new();
    stage.set_mode("root", AckMode::Hold);
    let root = stage.screen("root");
    let config = RouterConfig::default().ack_timeout(Duration::from_millis(100));
    let harness = Harness::with_config(root, config);
    let probe = CompletionProbe::new();

    harness
        .router
        .route(segments(&["a", "b"]), true, probe.completion(1));
    assert_eq!(
        wait_one(&probe),
        Err(TransitionError::Stuck {
            action: "push(1, a)".to_string(),
            timeout: Duration::from_millis(100),
        })
    );
    // The rest of the plan never ran.
    assert_eq!(stage.events(), ["push:root->a"]);

    stage.set_mode("root", AckMode::Immediate);
    harness
        .router
        .route(segments(&["a", "c"]), true, probe.completion(2));
    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(harness.stack_names(), ["root", "a", "c"]);

    // A late acknowledgment is harmless.
    assert_eq!(stage.release_held(), 1);
}

#[test]
fn dropped_acknowledgment_fails_the_request() {
    let stage = Stage::new();
    stage.set_mode("root", AckMode::Drop);
    let root = stage.screen("root");
    let harness = Harness::new(root);
    let probe = CompletionProbe::new();

    harness
        .router
        .push(segments(&["a", "b"]), true, probe.completion(0));

    assert_eq!(
        wait_one(&probe),
        Err(TransitionError::AckDropped {
            action: "push(1, a)".to_string(),
        })
    );
    assert_eq!(harness.stack_names(), ["root", "a"]);
}

#[test]
fn pop_last_never_removes_the_root() {
    let stage = Stage::new();
    let screens = stage.chain(&["root", "a", "b"]);
    let harness = Harness::new(screens[0].clone());
    let probe = CompletionProbe::new();

    harness.router.pop_last(1, false, probe.completion(1));
    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(harness.stack_names(), ["root", "a"]);

    harness.router.pop_last(10, false, probe.completion(2));
    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(harness.stack_names(), ["root"]);

    harness.router.pop_last(1, false, probe.completion(3));
    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(stage.events(), ["pop:a->b", "pop:root->a"]);
}

#[test]
fn pop_to_group_removes_the_shallowest_member_and_above() {
    let stage = Stage::new();
    let root = stage.screen("root");
    let a = stage.screen("a");
    let login = stage.screen_in_groups("login", vec!["modal".into()]);
    let otp = stage.screen_in_groups("otp", vec!["modal".into()]);
    root.present(a.clone());
    a.present(login.clone());
    login.present(otp);
    let harness = Harness::new(root);
    let probe = CompletionProbe::new();

    harness
        .router
        .pop_to_group("modal", true, probe.completion(0));

    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(harness.stack_names(), ["root", "a"]);
    assert_eq!(stage.events(), ["pop:a->login"]);
}

#[test]
fn pop_to_unknown_group_still_completes() {
    let stage = Stage::new();
    let screens = stage.chain(&["root", "a"]);
    let harness = Harness::new(screens[0].clone());
    let probe = CompletionProbe::new();

    harness
        .router
        .pop_to_group("sheet", true, probe.completion(0));

    assert_eq!(wait_one(&probe), Ok(()));
    assert!(stage.events().is_empty());
    assert_eq!(harness.stack_names(), ["root", "a"]);
}

#[test]
fn completions_run_on_the_presentation_thread() {
    let stage = Stage::new();
    let root = stage.screen("root");
    let harness = Harness::new(root);
    let probe = CompletionProbe::new();

    harness
        .router
        .route(segments(&["a"]), false, probe.completion(0));

    let completed = probe.wait(WAIT).expect("completion");
    let presentation = harness
        .runtime
        .run_sync(WAIT, || thread::current().id())
        .expect("presentation thread id");
    assert_eq!(completed.thread, presentation);
    assert_ne!(completed.thread, thread::current().id());
}

#[test]
fn inert_root_is_kept_and_screens_above_it_are_routed() {
    let stage = Stage::new();
    let window = InertNode::new("window");
    let home = stage.screen("home");
    window.present(home.clone());
    let harness = Harness::new(window);
    let probe = CompletionProbe::new();

    harness
        .router
        .route(segments(&["home", "detail"]), false, probe.completion(0));

    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(harness.stack_names(), ["window", "home", "detail"]);
    assert_eq!(stage.events(), ["update:home->home", "push:home->detail"]);
}

#[test]
fn stack_container_children_replace_the_container() {
    let stage = Stage::new();
    let first = stage.screen("first");
    let second = stage.screen("second");
    let nav = TestNavStack::new("nav", vec![first, second]);
    let harness = Harness::new(nav);
    assert_eq!(harness.stack_names(), ["first", "second"]);

    let probe = CompletionProbe::new();
    harness
        .router
        .route(segments(&["second", "sheet"]), false, probe.completion(0));

    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(harness.stack_names(), ["first", "second", "sheet"]);
    assert_eq!(stage.events(), ["update:second->second", "push:second->sheet"]);
}

struct Drawer {
    open: NodeRef,
}

impl Node for Drawer {
    fn debug_name(&self) -> Cow<'static, str> {
        "drawer".into()
    }
}

#[test]
fn custom_container_handler_takes_effect_for_later_requests() {
    let stage = Stage::new();
    let inbox = stage.screen("inbox");
    let drawer: NodeRef = Arc::new(Drawer { open: inbox });
    let harness = Harness::new(drawer);

    assert_eq!(harness.stack_names(), ["drawer"]);

    harness
        .router
        .register_container_handler::<Drawer>(|drawer| vec![drawer.open.clone()]);
    assert_eq!(harness.stack_names(), ["inbox"]);

    let probe = CompletionProbe::new();
    harness
        .router
        .route(segments(&["thread"]), false, probe.completion(0));
    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(harness.stack_names(), ["inbox", "thread"]);
    assert_eq!(stage.events(), ["push:inbox->thread"]);
}

#[test]
fn matcher_handlers_override_builtins() {
    let stage = Stage::new();
    let hidden = stage.screen("hidden");
    let visible = stage.screen("visible");
    let nav = TestNavStack::new("nav", vec![hidden, visible.clone()]);
    let harness = Harness::new(nav);

    let only_top = visible.clone();
    harness.router.register_container_matcher(
        "top-only",
        Matcher::when(|node| node.as_stack_container().is_some()),
        move |node| vec![node.clone(), only_top.clone() as NodeRef],
    );
    assert_eq!(harness.stack_names(), ["nav", "visible"]);
}

#[test]
fn concurrent_callers_are_serialized() {
    let stage = Stage::new();
    let root = stage.screen("root");
    let harness = Arc::new(Harness::new(root));
    let probe = Arc::new(CompletionProbe::new());

    let callers: Vec<_> = (0..4)
        .map(|caller| {
            let harness = Arc::clone(&harness);
            let completion = probe.completion(caller);
            thread::spawn(move || {
                harness.router.push(
                    vec![Segment::named(format!("s{caller}"))],
                    false,
                    completion,
                );
            })
        })
        .collect();
    for caller in callers {
        caller.join().expect("caller thread");
    }

    let done = probe.wait_for(4, WAIT);
    assert_eq!(done.len(), 4);
    assert!(done.iter().all(|completed| completed.result.is_ok()));
    assert_eq!(harness.stack_names().len(), 5);
    assert_eq!(stage.events().len(), 4);
}

#[test]
fn panicking_screen_fails_only_its_own_request() {
    let stage = Stage::new();
    stage.set_mode("root", AckMode::Panic);
    let root = stage.screen("root");
    let harness = Harness::new(root);
    let probe = CompletionProbe::new();

    harness
        .router
        .push(segments(&["a"]), true, probe.completion(1));
    harness
        .router
        .push(segments(&["b"]), true, probe.completion(2));

    let done = probe.wait_for(2, WAIT);
    assert_eq!(done.len(), 2);
    assert_eq!(
        done[0].result,
        Err(TransitionError::Panicked {
            action: "push(1, a)".to_string(),
            message: "root failed to finish its transition".to_string(),
        })
    );
    assert_eq!(done[1].result, Ok(()));
    assert_eq!(harness.stack_names(), ["root", "a", "b"]);
}

#[test]
fn requests_fail_once_the_presentation_thread_is_gone() {
    let stage = Stage::new();
    let root = stage.screen("root");
    let harness = Harness::new(root);
    harness.runtime.presentation().shutdown();
    let probe = CompletionProbe::new();

    harness
        .router
        .route(segments(&["a"]), true, probe.completion(0));

    assert_eq!(
        wait_one(&probe),
        Err(TransitionError::PresentationUnavailable)
    );
    assert!(stage.events().is_empty());
}

#[test]
fn stack_container_changes_are_seen_by_the_next_request() {
    let stage = Stage::new();
    let nav = TestNavStack::new(
        "nav",
        vec![
            stage.screen("first"),
            stage.screen("second"),
            stage.screen("third"),
        ],
    );
    let harness = Harness::new(nav.clone());

    let popped = nav.pop_child().expect("top child");
    assert_eq!(popped.debug_name(), "third");
    nav.push_child(stage.screen("fourth"));
    assert_eq!(harness.stack_names(), ["first", "second", "fourth"]);

    let probe = CompletionProbe::new();
    harness.router.route(
        segments(&["second", "fourth", "sheet"]),
        false,
        probe.completion(0),
    );

    assert_eq!(wait_one(&probe), Ok(()));
    assert_eq!(
        stage.events(),
        [
            "update:second->second",
            "update:fourth->fourth",
            "push:fourth->sheet"
        ]
    );
    assert_eq!(harness.stack_names(), ["first", "second", "fourth", "sheet"]);
}

#[test]
fn empty_stack_container_root_still_owns_requests() {
    let nav = TestNavStack::new("nav", Vec::new());
    let harness = Harness::new(nav);
    assert_eq!(harness.stack_names(), ["nav"]);

    let probe = CompletionProbe::new();
    harness
        .router
        .push(segments(&["a"]), false, probe.completion(0));
    assert_eq!(wait_one(&probe), Ok(()));
}

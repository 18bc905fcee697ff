//! Sequential execution of plans across the presentation boundary.
//!
//! A single worker thread admits requests in FIFO order. For each request it
//! hops onto the presentation thread to read the live stack and build the
//! plan, then dispatches the plan one action at a time, blocking on each
//! action's acknowledgment for at most the configured timeout. A timeout
//! abandons the rest of the plan. A panic in a screen or container handler is
//! contained and fails only the request that triggered it. The request's
//! completion always runs once, on the presentation thread.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::action::{Action, Plan};
use crate::config::RouterConfig;
use crate::error::{RouteResult, RouterError, TransitionError};
use crate::hierarchy::Hierarchy;
use crate::platform::{run_contained, PresentationScheduler};
use crate::reconcile::{plan_pop_last, plan_pop_to_group, plan_push, plan_route};
use crate::routable::{Ack, Signal};
use crate::segment::{Segment, SegmentGroup};
use crate::stack::Stack;

/// Called once per request with the request's outcome.
pub type Completion = Box<dyn FnOnce(RouteResult) + Send + 'static>;

pub(crate) type RequestId = u64;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed)
}

/// What a caller asked for. Planned against the live stack when admitted.
#[derive(Clone)]
pub enum Request {
    Route(Vec<Segment>),
    Push(Vec<Segment>),
    PopLast(usize),
    PopToGroup(SegmentGroup),
    /// A prebuilt plan, executed as given.
    Actions(Plan),
}

impl Request {
    pub fn plan(self, stack: &Stack) -> Plan {
        match self {
            Request::Route(segments) => plan_route(stack, &segments),
            Request::Push(segments) => plan_push(stack, &segments),
            Request::PopLast(count) => plan_pop_last(stack, count),
            Request::PopToGroup(group) => plan_pop_to_group(stack, &group),
            Request::Actions(plan) => plan,
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Route(segments) => f.debug_tuple("Route").field(segments).finish(),
            Request::Push(segments) => f.debug_tuple("Push").field(segments).finish(),
            Request::PopLast(count) => f.debug_tuple("PopLast").field(count).finish(),
            Request::PopToGroup(group) => f.debug_tuple("PopToGroup").field(group).finish(),
            Request::Actions(plan) => f.debug_tuple("Actions").field(plan).finish(),
        }
    }
}

struct Job {
    id: RequestId,
    request: Request,
    animated: bool,
    completion: Completion,
}

/// A completion paired with its outcome.
///
/// Normally delivered by a presentation task. If the scheduler drops that
/// task without running it, the completion runs wherever the task is dropped
/// so that it still fires exactly once.
struct Delivery {
    id: RequestId,
    pending: Option<(Completion, RouteResult)>,
}

impl Delivery {
    fn new(id: RequestId, completion: Completion, outcome: RouteResult) -> Self {
        Self {
            id,
            pending: Some((completion, outcome)),
        }
    }

    fn deliver(mut self) {
        self.run();
    }

    fn run(&mut self) {
        let Some((completion, outcome)) = self.pending.take() else {
            return;
        };
        let id = self.id;
        if let Err(message) = run_contained(move || completion(outcome)) {
            log::warn!("request #{id}: completion panicked: {message}");
        }
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if self.pending.is_some() {
            log::warn!(
                "request #{}: presentation task dropped; running completion on {}",
                self.id,
                thread::current().name().unwrap_or("an unnamed thread")
            );
            self.run();
        }
    }
}

/// Serial executor with one worker thread.
pub struct SequentialExecutor {
    sender: mpsc::Sender<Job>,
    scheduler: Arc<dyn PresentationScheduler>,
}

impl SequentialExecutor {
    pub fn spawn(
        hierarchy: Arc<Hierarchy>,
        scheduler: Arc<dyn PresentationScheduler>,
        config: &RouterConfig,
    ) -> Result<Self, RouterError> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = Worker {
            hierarchy,
            scheduler: Arc::clone(&scheduler),
            timeout: config.ack_timeout,
        };
        thread::Builder::new()
            .name(config.worker_name.clone())
            .spawn(move || worker.run(receiver))?;
        Ok(Self { sender, scheduler })
    }

    /// Queues `request`. Requests run strictly in submission order.
    pub fn submit(&self, request: Request, animated: bool, completion: Completion) {
        let job = Job {
            id: next_request_id(),
            request,
            animated,
            completion,
        };
        if let Err(mpsc::SendError(job)) = self.sender.send(job) {
            log::warn!("request #{} rejected: router worker is not running", job.id);
            let delivery = Delivery::new(
                job.id,
                job.completion,
                Err(TransitionError::WorkerUnavailable),
            );
            self.scheduler.spawn_task(Box::new(move || delivery.deliver()));
        }
    }

    /// Queues a prebuilt plan.
    pub fn run_queued(&self, actions: Plan, animated: bool, completion: Completion) {
        self.submit(Request::Actions(actions), animated, completion);
    }
}

impl fmt::Debug for SequentialExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialExecutor").finish_non_exhaustive()
    }
}

struct Worker {
    hierarchy: Arc<Hierarchy>,
    scheduler: Arc<dyn PresentationScheduler>,
    timeout: Duration,
}

impl Worker {
    fn run(self, receiver: mpsc::Receiver<Job>) {
        for job in receiver {
            self.process(job);
        }
        log::debug!("router worker exiting: all senders dropped");
    }

    fn process(&self, job: Job) {
        let Job {
            id,
            request,
            animated,
            completion,
        } = job;
        log::debug!("request #{id}: admitted {request:?}");

        let outcome = self
            .plan(request)
            .and_then(|plan| self.execute(id, plan, animated));
        match &outcome {
            Ok(()) => log::debug!("request #{id}: finished"),
            Err(err) => log::warn!("request #{id}: abandoned: {err}"),
        }

        let delivery = Delivery::new(id, completion, outcome);
        self.scheduler
            .spawn_task(Box::new(move || delivery.deliver()));
    }

    fn plan(&self, request: Request) -> Result<Plan, TransitionError> {
        if let Request::Actions(plan) = request {
            return Ok(plan);
        }
        let (sender, receiver) = mpsc::sync_channel(1);
        let hierarchy = Arc::clone(&self.hierarchy);
        self.scheduler.spawn_task(Box::new(move || {
            let mut plan = None;
            let outcome = run_contained(|| {
                let stack = hierarchy.current_stack();
                plan = Some(request.plan(&stack));
            });
            let _ = sender.send(match (outcome, plan) {
                (Ok(()), Some(plan)) => Ok(plan),
                (Err(message), _) => Err(TransitionError::PlanningPanicked { message }),
                (Ok(()), None) => Err(TransitionError::PresentationUnavailable),
            });
        }));
        match receiver.recv_timeout(self.timeout) {
            Ok(planned) => planned,
            Err(RecvTimeoutError::Timeout) => Err(TransitionError::PlanningStuck {
                timeout: self.timeout,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(TransitionError::PresentationUnavailable),
        }
    }

    fn execute(&self, id: RequestId, plan: Plan, animated: bool) -> RouteResult {
        let total = plan.len();
        for (step, action) in plan.into_iter().enumerate() {
            let label = action.to_string();
            log::debug!("request #{id}: dispatching {label} ({}/{total})", step + 1);

            let (sender, receiver) = mpsc::sync_channel(1);
            let hierarchy = Arc::clone(&self.hierarchy);
            self.scheduler.spawn_task(Box::new(move || {
                let failure = sender.clone();
                if let Err(message) =
                    run_contained(|| dispatch(&hierarchy, action, animated, Ack::new(sender)))
                {
                    let _ = failure.try_send(Signal::Panicked { message });
                }
            }));

            match receiver.recv_timeout(self.timeout) {
                Ok(Signal::Acknowledged) => {}
                Ok(Signal::MissingOwner { stack_len }) => {
                    return Err(TransitionError::MissingOwner {
                        action: label,
                        stack_len,
                    });
                }
                Ok(Signal::Panicked { message }) => {
                    return Err(TransitionError::Panicked {
                        action: label,
                        message,
                    });
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(TransitionError::Stuck {
                        action: label,
                        timeout: self.timeout,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TransitionError::AckDropped { action: label });
                }
            }
        }
        Ok(())
    }
}

/// Runs on the presentation thread: re-reads the stack and hands `action`
/// to the screen that owns it.
fn dispatch(hierarchy: &Hierarchy, action: Action, animated: bool, ack: Ack) {
    let stack = hierarchy.current_stack();
    let Some(owner) = action
        .owner_index()
        .and_then(|index| stack.routable_at(index))
    else {
        ack.fail(Signal::MissingOwner {
            stack_len: stack.len(),
        });
        return;
    };
    match &action {
        Action::Push { segment, .. } => owner.push(segment, animated, ack),
        Action::Pop { screen, .. } => owner.pop(screen, animated, ack),
        Action::Update { segment, .. } => owner.update(segment, animated, ack),
    }
}

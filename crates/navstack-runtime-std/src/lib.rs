//! Standard presentation runtimes backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the
//! [`PresentationScheduler`] trait defined in `navstack-core`:
//!
//! * [`StdScheduler`] queues tasks for a host that already owns a main loop
//!   and drains them from its presentation thread.
//! * [`PresentationThread`] owns a dedicated thread that runs tasks as they
//!   arrive, for headless hosts and tests.
//!
//! [`StdRuntime`] bundles a presentation thread with a constructor for
//! routers bound to it.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use navstack_core::{
    run_contained, NodeRef, PresentationScheduler, Router, RouterConfig, RouterError,
};
use parking_lot::{Mutex, RwLock};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Scheduler that queues tasks until the host drains them.
pub struct StdScheduler {
    pending: Mutex<VecDeque<Task>>,
    task_requested: AtomicBool,
    task_waker: RwLock<Option<Arc<dyn Fn() + Send + Sync + 'static>>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            task_requested: AtomicBool::new(false),
            task_waker: RwLock::new(None),
        }
    }

    /// Returns whether a task has been scheduled since the last call.
    pub fn take_task_request(&self) -> bool {
        self.task_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker that will be invoked whenever a task is queued.
    pub fn set_task_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self.task_waker.write() = Some(Arc::new(waker));
    }

    /// Clears any registered task waker.
    pub fn clear_task_waker(&self) {
        *self.task_waker.write() = None;
    }

    pub fn has_pending_tasks(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    /// Runs every queued task, including tasks queued while draining.
    /// Call from the presentation thread. Returns how many tasks ran.
    ///
    /// A panicking task is logged and skipped; the remaining tasks still run.
    pub fn drain_tasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.pending.lock().pop_front();
            let Some(task) = next else {
                break;
            };
            if let Err(message) = run_contained(task) {
                log::warn!("presentation task panicked: {message}");
            }
            ran += 1;
        }
        ran
    }

    fn wake(&self) {
        let waker = self.task_waker.read().clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("pending", &self.pending.lock().len())
            .field(
                "task_requested",
                &self.task_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl PresentationScheduler for StdScheduler {
    fn spawn_task(&self, task: Task) {
        self.pending.lock().push_back(task);
        self.task_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

pub const PRESENTATION_THREAD_NAME: &str = "navstack-presentation";

/// Dedicated thread that runs presentation tasks in arrival order.
pub struct PresentationThread {
    sender: Mutex<Option<mpsc::Sender<Task>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl PresentationThread {
    pub fn spawn() -> io::Result<Self> {
        Self::spawn_named(PRESENTATION_THREAD_NAME)
    }

    pub fn spawn_named(name: impl Into<String>) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Task>();
        let handle = thread::Builder::new().name(name.into()).spawn(move || {
            for task in receiver {
                if let Err(message) = run_contained(task) {
                    log::warn!("presentation task panicked: {message}");
                }
            }
            log::debug!("presentation thread exiting");
        })?;
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            thread_id: handle.thread().id(),
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Runs `f` on the presentation thread and waits for its result.
    ///
    /// Runs inline when already on the presentation thread. Returns `None`
    /// if the thread has shut down or `timeout` elapses.
    pub fn run_sync<R: Send + 'static>(
        &self,
        timeout: Duration,
        f: impl FnOnce() -> R + Send + 'static,
    ) -> Option<R> {
        if self.is_current() {
            return Some(f());
        }
        let (sender, receiver) = mpsc::sync_channel(1);
        self.spawn_task(Box::new(move || {
            let _ = sender.send(f());
        }));
        receiver.recv_timeout(timeout).ok()
    }

    /// Stops accepting tasks and waits for queued ones to finish.
    pub fn shutdown(&self) {
        self.sender.lock().take();
        if self.is_current() {
            return;
        }
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::warn!("presentation thread panicked");
            }
        }
    }
}

impl PresentationScheduler for PresentationThread {
    fn spawn_task(&self, task: Task) {
        let sender = self.sender.lock().clone();
        match sender {
            Some(sender) => {
                if sender.send(task).is_err() {
                    log::warn!("presentation thread is gone; dropping task");
                }
            }
            None => log::warn!("presentation thread shut down; dropping task"),
        }
    }
}

impl Drop for PresentationThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for PresentationThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentationThread")
            .field("thread_id", &self.thread_id)
            .field("running", &self.sender.lock().is_some())
            .finish()
    }
}

/// Convenience bundle of a presentation thread and router construction.
#[derive(Clone)]
pub struct StdRuntime {
    presentation: Arc<PresentationThread>,
}

impl StdRuntime {
    /// Creates a new runtime with its own presentation thread.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            presentation: Arc::new(PresentationThread::spawn()?),
        })
    }

    /// Returns the presentation thread.
    pub fn presentation(&self) -> Arc<PresentationThread> {
        Arc::clone(&self.presentation)
    }

    /// Returns the presentation thread as a scheduler.
    pub fn scheduler(&self) -> Arc<dyn PresentationScheduler> {
        self.presentation.clone()
    }

    /// Creates a router whose presentation work runs on this runtime.
    pub fn router(&self, root: NodeRef, config: RouterConfig) -> Result<Router, RouterError> {
        Router::with_config(root, self.scheduler(), config)
    }

    /// Runs `f` on the presentation thread and waits for its result.
    pub fn run_sync<R: Send + 'static>(
        &self,
        timeout: Duration,
        f: impl FnOnce() -> R + Send + 'static,
    ) -> Option<R> {
        self.presentation.run_sync(timeout, f)
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("presentation", &self.presentation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn std_scheduler_runs_tasks_in_order_when_drained() {
        let scheduler = StdScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let wakes = Arc::new(AtomicUsize::new(0));
        {
            let wakes = Arc::clone(&wakes);
            scheduler.set_task_waker(move || {
                wakes.fetch_add(1, Ordering::SeqCst);
            });
        }

        for i in 0..3 {
            let log = Arc::clone(&log);
            scheduler.spawn_task(Box::new(move || log.lock().push(i)));
        }
        assert!(scheduler.take_task_request());
        assert!(!scheduler.take_task_request());
        assert!(scheduler.has_pending_tasks());
        assert!(log.lock().is_empty());

        assert_eq!(scheduler.drain_tasks(), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert_eq!(wakes.load(Ordering::SeqCst), 3);
        assert!(!scheduler.has_pending_tasks());
    }

    #[test]
    fn presentation_thread_runs_tasks_off_the_caller() {
        let thread = PresentationThread::spawn().expect("spawn presentation thread");
        let caller = thread::current().id();
        let ran_on = thread
            .run_sync(Duration::from_secs(2), || thread::current().id())
            .expect("task result");
        assert_ne!(ran_on, caller);
        assert!(!thread.is_current());
    }

    #[test]
    fn presentation_thread_survives_a_panicking_task() {
        let thread = PresentationThread::spawn().expect("spawn presentation thread");
        thread.spawn_task(Box::new(|| panic!("host task failed")));
        assert_eq!(thread.run_sync(Duration::from_secs(2), || 7), Some(7));
    }

    #[test]
    fn draining_continues_past_a_panicking_task() {
        let scheduler = StdScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        scheduler.spawn_task(Box::new(|| panic!("host task failed")));
        {
            let log = Arc::clone(&log);
            scheduler.spawn_task(Box::new(move || log.lock().push("after")));
        }
        assert_eq!(scheduler.drain_tasks(), 2);
        assert_eq!(*log.lock(), vec!["after"]);
    }

    #[test]
    fn tasks_after_shutdown_are_dropped() {
        let thread = PresentationThread::spawn().expect("spawn presentation thread");
        thread.shutdown();
        assert_eq!(thread.run_sync(Duration::from_millis(50), || 1), None);
    }
}

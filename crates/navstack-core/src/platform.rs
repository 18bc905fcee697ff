//! Platform abstraction for the presentation thread.
//!
//! The router never touches presentation state from its own worker. Stack
//! reads and capability calls are packaged as tasks and handed to the host
//! through [`PresentationScheduler`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Runs work on the host's presentation thread.
///
/// Implementations must execute tasks in submission order, on the thread
/// that owns the presentation hierarchy, and must be safe to call from any
/// thread.
pub trait PresentationScheduler: Send + Sync {
    fn spawn_task(&self, task: Box<dyn FnOnce() + Send + 'static>);
}

/// Scheduler that runs every task inline on the calling thread.
///
/// Suitable for hosts without a dedicated presentation thread and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

impl PresentationScheduler for ImmediateScheduler {
    fn spawn_task(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        if let Err(message) = run_contained(task) {
            log::warn!("presentation task panicked: {message}");
        }
    }
}

/// Runs `task`, containing any panic so the calling thread keeps serving
/// later tasks. Returns the panic message when `task` panicked.
pub fn run_contained(task: impl FnOnce()) -> Result<(), String> {
    panic::catch_unwind(AssertUnwindSafe(task)).map_err(|payload| panic_message(&*payload))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contained_panics_report_their_message() {
        assert_eq!(run_contained(|| {}), Ok(()));
        assert_eq!(
            run_contained(|| panic!("screen {} exploded", 3)),
            Err("screen 3 exploded".to_string())
        );
        assert_eq!(run_contained(|| panic!("static")), Err("static".to_string()));
    }
}

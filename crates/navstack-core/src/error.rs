use std::fmt;
use std::io;
use std::time::Duration;

/// Why a request stopped before its plan completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// A screen did not acknowledge `action` within `timeout`.
    Stuck { action: String, timeout: Duration },
    /// A screen dropped the acknowledgment for `action` without completing it.
    AckDropped { action: String },
    /// The screen performing `action` panicked.
    Panicked { action: String, message: String },
    /// The screen that should perform `action` was not in the live stack.
    MissingOwner { action: String, stack_len: usize },
    /// The presentation thread did not produce a plan within `timeout`.
    PlanningStuck { timeout: Duration },
    /// Reading the stack or planning the request panicked, usually inside a
    /// container handler.
    PlanningPanicked { message: String },
    /// The presentation thread dropped a task without running it.
    PresentationUnavailable,
    /// The router's worker thread is no longer running.
    WorkerUnavailable,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::Stuck { action, timeout } => write!(
                f,
                "router is stuck waiting {timeout:?} for `{action}` to acknowledge; \
                 every Routable must complete its Ack"
            ),
            TransitionError::AckDropped { action } => {
                write!(f, "acknowledgment for `{action}` was dropped without completing")
            }
            TransitionError::Panicked { action, message } => {
                write!(f, "screen panicked while performing `{action}`: {message}")
            }
            TransitionError::MissingOwner { action, stack_len } => write!(
                f,
                "no screen owns `{action}` in a stack of {stack_len} screens"
            ),
            TransitionError::PlanningStuck { timeout } => {
                write!(f, "presentation thread did not plan the request within {timeout:?}")
            }
            TransitionError::PlanningPanicked { message } => {
                write!(f, "planning the request panicked: {message}")
            }
            TransitionError::PresentationUnavailable => {
                f.write_str("presentation thread dropped a router task")
            }
            TransitionError::WorkerUnavailable => f.write_str("router worker is not running"),
        }
    }
}

impl std::error::Error for TransitionError {}

/// Errors raised while setting up a router.
#[derive(Debug)]
pub enum RouterError {
    WorkerSpawn(io::Error),
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::WorkerSpawn(err) => write!(f, "failed to spawn router worker: {err}"),
        }
    }
}

impl std::error::Error for RouterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouterError::WorkerSpawn(err) => Some(err),
        }
    }
}

impl From<io::Error> for RouterError {
    fn from(err: io::Error) -> Self {
        RouterError::WorkerSpawn(err)
    }
}

/// Result handed to every request's completion.
pub type RouteResult = Result<(), TransitionError>;

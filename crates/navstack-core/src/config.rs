use std::time::Duration;

use crate::stack::DEFAULT_MAX_HOPS;

pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_WORKER_NAME: &str = "navstack-router";

/// Tuning knobs for a [`Router`](crate::Router).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// How long a single capability call may take before it is considered
    /// stuck. Also bounds the planning hop onto the presentation thread.
    pub ack_timeout: Duration,
    /// Upper bound on handler resolutions per stack walk.
    pub max_hops: usize,
    pub worker_name: String,
}

impl RouterConfig {
    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops.max(1);
        self
    }

    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            max_hops: DEFAULT_MAX_HOPS,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
        }
    }
}

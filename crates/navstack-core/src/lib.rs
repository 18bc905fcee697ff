#![doc = r"Declarative screen-stack routing: reconcile a desired sequence of screens with the live presentation hierarchy and drive the resulting transitions one at a time."]

pub mod action;
pub mod config;
pub mod error;
pub mod executor;
pub mod hierarchy;
pub mod node;
pub mod platform;
pub mod reconcile;
pub mod registry;
pub mod routable;
pub mod router;
pub mod segment;
pub mod stack;

pub use action::{Action, ActionKind, Plan};
pub use config::{RouterConfig, DEFAULT_ACK_TIMEOUT};
pub use error::{RouteResult, RouterError, TransitionError};
pub use executor::{Completion, Request, SequentialExecutor};
pub use hierarchy::Hierarchy;
pub use node::{same_node, Node, NodeRef, StackContainer, TabContainer};
pub use platform::{run_contained, ImmediateScheduler, PresentationScheduler};
pub use reconcile::{plan_pop_last, plan_pop_to_group, plan_push, plan_route};
pub use registry::{Extraction, HandlerEntry, HandlerRegistry, Matcher};
pub use routable::{Ack, EmptyRoutable, Routable};
pub use router::Router;
pub use segment::{Segment, SegmentGroup};
pub use stack::{current_stack, Stack, StackBuilder};

#[cfg(test)]
#[path = "tests/fixtures.rs"]
pub(crate) mod fixtures;

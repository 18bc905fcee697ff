//! The screen capability.
//!
//! Every addressable screen implements [`Routable`]. Each transition call gets
//! an [`Ack`] that must be completed once the screen has finished presenting,
//! removing, or updating. The router waits for that acknowledgment before it
//! moves to the next action.

use std::fmt;
use std::sync::mpsc::SyncSender;

use crate::node::NodeRef;
use crate::segment::{Segment, SegmentGroup};

/// Capability implemented by addressable screens.
///
/// All methods have inert defaults: transitions acknowledge immediately and
/// reuse is always refused.
pub trait Routable: Send + Sync {
    /// Present a new screen for `segment` on top of this one.
    fn push(&self, segment: &Segment, animated: bool, ack: Ack) {
        let _ = (segment, animated);
        ack.done();
    }

    /// Remove `screen` and everything presented above it. `screen` is the
    /// node directly above this one in the stack.
    fn pop(&self, screen: &NodeRef, animated: bool, ack: Ack) {
        let _ = (screen, animated);
        ack.done();
    }

    /// Apply `segment` to this screen in place.
    fn update(&self, segment: &Segment, animated: bool, ack: Ack) {
        let _ = (segment, animated);
        ack.done();
    }

    /// Whether this screen can be kept and updated to show `segment`.
    fn should_reuse(&self, segment: &Segment) -> bool {
        let _ = segment;
        false
    }

    /// Groups this screen belongs to.
    fn segment_groups(&self) -> Vec<SegmentGroup> {
        Vec::new()
    }

    fn member_of(&self, group: &SegmentGroup) -> bool {
        self.segment_groups().iter().any(|g| g == group)
    }
}

/// Capability used for nodes that do not implement [`Routable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyRoutable;

impl Routable for EmptyRoutable {}

pub(crate) static EMPTY_ROUTABLE: EmptyRoutable = EmptyRoutable;

/// What a presentation-thread task reports back to the waiting worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Signal {
    Acknowledged,
    MissingOwner { stack_len: usize },
    Panicked { message: String },
}

/// One-shot acknowledgment for a single transition.
///
/// Dropping an `Ack` without calling [`Ack::done`] abandons the running
/// request.
#[must_use = "the router waits until the acknowledgment is completed"]
pub struct Ack {
    sender: Option<SyncSender<Signal>>,
}

impl Ack {
    pub(crate) fn new(sender: SyncSender<Signal>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// An acknowledgment nobody waits for. Handy when driving a [`Routable`]
    /// directly.
    pub fn detached() -> Self {
        Self { sender: None }
    }

    pub fn done(mut self) {
        if let Some(sender) = self.sender.take() {
            // The worker may already have given up on this action.
            let _ = sender.try_send(Signal::Acknowledged);
        }
    }

    /// Converts the acknowledgment into a plain completion closure.
    pub fn into_callback(self) -> impl FnOnce() + Send + 'static {
        move || self.done()
    }

    pub(crate) fn fail(mut self, signal: Signal) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.try_send(signal);
        }
    }
}

impl fmt::Debug for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ack")
            .field("pending", &self.sender.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{self, TryRecvError};

    struct Grouped;

    impl Routable for Grouped {
        fn segment_groups(&self) -> Vec<SegmentGroup> {
            vec!["modal".into(), "auth".into()]
        }
    }

    #[test]
    fn empty_routable_acknowledges_and_never_reuses() {
        let (tx, rx) = mpsc::sync_channel(1);
        EMPTY_ROUTABLE.push(&Segment::named("a"), true, Ack::new(tx.clone()));
        assert_eq!(rx.try_recv(), Ok(Signal::Acknowledged));
        EMPTY_ROUTABLE.update(&Segment::named("a"), false, Ack::new(tx));
        assert_eq!(rx.try_recv(), Ok(Signal::Acknowledged));
        assert!(!EMPTY_ROUTABLE.should_reuse(&Segment::named("a")));
        assert!(!EMPTY_ROUTABLE.member_of(&"modal".into()));
    }

    #[test]
    fn membership_defaults_to_declared_groups() {
        assert!(Grouped.member_of(&"auth".into()));
        assert!(!Grouped.member_of(&"sheet".into()));
    }

    #[test]
    fn dropping_an_ack_disconnects_the_waiter() {
        let (tx, rx) = mpsc::sync_channel::<Signal>(1);
        drop(Ack::new(tx));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn callback_form_signals_once() {
        let (tx, rx) = mpsc::sync_channel(1);
        let callback = Ack::new(tx).into_callback();
        callback();
        assert_eq!(rx.recv(), Ok(Signal::Acknowledged));
        assert!(rx.recv().is_err());
    }
}

use std::fmt;

use crate::node::{NodeName, NodeRef};
use crate::segment::Segment;

/// One imperative step of a plan.
///
/// `index` addresses the stack snapshot the plan was built from. For `Push`
/// and `Pop` the screen at `index - 1` performs the transition; `Update` is
/// applied by the screen at `index` itself.
#[derive(Clone)]
pub enum Action {
    Push { index: usize, segment: Segment },
    Pop { index: usize, screen: NodeRef },
    Update { index: usize, segment: Segment },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Push,
    Pop,
    Update,
}

impl Action {
    pub fn index(&self) -> usize {
        match self {
            Action::Push { index, .. } | Action::Pop { index, .. } | Action::Update { index, .. } => {
                *index
            }
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Push { .. } => ActionKind::Push,
            Action::Pop { .. } => ActionKind::Pop,
            Action::Update { .. } => ActionKind::Update,
        }
    }

    /// Stack position of the screen that performs this action.
    pub fn owner_index(&self) -> Option<usize> {
        match self {
            Action::Update { index, .. } => Some(*index),
            Action::Push { index, .. } | Action::Pop { index, .. } => index.checked_sub(1),
        }
    }

    pub fn segment(&self) -> Option<&Segment> {
        match self {
            Action::Push { segment, .. } | Action::Update { segment, .. } => Some(segment),
            Action::Pop { .. } => None,
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Push { index, segment } => f
                .debug_struct("Push")
                .field("index", index)
                .field("segment", segment)
                .finish(),
            Action::Pop { index, screen } => f
                .debug_struct("Pop")
                .field("index", index)
                .field("screen", &screen.debug_name())
                .finish(),
            Action::Update { index, segment } => f
                .debug_struct("Update")
                .field("index", index)
                .field("segment", segment)
                .finish(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Push { index, segment } => {
                write!(f, "push({index}, {})", segment.label().unwrap_or("<opaque>"))
            }
            Action::Pop { index, screen } => write!(f, "pop({index}, {})", NodeName(screen)),
            Action::Update { index, segment } => {
                write!(f, "update({index}, {})", segment.label().unwrap_or("<opaque>"))
            }
        }
    }
}

/// Ordered list of actions produced for one request.
pub type Plan = Vec<Action>;

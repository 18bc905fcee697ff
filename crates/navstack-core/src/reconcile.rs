//! Turning requests into plans.
//!
//! [`plan_route`] is a longest-common-prefix diff: existing screens are kept
//! and updated while they accept the desired segment at the same position,
//! the first mismatch is torn down with a single cascading pop, and the rest
//! of the desired sequence is pushed on top.

use crate::action::{Action, Plan};
use crate::segment::{Segment, SegmentGroup};
use crate::stack::Stack;

/// Plan that reconciles `stack` with `desired`.
///
/// `desired[k]` corresponds to stack position `k + 1`; the root at index 0
/// is never reconciled.
pub fn plan_route(stack: &Stack, desired: &[Segment]) -> Plan {
    let mut plan = Plan::new();
    let n = stack.len();

    let mut index = 1;
    while index < n && index - 1 < desired.len() {
        let segment = &desired[index - 1];
        let reuse = stack
            .routable_at(index)
            .is_some_and(|routable| routable.should_reuse(segment));
        if !reuse {
            break;
        }
        plan.push(Action::Update {
            index,
            segment: segment.clone(),
        });
        index += 1;
    }

    let keep = plan.len() + 1;
    if n > keep {
        if let Some(screen) = stack.get(keep) {
            plan.push(Action::Pop {
                index: keep,
                screen: screen.clone(),
            });
        }
    }

    for (offset, segment) in desired.iter().enumerate().skip(keep - 1) {
        plan.push(Action::Push {
            index: offset + 1,
            segment: segment.clone(),
        });
    }

    plan
}

/// Plan that pushes `segments` on top of the current stack.
pub fn plan_push(stack: &Stack, segments: &[Segment]) -> Plan {
    let base = stack.len();
    segments
        .iter()
        .enumerate()
        .map(|(offset, segment)| Action::Push {
            index: base + offset,
            segment: segment.clone(),
        })
        .collect()
}

/// Plan that removes the top `count` screens. The root is never removed.
pub fn plan_pop_last(stack: &Stack, count: usize) -> Plan {
    let removable = stack.len().saturating_sub(1);
    let count = count.min(removable);
    if count == 0 {
        return Plan::new();
    }
    pop_from(stack, stack.len() - count)
}

/// Plan that removes the shallowest screen in `group` and everything above
/// it. Empty when no screen belongs to the group.
pub fn plan_pop_to_group(stack: &Stack, group: &SegmentGroup) -> Plan {
    match stack.first_member_of(group) {
        Some(index) => pop_from(stack, index),
        None => Plan::new(),
    }
}

fn pop_from(stack: &Stack, index: usize) -> Plan {
    stack
        .get(index)
        .map(|screen| Action::Pop {
            index,
            screen: screen.clone(),
        })
        .into_iter()
        .collect()
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;

//! Caller-declared route segments.
//!
//! A [`Segment`] describes the desired state of one screen. The router never
//! looks inside the payload; it only forwards segments to the screens that
//! present or update them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque tag used for group-targeted dismissal.
///
/// Groups carry no ordering; two groups are the same group when their names
/// compare equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SegmentGroup(Arc<str>);

impl SegmentGroup {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SegmentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SegmentGroup").field(&&*self.0).finish()
    }
}

impl From<&str> for SegmentGroup {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for SegmentGroup {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

/// Immutable description of one screen in a desired stack.
///
/// Cloning is cheap: the payload is shared.
#[derive(Clone)]
pub struct Segment {
    payload: Arc<dyn Any + Send + Sync>,
    label: Option<Arc<str>>,
    groups: Vec<SegmentGroup>,
}

impl Segment {
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self {
            payload: Arc::new(payload),
            label: None,
            groups: Vec::new(),
        }
    }

    /// Creates a segment whose payload is its own label.
    pub fn named(label: impl AsRef<str>) -> Self {
        let label: Arc<str> = Arc::from(label.as_ref());
        Self {
            payload: Arc::new(label.to_string()),
            label: Some(label),
            groups: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl AsRef<str>) -> Self {
        self.label = Some(Arc::from(label.as_ref()));
        self
    }

    pub fn with_group(mut self, group: impl Into<SegmentGroup>) -> Self {
        let group = group.into();
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
        self
    }

    /// Returns the payload if it is a `T`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn groups(&self) -> &[SegmentGroup] {
        &self.groups
    }

    pub fn in_group(&self, group: &SegmentGroup) -> bool {
        self.groups.contains(group)
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Segment");
        match &self.label {
            Some(label) => debug.field("label", &&**label),
            None => debug.field("label", &"<opaque>"),
        };
        if !self.groups.is_empty() {
            debug.field("groups", &self.groups);
        }
        debug.finish()
    }
}

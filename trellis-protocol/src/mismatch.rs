//! Schema skew between the producer and the consumer.
//!
//! Whenever one side was generated from a newer (or incompatible) schema than the
//! other, tags arrive that the local side does not know. Every such occurrence is
//! reported to a [`MismatchHandler`] exactly once.

use crate::ids::{ChildrenTag, EventTag, Id, ModifierTag, PropertyTag, WidgetTag};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// One unknown-entity occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mismatch {
    UnknownWidget {
        tag: WidgetTag,
    },
    UnknownModifier {
        tag: ModifierTag,
    },
    UnknownChildren {
        widget_tag: WidgetTag,
        tag: ChildrenTag,
    },
    UnknownProperty {
        widget_tag: WidgetTag,
        tag: PropertyTag,
    },
    UnknownEvent {
        widget_tag: WidgetTag,
        tag: EventTag,
    },
    UnknownEventNode {
        id: Id,
        tag: EventTag,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Mismatch::UnknownWidget { tag } => write!(f, "Unknown widget tag {tag}"),
            Mismatch::UnknownModifier { tag } => write!(f, "Unknown modifier tag {tag}"),
            Mismatch::UnknownChildren { widget_tag, tag } => {
                write!(f, "Unknown children tag {tag} for widget tag {widget_tag}")
            }
            Mismatch::UnknownProperty { widget_tag, tag } => {
                write!(f, "Unknown property tag {tag} for widget tag {widget_tag}")
            }
            Mismatch::UnknownEvent { widget_tag, tag } => {
                write!(f, "Unknown event tag {tag} for widget tag {widget_tag}")
            }
            Mismatch::UnknownEventNode { id, tag } => {
                write!(f, "Unknown node ID {id} for event with tag {tag}")
            }
        }
    }
}

/// A mismatch the active policy refused to tolerate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{0}")]
pub struct MismatchError(pub Mismatch);

/// Policy invoked for every unknown tag. Returning `Err` makes the mismatch fatal
/// for the current batch; returning `Ok` skips the offending entity.
pub trait MismatchHandler {
    fn on_mismatch(&self, mismatch: Mismatch) -> Result<(), MismatchError>;

    /// A `Create` named a widget tag the local schema does not have.
    fn on_unknown_widget(&self, tag: WidgetTag) -> Result<(), MismatchError> {
        self.on_mismatch(Mismatch::UnknownWidget { tag })
    }

    fn on_unknown_modifier(&self, tag: ModifierTag) -> Result<(), MismatchError> {
        self.on_mismatch(Mismatch::UnknownModifier { tag })
    }

    /// A children change targeted a slot the (known) widget does not expose.
    fn on_unknown_children(
        &self,
        widget_tag: WidgetTag,
        tag: ChildrenTag,
    ) -> Result<(), MismatchError> {
        self.on_mismatch(Mismatch::UnknownChildren { widget_tag, tag })
    }

    fn on_unknown_property(
        &self,
        widget_tag: WidgetTag,
        tag: PropertyTag,
    ) -> Result<(), MismatchError> {
        self.on_mismatch(Mismatch::UnknownProperty { widget_tag, tag })
    }

    /// Called every time, so three clicks on a widget without a click event report
    /// three mismatches.
    fn on_unknown_event(&self, widget_tag: WidgetTag, tag: EventTag) -> Result<(), MismatchError> {
        self.on_mismatch(Mismatch::UnknownEvent { widget_tag, tag })
    }

    fn on_unknown_event_node(&self, id: Id, tag: EventTag) -> Result<(), MismatchError> {
        self.on_mismatch(Mismatch::UnknownEventNode { id, tag })
    }
}

/// Fails fast on every mismatch. Use during development and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThrowingMismatchHandler;

impl MismatchHandler for ThrowingMismatchHandler {
    fn on_mismatch(&self, mismatch: Mismatch) -> Result<(), MismatchError> {
        Err(MismatchError(mismatch))
    }
}

/// Reports every mismatch to a callback and keeps going.
pub struct RecordingMismatchHandler {
    callback: Box<dyn Fn(Mismatch)>,
}

impl RecordingMismatchHandler {
    pub fn new(callback: impl Fn(Mismatch) + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Records into a shared [`MismatchLog`].
    pub fn with_log(log: MismatchLog) -> Self {
        Self::new(move |mismatch| log.push(mismatch))
    }
}

impl Default for RecordingMismatchHandler {
    fn default() -> Self {
        Self::new(|mismatch| tracing::warn!("protocol mismatch ignored: {}", mismatch))
    }
}

impl MismatchHandler for RecordingMismatchHandler {
    fn on_mismatch(&self, mismatch: Mismatch) -> Result<(), MismatchError> {
        (self.callback)(mismatch);
        Ok(())
    }
}

/// Shared, thread-safe list of recorded mismatches.
#[derive(Debug, Default, Clone)]
pub struct MismatchLog {
    entries: Arc<Mutex<Vec<Mismatch>>>,
}

impl MismatchLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, mismatch: Mismatch) {
        tracing::warn!("protocol mismatch recorded: {}", mismatch);
        self.entries.lock().push(mismatch);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Mismatch> {
        self.entries.lock().clone()
    }

    /// Drain all recorded mismatches in arrival order.
    pub fn take(&self) -> Vec<Mismatch> {
        std::mem::take(&mut *self.entries.lock())
    }
}

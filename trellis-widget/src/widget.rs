use crate::children::WidgetChildren;
use crate::modifier::Modifier;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use trellis_protocol::{ChildrenTag, EventTag, Id, PropertyTag, UiEvent, UiEventSink};

/// One native widget, as implemented by a platform for one widget tag.
///
/// `W` is the platform's cheap handle type (a view reference, a DOM node, ...).
pub trait Widget<W> {
    /// Handle inserted into the parent's native container.
    fn value(&self) -> W;

    /// Set one property. Unknown tags must be reported with
    /// [`PropertyError::Unknown`] so the host can route them to its mismatch policy.
    fn apply(
        &mut self,
        tag: PropertyTag,
        value: &Value,
        events: &EventEmitter,
    ) -> Result<(), PropertyError>;

    fn set_modifier(&mut self, modifier: Modifier);

    /// Native container for one children slot, or `None` if this widget has no
    /// such slot.
    fn children(&mut self, tag: ChildrenTag) -> Option<&mut dyn WidgetChildren<W>> {
        let _ = tag;
        None
    }

    /// Release native resources. Called once, after all children were detached.
    fn detach(&mut self) {}
}

#[derive(Error, Debug)]
pub enum PropertyError {
    #[error("unknown property tag {0}")]
    Unknown(PropertyTag),

    #[error("invalid value for property tag {tag}: {source}")]
    InvalidValue {
        tag: PropertyTag,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode a property payload into the widget's native type.
pub fn decode_property<T: DeserializeOwned>(
    tag: PropertyTag,
    value: &Value,
) -> Result<T, PropertyError> {
    T::deserialize(value).map_err(|source| PropertyError::InvalidValue { tag, source })
}

/// Lets a widget send events on behalf of its node.
///
/// The node id is read when the event is built, so a node that was re-bound to a
/// new id by reuse reports the new id from callbacks registered earlier.
#[derive(Clone)]
pub struct EventEmitter {
    id: Rc<Cell<Id>>,
    sink: Rc<dyn UiEventSink>,
}

impl EventEmitter {
    pub fn new(id: Rc<Cell<Id>>, sink: Rc<dyn UiEventSink>) -> Self {
        Self { id, sink }
    }

    pub fn id(&self) -> Id {
        self.id.get()
    }

    /// Start an event addressed to the current node id.
    pub fn event(&self, tag: EventTag) -> UiEvent {
        UiEvent::new(self.id.get(), tag)
    }

    pub fn send(&self, event: UiEvent) {
        self.sink.send_event(event);
    }

    pub fn emit(&self, tag: EventTag) {
        self.send(self.event(tag));
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("id", &self.id.get())
            .finish_non_exhaustive()
    }
}

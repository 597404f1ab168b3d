use crate::event::Event;
use crate::ids::{EventTag, Id, WidgetTag};
use crate::mismatch::{MismatchError, MismatchHandler};
use serde_json::Value;
use std::collections::HashMap;

pub type EventHandler = Box<dyn FnMut(&[Value])>;

/// Producer-side view of one node that can receive events.
pub struct EventTarget {
    widget_tag: WidgetTag,
    handlers: HashMap<EventTag, EventHandler>,
}

impl EventTarget {
    pub fn new(widget_tag: WidgetTag) -> Self {
        Self {
            widget_tag,
            handlers: HashMap::new(),
        }
    }

    pub fn on(mut self, tag: EventTag, handler: impl FnMut(&[Value]) + 'static) -> Self {
        self.handlers.insert(tag, Box::new(handler));
        self
    }

    pub fn widget_tag(&self) -> WidgetTag {
        self.widget_tag
    }
}

/// Delivers wire events to the producer-side node they are addressed to.
#[derive(Default)]
pub struct EventRouter {
    targets: HashMap<Id, EventTarget>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: Id, target: EventTarget) -> Option<EventTarget> {
        self.targets.insert(id, target)
    }

    pub fn unregister(&mut self, id: Id) -> Option<EventTarget> {
        self.targets.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns `Ok(true)` when a handler ran, `Ok(false)` when the event was
    /// dropped as a tolerated mismatch.
    pub fn route(
        &mut self,
        event: &Event,
        mismatch: &dyn MismatchHandler,
    ) -> Result<bool, MismatchError> {
        let Some(target) = self.targets.get_mut(&event.id) else {
            mismatch.on_unknown_event_node(event.id, event.tag)?;
            return Ok(false);
        };
        match target.handlers.get_mut(&event.tag) {
            Some(handler) => {
                handler(&event.args);
                Ok(true)
            }
            None => {
                mismatch.on_unknown_event(target.widget_tag, event.tag)?;
                Ok(false)
            }
        }
    }
}

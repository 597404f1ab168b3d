use std::cell::RefCell;
use std::rc::Rc;
use trellis_protocol::{UiEvent, UiEventSink};

/// FIFO buffer for UI events, flushed across the boundary in one go.
///
/// Clones share the same buffer, so one clone can be handed to the bridge as its
/// sink while the UI loop keeps another for flushing.
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    events: Rc<RefCell<Vec<UiEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an event to the back of the queue
    pub fn push(&self, event: UiEvent) {
        self.events.borrow_mut().push(event);
    }

    /// Take all events in FIFO order
    pub fn drain(&self) -> Vec<UiEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Forward every queued event to `sink`, returning how many were sent.
    pub fn flush_into(&self, sink: &dyn UiEventSink) -> usize {
        let events = self.drain();
        let count = events.len();
        for event in events {
            sink.send_event(event);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl UiEventSink for EventQueue {
    fn send_event(&self, event: UiEvent) {
        self.push(event);
    }
}

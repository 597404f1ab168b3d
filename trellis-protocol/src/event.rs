use crate::ids::{EventTag, Id};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;

/// Wire form of an event: arguments are already serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Widget from which this event originated.
    pub id: Id,
    pub tag: EventTag,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Event {
    pub fn new(id: Id, tag: EventTag, args: Vec<Value>) -> Self {
        Self { id, tag, args }
    }
}

type DeferredArg = Box<dyn FnOnce() -> serde_json::Result<Value> + Send>;

/// Event as produced on the UI thread.
///
/// Arguments are moved in when the native callback fires, so later native
/// mutation cannot race with them. Serialization happens in [`UiEvent::into_event`],
/// which may run on another thread.
pub struct UiEvent {
    pub id: Id,
    pub tag: EventTag,
    args: SmallVec<[DeferredArg; 2]>,
}

impl UiEvent {
    pub fn new(id: Id, tag: EventTag) -> Self {
        Self {
            id,
            tag,
            args: SmallVec::new(),
        }
    }

    pub fn with_arg<T>(mut self, arg: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        self.args.push(Box::new(move || serde_json::to_value(&arg)));
        self
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn into_event(self) -> serde_json::Result<Event> {
        let args = self
            .args
            .into_iter()
            .map(|arg| arg())
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(Event {
            id: self.id,
            tag: self.tag,
            args,
        })
    }
}

impl fmt::Debug for UiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiEvent")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("args", &self.args.len())
            .finish()
    }
}

/// Where widgets deliver their events. Must not block.
pub trait UiEventSink {
    fn send_event(&self, event: UiEvent);
}

impl<F> UiEventSink for F
where
    F: Fn(UiEvent),
{
    fn send_event(&self, event: UiEvent) {
        self(event)
    }
}

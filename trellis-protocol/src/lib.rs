//! Wire model shared by the UI producer and the native host.
//!
//! Nothing in here holds state about a live tree: these are the data contracts
//! exchanged across the boundary, plus the policy object used when the two sides
//! disagree about the schema.

mod change;
mod event;
mod ids;
mod mismatch;
mod router;

pub use change::{
    Change, ChangesSink, ChildrenChange, Create, ModifierChange, ModifierElement, PropertyChange,
};
pub use event::{Event, UiEvent, UiEventSink};
pub use ids::{ChildrenTag, EventTag, Id, ModifierTag, PropertyTag, WidgetTag};
pub use mismatch::{
    Mismatch, MismatchError, MismatchHandler, MismatchLog, RecordingMismatchHandler,
    ThrowingMismatchHandler,
};
pub use router::{EventHandler, EventRouter, EventTarget};

//! Platform-facing widget contract.
//!
//! A platform integrator implements [`Widget`] for each widget type of the schema
//! and [`WidgetChildren`] for each native container. Everything else about the
//! tree is owned by the host.

mod children;
mod list;
mod modifier;
mod widget;

pub use children::{
    ChildrenError, WidgetChildren, move_items, validate_insert, validate_move, validate_remove,
};
pub use list::MutableListChildren;
pub use modifier::{Modifier, ModifierError, ModifierValue, decode_modifier};
pub use widget::{EventEmitter, PropertyError, Widget, decode_property};

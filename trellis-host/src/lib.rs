//! Native side of the tree protocol.
//!
//! A [`Bridge`] owns one native tree and applies ordered change batches to it.
//! Subtrees removed from the tree can be pooled and taken over by structurally
//! identical subtrees built later, which keeps native state such as scroll
//! offsets across a full rebuild.

mod bridge;
mod config;
mod dispatch;
mod error;
mod events;
mod factory;
mod node;
mod pending;
mod reuse;

pub use bridge::{Bridge, BridgeBuilder};
pub use config::{BridgeConfig, MismatchPolicy};
pub use dispatch::{ChangeLoop, ChangeSender, ChannelEventSink, change_channel, event_channel};
pub use error::{BridgeError, Result};
pub use events::EventQueue;
pub use factory::{ProtocolFactory, SchemaTable, WidgetProtocol};

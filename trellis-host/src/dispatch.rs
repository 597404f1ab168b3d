//! The asynchronous boundary between the producer and the UI thread.

use crate::bridge::Bridge;
use crate::error::Result;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use trellis_protocol::{Change, ChangesSink, UiEvent, UiEventSink};

/// Producer-side handle for shipping change batches to a [`ChangeLoop`].
#[derive(Debug, Clone)]
pub struct ChangeSender {
    tx: UnboundedSender<Vec<Change>>,
}

impl ChangesSink for ChangeSender {
    type Error = SendError<Vec<Change>>;

    fn send_changes(&mut self, changes: Vec<Change>) -> std::result::Result<(), Self::Error> {
        self.tx.send(changes)
    }
}

pub fn change_channel() -> (ChangeSender, UnboundedReceiver<Vec<Change>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChangeSender { tx }, rx)
}

/// Forwards events to the producer without blocking the UI thread.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: UnboundedSender<UiEvent>,
}

impl UiEventSink for ChannelEventSink {
    fn send_event(&self, event: UiEvent) {
        if let Err(err) = self.tx.send(event) {
            tracing::debug!("event receiver is gone, dropping {:?}", err.0);
        }
    }
}

pub fn event_channel() -> (ChannelEventSink, UnboundedReceiver<UiEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelEventSink { tx }, rx)
}

/// Applies batches as they arrive, each one to completion before the next.
pub struct ChangeLoop<W> {
    bridge: Bridge<W>,
    rx: UnboundedReceiver<Vec<Change>>,
}

impl<W> ChangeLoop<W> {
    pub fn new(bridge: Bridge<W>, rx: UnboundedReceiver<Vec<Change>>) -> Self {
        Self { bridge, rx }
    }

    /// Run until every sender is dropped, then hand the bridge back.
    ///
    /// A failing batch closes the bridge and ends the loop with its error.
    pub async fn run(mut self) -> Result<Bridge<W>> {
        while let Some(changes) = self.rx.recv().await {
            if let Err(e) = self.bridge.apply(changes) {
                tracing::error!("Change batch failed: {}", e);
                self.bridge.close();
                return Err(e);
            }
        }
        Ok(self.bridge)
    }
}

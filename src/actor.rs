//! Actors own their state and are driven by events sent over a channel.
//!
//! Each event carries the tracing span it was sent from, so work done on the
//! receiving side shows up under the sender's span.

pub mod switch_controller;
pub mod tab_switcher;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;
use tracing::Span;

pub struct Sender<Event>(mpsc::UnboundedSender<(Span, Event)>);

pub type Receiver<Event> = mpsc::UnboundedReceiver<(Span, Event)>;

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Sender(tx), rx)
}

impl<Event> Sender<Event> {
    pub fn send(&self, event: Event) -> Result<(), SendError<Event>> {
        self.0.send((Span::current(), event)).map_err(|SendError((_, event))| SendError(event))
    }

    /// Sends and drops the event if the actor has gone away.
    pub fn try_send(&self, event: Event) { _ = self.send(event); }
}

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Event> std::fmt::Debug for Sender<Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender").finish_non_exhaustive()
    }
}

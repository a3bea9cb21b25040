//! Span-carrying channels shared by the actors in this crate.
//!
//! Every message is paired with the [`Span`] that was current when it was
//! sent, so the receiving side can re-enter it while handling the event.

use tokio::sync::mpsc;
use tracing::Span;

pub mod broadcast;
pub mod icon_drag;
pub mod panel_manager;
pub mod shell;
pub mod workspace_preview;

pub struct Sender<Event>(mpsc::UnboundedSender<(Span, Event)>);
pub type Receiver<Event> = mpsc::UnboundedReceiver<(Span, Event)>;

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Event> std::fmt::Debug for Sender<Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Sender").finish_non_exhaustive()
    }
}

impl<Event> Sender<Event> {
    /// Sends an event, dropping it if the receiver is gone.
    pub fn send(&self, event: Event) { _ = self.try_send(event); }

    pub fn try_send(&self, event: Event) -> Result<(), mpsc::error::SendError<(Span, Event)>> {
        self.0.send((Span::current(), event))
    }

    pub fn is_closed(&self) -> bool { self.0.is_closed() }
}

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Sender(tx), rx)
}

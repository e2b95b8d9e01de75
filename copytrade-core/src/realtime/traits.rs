// realtime/traits.rs

use tokio::sync::mpsc;

use super::errors::RealtimeError;
use super::protocol::{ClientMessage, Handshake, TransportEvent};

/// Events as they reach the client, tagged with the connection that sent them
pub type TaggedEvent = (u64, TransportEvent);

/// Event handle given to one connection. Every event carries the id the
/// client assigned when opening it, so events from a replaced connection can
/// be dropped.
#[derive(Debug, Clone)]
pub struct EventSender {
    connection_id: u64,
    tx: mpsc::UnboundedSender<TaggedEvent>,
}

impl EventSender {
    pub fn new(connection_id: u64, tx: mpsc::UnboundedSender<TaggedEvent>) -> Self {
        Self { connection_id, tx }
    }

    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// False once the receiving client is gone
    pub fn send(&self, event: TransportEvent) -> bool {
        self.tx.send((self.connection_id, event)).is_ok()
    }
}

/// Opens push-event connections.
///
/// `open` returns immediately; progress (connected, disconnected, messages)
/// is reported through `events`.
pub trait Transport: Send + Sync {
    fn open(
        &self,
        handshake: &Handshake,
        events: EventSender,
    ) -> Result<Box<dyn Connection>, RealtimeError>;
}

/// One live or reconnecting connection
pub trait Connection: Send + Sync {
    /// True while the underlying socket or polling session is up
    fn is_open(&self) -> bool;

    fn emit(&self, message: &ClientMessage) -> Result<(), RealtimeError>;

    fn close(&self);
}

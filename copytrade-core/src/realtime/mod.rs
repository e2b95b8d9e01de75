// realtime/mod.rs

pub mod cache;
pub mod client;
pub mod errors;
pub mod polling;
pub mod protocol;
pub mod traits;
pub mod ws;

pub use cache::LatestValueCache;
pub use client::{ConnectionState, RealtimeClient};
pub use errors::RealtimeError;
pub use protocol::{ClientMessage, Frame, Handshake, ServerEvent, TransportEvent};
pub use traits::{Connection, EventSender, TaggedEvent, Transport};
pub use ws::{ReconnectPolicy, TransportKind, WsTransport};

//! WebSocket Module - Realtime side of the chat client
//!
//! - `events`: typed events produced by the transport
//! - `transport`: the `RealtimeTransport` seam used by the façade
//! - `connection`: `WsTransport`, the `tokio-tungstenite` implementation
//! - `router`: background task fanning events out to the caches

pub mod connection;
pub mod events;
pub mod router;
pub mod transport;

pub use connection::WsTransport;
pub use events::{ChatNotice, SocketEvent};
pub use router::{EventRouter, RouterHandle};
pub use transport::RealtimeTransport;

/// Seconds between keep-alive pings on an idle connection
pub const KEEPALIVE_INTERVAL_SECS: u64 = 30;

/// Capacity of the notice broadcast channel; slower observers skip old notices
pub const NOTICE_CHANNEL_CAPACITY: usize = 256;

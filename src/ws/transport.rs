//! RealtimeTransport - Seam between the façade and the persistent connection

use crate::core::ChatError;
use crate::dtos::WsCommandDTO;
use crate::entities::IdType;
use crate::ws::SocketEvent;
use tokio::sync::mpsc::UnboundedSender;

/// A persistent, authenticated connection to the backend.
///
/// Reconnection is not handled here: when the connection drops the event
/// sender handed to `connect` is released and `is_connected` turns false.
pub trait RealtimeTransport {
    /// Opens the connection. Incoming events are pushed into `events`, in
    /// arrival order, until the connection ends.
    async fn connect(&self, events: UnboundedSender<SocketEvent>) -> Result<(), ChatError>;

    /// Closes the connection. No-op when already closed.
    async fn disconnect(&self);

    fn is_connected(&self) -> bool;

    /// Queues a frame for the server. `Ok` means the transport accepted it.
    fn send(&self, command: WsCommandDTO) -> Result<(), ChatError>;

    fn join_room(&self, room_id: IdType) -> Result<(), ChatError> {
        self.send(WsCommandDTO::JoinRoom { room_id })
    }

    fn leave_room(&self, room_id: IdType) -> Result<(), ChatError> {
        self.send(WsCommandDTO::LeaveRoom { room_id })
    }

    fn send_message(&self, room_id: IdType, text: &str) -> Result<(), ChatError> {
        self.send(WsCommandDTO::SendMessage {
            room_id,
            message: text.to_string(),
        })
    }

    fn typing_start(&self, room_id: IdType) -> Result<(), ChatError> {
        self.send(WsCommandDTO::TypingStart { room_id })
    }

    fn typing_stop(&self, room_id: IdType) -> Result<(), ChatError> {
        self.send(WsCommandDTO::TypingStop { room_id })
    }
}

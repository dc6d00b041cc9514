//! DTOs module - Data Transfer Objects
//!
//! Request bodies and query strings sent to the REST API, plus the frames
//! exchanged over the WebSocket.

pub mod invitation;
pub mod message;
pub mod query;
pub mod room;
pub mod ws_event;

pub use invitation::InviteUserDTO;
pub use message::{MediaKind, SendMessageDTO};
pub use query::MessagesQuery;
pub use room::{CreateRoomDTO, UpdateRoomDTO};
pub use ws_event::{WsCommandDTO, WsEventDTO};

//! WebSocket Event DTOs - Frames exchanged over the realtime connection
//!
//! Both directions use an adjacently tagged union, serialized as
//! `{ "type": "NewMessage", "data": { ... } }`.

use crate::entities::{ChatMessage, ChatUser, IdType};
use serde::{Deserialize, Serialize};

/// Frames pushed by the server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum WsEventDTO {
    NewMessage { room_id: IdType, message: ChatMessage },
    UserTyping { room_id: IdType, user: ChatUser },
    UserStoppedTyping { room_id: IdType, user: ChatUser },
    UserJoined { room_id: IdType, user: ChatUser },
    UserLeft { room_id: IdType, user: ChatUser },
    Error { message: String },
}

/// Frames sent by the client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum WsCommandDTO {
    JoinRoom { room_id: IdType },
    LeaveRoom { room_id: IdType },
    SendMessage { room_id: IdType, message: String },
    TypingStart { room_id: IdType },
    TypingStop { room_id: IdType },
}

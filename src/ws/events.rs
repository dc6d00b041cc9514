//! Socket events - What the transport delivers and what the router re-publishes

use crate::dtos::WsEventDTO;
use crate::entities::{ChatMessage, ChatUser, IdType};

/// Typed event received from the realtime connection
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    NewMessage { room_id: IdType, message: ChatMessage },
    UserTyping { room_id: IdType, user: ChatUser },
    UserStoppedTyping { room_id: IdType, user: ChatUser },
    UserJoined { room_id: IdType, user: ChatUser },
    UserLeft { room_id: IdType, user: ChatUser },
    /// Server-sent error or transport failure
    Error { message: String },
}

impl SocketEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn room_id(&self) -> Option<IdType> {
        match self {
            Self::NewMessage { room_id, .. }
            | Self::UserTyping { room_id, .. }
            | Self::UserStoppedTyping { room_id, .. }
            | Self::UserJoined { room_id, .. }
            | Self::UserLeft { room_id, .. } => Some(*room_id),
            Self::Error { .. } => None,
        }
    }
}

impl From<WsEventDTO> for SocketEvent {
    fn from(value: WsEventDTO) -> Self {
        match value {
            WsEventDTO::NewMessage { room_id, message } => Self::NewMessage { room_id, message },
            WsEventDTO::UserTyping { room_id, user } => Self::UserTyping { room_id, user },
            WsEventDTO::UserStoppedTyping { room_id, user } => Self::UserStoppedTyping { room_id, user },
            WsEventDTO::UserJoined { room_id, user } => Self::UserJoined { room_id, user },
            WsEventDTO::UserLeft { room_id, user } => Self::UserLeft { room_id, user },
            WsEventDTO::Error { message } => Self::Error { message },
        }
    }
}

/// Notification re-published by the router for UI observers
#[derive(Debug, Clone, PartialEq)]
pub enum ChatNotice {
    MessageReceived { room_id: IdType, message: ChatMessage },
    UserJoined { room_id: IdType, user: ChatUser },
    UserLeft { room_id: IdType, user: ChatUser },
    Error { message: String },
}

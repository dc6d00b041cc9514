//! Breakroom chat client - realtime chat state for the Breakroom backend
//!
//! `ChatService` is the entry point: it keeps per-room message history and
//! typing presence in sync with the WebSocket connection and the REST API.

pub mod chat;
pub mod core;
pub mod dtos;
pub mod entities;
pub mod repositories;
pub mod ws;

pub use crate::chat::{ChatService, ServiceOptions};
pub use crate::core::{ChatError, ChatResult, Config, Session};
pub use crate::entities::{ChatInvite, ChatMessage, ChatRoom, ChatUser, IdType};
pub use crate::repositories::HttpChatApi;
pub use crate::ws::{ChatNotice, WsTransport};

use std::sync::Arc;

/// Production service type: REST over `reqwest`, realtime over `tokio-tungstenite`
pub type BreakroomChat = ChatService<HttpChatApi, WsTransport>;

/// Builds the production chat service for `config`
pub fn create_chat_service(config: &Config, session: Arc<Session>) -> Result<BreakroomChat, ChatError> {
    let api = HttpChatApi::new(config, session.clone())?;
    let transport = WsTransport::new(config.ws_url.clone(), session.clone());
    Ok(ChatService::new(api, transport, session, ServiceOptions::from(config)))
}

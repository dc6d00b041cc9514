//! Entities module - Domain entities held by the client
//!
//! These are the shapes the backend hands out and the caches keep in memory.

pub mod chat_room;
pub mod invitation;
pub mod message;
pub mod user;

pub use chat_room::ChatRoom;
pub use invitation::ChatInvite;
pub use message::ChatMessage;
pub use user::ChatUser;

/// Identifier type used by the backend for rooms, users and messages
pub type IdType = i64;

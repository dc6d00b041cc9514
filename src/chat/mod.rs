//! Chat module - Client-side chat state
//!
//! The caches below are owned by `ChatService`; the event router holds shared
//! handles to the message cache and the typing tracker.

pub mod invites;
pub mod media;
pub mod messages;
pub mod service;
pub mod typing;

pub use invites::{InviteList, InviteSet};
pub use messages::{MessageCache, MessageList};
pub use service::{ChatService, RoomList, ServiceOptions};
pub use typing::{TypingSet, TypingTracker};

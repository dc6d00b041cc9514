//! ChatMessage entity

use super::{ChatUser, IdType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message in a room. Immutable once received.
///
/// Messages created locally before the server confirmed them carry a negative
/// `id`; every id assigned by the server is non-negative.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: IdType,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub video_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: IdType,
    pub handle: String,
}

impl ChatMessage {
    /// Local copy of a text message that has been handed to the socket but
    /// not yet echoed back by the server.
    pub fn optimistic(id: IdType, sender: &ChatUser, text: impl Into<String>) -> Self {
        debug_assert!(id < 0, "optimistic ids must be negative");
        Self {
            id,
            message: Some(text.into()),
            image_path: None,
            video_path: None,
            created_at: Utc::now(),
            user_id: sender.id,
            handle: sender.handle.clone(),
        }
    }

    pub fn is_optimistic(&self) -> bool {
        self.id < 0
    }

    /// True when `confirmed` is the server copy of this optimistic message
    pub fn is_confirmed_by(&self, confirmed: &ChatMessage) -> bool {
        self.is_optimistic()
            && !confirmed.is_optimistic()
            && self.user_id == confirmed.user_id
            && self.message == confirmed.message
            && confirmed.image_path.is_none()
            && confirmed.video_path.is_none()
    }
}

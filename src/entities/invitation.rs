//! ChatInvite entity - Pending invitation to a room

use super::IdType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatInvite {
    pub room_id: IdType,
    pub room_name: String,
    pub invited_by_id: IdType,
    pub invited_by_handle: String,
    pub created_at: DateTime<Utc>,
}

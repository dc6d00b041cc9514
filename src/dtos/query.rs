//! Query DTOs - Query string parameters

use crate::entities::IdType;
use serde::{Deserialize, Serialize};

/// Pagination parameters for a room's message history.
/// Without `before` the server returns the most recent page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessagesQuery {
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<IdType>,
}

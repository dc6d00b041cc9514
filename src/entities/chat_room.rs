//! ChatRoom entity

use super::IdType;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatRoom {
    pub id: IdType,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: IdType,
}

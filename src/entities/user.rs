//! ChatUser entity - Participant identity as seen by the client

use super::IdType;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatUser {
    pub id: IdType,
    pub handle: String,
}

impl ChatUser {
    pub fn new(id: IdType, handle: impl Into<String>) -> Self {
        Self {
            id,
            handle: handle.into(),
        }
    }
}

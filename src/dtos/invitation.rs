//! Invitation DTOs

use crate::entities::IdType;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InviteUserDTO {
    pub user_id: IdType,
}

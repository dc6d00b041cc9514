//! Room DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO to create a room (the id is assigned by the server)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateRoomDTO {
    #[validate(length(min = 1, max = 100, message = "Room name must be between 1 and 100 characters"))]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "Room description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// DTO to update a room (only `Some` fields are changed)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateRoomDTO {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "Room name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "Room description must be at most 500 characters"))]
    pub description: Option<String>,
}

//! REST API traits
//!
//! The façade depends on these interfaces rather than on `reqwest`, so tests
//! can swap the backend for an in-memory double.

use crate::core::ChatError;
use crate::dtos::{CreateRoomDTO, MediaKind, MessagesQuery, UpdateRoomDTO};
use crate::entities::{ChatInvite, ChatMessage, ChatRoom, IdType};
use std::path::PathBuf;

/// A media file ready to be sent as multipart form data
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub kind: MediaKind,
    /// Local copy owned by the caller for the duration of the call
    pub path: PathBuf,
    pub caption: Option<String>,
}

/// Room management endpoints
pub trait RoomApi {
    /// Lists the rooms visible to the current user
    async fn list_rooms(&self) -> Result<Vec<ChatRoom>, ChatError>;

    /// Creates a room owned by the current user
    ///
    /// # Returns
    /// * `Ok(ChatRoom)` - Room with the id assigned by the server
    async fn create_room(&self, data: &CreateRoomDTO) -> Result<ChatRoom, ChatError>;

    /// Updates a room (only `Some(_)` fields are sent)
    async fn update_room(&self, room_id: IdType, data: &UpdateRoomDTO) -> Result<ChatRoom, ChatError>;

    async fn delete_room(&self, room_id: IdType) -> Result<(), ChatError>;
}

/// Message endpoints
pub trait MessageApi {
    /// Fetches a page of messages, oldest first
    ///
    /// # Arguments
    /// * `room_id` - Room to read from
    /// * `query` - `limit` and, for older pages, the id to read `before`
    async fn fetch_messages(&self, room_id: IdType, query: &MessagesQuery) -> Result<Vec<ChatMessage>, ChatError>;

    /// Posts a text message, returning the stored copy
    async fn send_message(&self, room_id: IdType, text: &str) -> Result<ChatMessage, ChatError>;

    /// Uploads an image or video, returning the message that carries it
    async fn upload_media(&self, room_id: IdType, upload: &MediaUpload) -> Result<ChatMessage, ChatError>;
}

/// Invitation endpoints
pub trait InviteApi {
    async fn list_invites(&self) -> Result<Vec<ChatInvite>, ChatError>;

    async fn invite_user(&self, room_id: IdType, user_id: IdType) -> Result<(), ChatError>;

    async fn accept_invite(&self, room_id: IdType) -> Result<(), ChatError>;

    async fn decline_invite(&self, room_id: IdType) -> Result<(), ChatError>;
}

/// Everything the chat façade needs from the REST backend
pub trait ChatApi: RoomApi + MessageApi + InviteApi {}

impl<T: RoomApi + MessageApi + InviteApi> ChatApi for T {}

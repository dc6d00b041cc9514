//! HttpChatApi - REST backend reached through `reqwest`

use super::{InviteApi, MediaUpload, MessageApi, RoomApi};
use crate::core::{ChatError, Config, Session};
use crate::dtos::{CreateRoomDTO, InviteUserDTO, MessagesQuery, SendMessageDTO, UpdateRoomDTO};
use crate::entities::{ChatInvite, ChatMessage, ChatRoom, IdType};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct HttpChatApi {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl HttpChatApi {
    pub fn new(config: &Config, session: Arc<Session>) -> Result<Self, ChatError> {
        let client = Client::builder().timeout(config.http_timeout()).build()?;
        Ok(Self::with_client(client, config.api_url.as_str(), session))
    }

    pub fn with_client(client: Client, base_url: &str, session: Arc<Session>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/chat{}", self.base_url, path)
    }

    /// Attaches the bearer token; fails before any IO when logged out
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ChatError> {
        Ok(request.bearer_auth(self.session.bearer()?))
    }

    async fn check(response: Response) -> Result<Response, ChatError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = ChatError::from_response(status, &body);
        warn!(status = status.as_u16(), "Request failed: {}", err);
        Err(err)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ChatError> {
        let response = Self::check(self.authorized(request)?.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<(), ChatError> {
        Self::check(self.authorized(request)?.send().await?).await?;
        Ok(())
    }
}

impl RoomApi for HttpChatApi {
    #[instrument(skip(self))]
    async fn list_rooms(&self) -> Result<Vec<ChatRoom>, ChatError> {
        debug!("Listing rooms");
        let rooms: Vec<ChatRoom> = self.fetch(self.client.get(self.url("/rooms"))).await?;
        info!("Retrieved {} rooms", rooms.len());
        Ok(rooms)
    }

    #[instrument(skip(self, data), fields(name = %data.name))]
    async fn create_room(&self, data: &CreateRoomDTO) -> Result<ChatRoom, ChatError> {
        let room: ChatRoom = self
            .fetch(self.client.post(self.url("/rooms")).json(data))
            .await?;
        info!(room_id = room.id, "Room created");
        Ok(room)
    }

    #[instrument(skip(self, data))]
    async fn update_room(&self, room_id: IdType, data: &UpdateRoomDTO) -> Result<ChatRoom, ChatError> {
        self.fetch(self.client.patch(self.url(&format!("/rooms/{room_id}"))).json(data))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_room(&self, room_id: IdType) -> Result<(), ChatError> {
        self.execute(self.client.delete(self.url(&format!("/rooms/{room_id}"))))
            .await?;
        info!("Room deleted");
        Ok(())
    }
}

impl MessageApi for HttpChatApi {
    #[instrument(skip(self))]
    async fn fetch_messages(&self, room_id: IdType, query: &MessagesQuery) -> Result<Vec<ChatMessage>, ChatError> {
        let messages: Vec<ChatMessage> = self
            .fetch(
                self.client
                    .get(self.url(&format!("/rooms/{room_id}/messages")))
                    .query(query),
            )
            .await?;
        debug!("Fetched {} messages", messages.len());
        Ok(messages)
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, room_id: IdType, text: &str) -> Result<ChatMessage, ChatError> {
        let body = SendMessageDTO::new(text)?;
        self.fetch(
            self.client
                .post(self.url(&format!("/rooms/{room_id}/messages")))
                .json(&body),
        )
        .await
    }

    #[instrument(skip(self, upload), fields(kind = upload.kind.part_name()))]
    async fn upload_media(&self, room_id: IdType, upload: &MediaUpload) -> Result<ChatMessage, ChatError> {
        let bytes = tokio::fs::read(&upload.path).await?;
        let file_name = upload
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| upload.kind.part_name().to_string());
        debug!(size = bytes.len(), "Uploading media");

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(upload.kind.mime_for(&upload.path))?;
        let mut form = Form::new().part(upload.kind.part_name(), part);
        if let Some(caption) = upload.caption.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            form = form.text("message", caption.to_string());
        }

        let message: ChatMessage = self
            .fetch(
                self.client
                    .post(self.url(&format!("/rooms/{room_id}/{}", upload.kind.part_name())))
                    .multipart(form),
            )
            .await?;
        info!(message_id = message.id, "Media uploaded");
        Ok(message)
    }
}

impl InviteApi for HttpChatApi {
    #[instrument(skip(self))]
    async fn list_invites(&self) -> Result<Vec<ChatInvite>, ChatError> {
        self.fetch(self.client.get(self.url("/invites"))).await
    }

    #[instrument(skip(self))]
    async fn invite_user(&self, room_id: IdType, user_id: IdType) -> Result<(), ChatError> {
        self.execute(
            self.client
                .post(self.url(&format!("/rooms/{room_id}/invite")))
                .json(&InviteUserDTO { user_id }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn accept_invite(&self, room_id: IdType) -> Result<(), ChatError> {
        self.execute(self.client.post(self.url(&format!("/invites/{room_id}/accept"))))
            .await
    }

    #[instrument(skip(self))]
    async fn decline_invite(&self, room_id: IdType) -> Result<(), ChatError> {
        self.execute(self.client.post(self.url(&format!("/invites/{room_id}/decline"))))
            .await
    }
}

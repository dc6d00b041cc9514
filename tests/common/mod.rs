#![allow(dead_code)]

use breakroom_chat::core::auth::Claims;
use breakroom_chat::core::{ChatError, Session};
use breakroom_chat::dtos::{CreateRoomDTO, MessagesQuery, UpdateRoomDTO, WsCommandDTO};
use breakroom_chat::repositories::{InviteApi, MediaUpload, MessageApi, RoomApi};
use breakroom_chat::ws::{RealtimeTransport, SocketEvent};
use breakroom_chat::{ChatInvite, ChatMessage, ChatRoom, ChatService, ChatUser, IdType, ServiceOptions};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

pub const TEST_SECRET: &str = "breakroom-test-secret";

/// Generates a JWT shaped like the ones issued by the backend
///
/// # Arguments
/// * `user_id` - Id carried in the `id` claim
/// * `username` - Handle carried in the `username` claim
pub fn create_test_jwt(user_id: IdType, username: &str) -> String {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};

    let now = Utc::now();
    let claims = Claims {
        exp: (now + Duration::hours(24)).timestamp() as usize,
        iat: now.timestamp() as usize,
        id: user_id,
        username: username.to_string(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes()))
        .expect("Failed to create JWT token")
}

/// Session logged in as `alice` (id 1)
pub fn alice_session() -> Arc<Session> {
    Arc::new(Session::with_token(&create_test_jwt(1, "alice")).expect("valid token"))
}

pub fn text_message(id: IdType, user: &ChatUser, text: &str) -> ChatMessage {
    ChatMessage {
        id,
        message: Some(text.to_string()),
        image_path: None,
        video_path: None,
        created_at: Utc::now(),
        user_id: user.id,
        handle: user.handle.clone(),
    }
}

pub fn room(id: IdType, name: &str) -> ChatRoom {
    ChatRoom {
        id,
        name: name.to_string(),
        description: None,
        owner_id: 1,
    }
}

pub fn invite(room_id: IdType, room_name: &str) -> ChatInvite {
    ChatInvite {
        room_id,
        room_name: room_name.to_string(),
        invited_by_id: 2,
        invited_by_handle: "bob".to_string(),
        created_at: Utc::now(),
    }
}

/// Fresh, not yet created directory for staged media
pub fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("breakroom-{name}-{}", uuid::Uuid::new_v4()))
}

// ==================== In-memory REST backend ====================

#[derive(Default)]
pub struct ApiState {
    pub rooms: Vec<ChatRoom>,
    /// History per room, oldest first
    pub history: HashMap<IdType, Vec<ChatMessage>>,
    pub invites: Vec<ChatInvite>,
    pub sent_invites: Vec<(IdType, IdType)>,
    pub accepted: Vec<IdType>,
    pub declined: Vec<IdType>,
    pub queries: Vec<(IdType, MessagesQuery)>,
    pub uploads: Vec<(IdType, MediaUpload)>,
    pub sent_texts: Vec<(IdType, String)>,
    /// When set, every call fails with this error
    pub failure: Option<ChatError>,
    pub next_id: IdType,
}

/// `ChatApi` double backed by `ApiState`; clones share the same state
#[derive(Clone, Default)]
pub struct FakeApi {
    pub state: Arc<Mutex<ApiState>>,
    pub author: Arc<Mutex<Option<ChatUser>>>,
}

impl FakeApi {
    pub fn new(author: ChatUser) -> Self {
        let api = Self::default();
        *api.author.lock().unwrap() = Some(author);
        api.state.lock().unwrap().next_id = 1000;
        api
    }

    pub fn fail_with(&self, error: ChatError) {
        self.state.lock().unwrap().failure = Some(error);
    }

    pub fn recover(&self) {
        self.state.lock().unwrap().failure = None;
    }

    pub fn set_history(&self, room_id: IdType, messages: Vec<ChatMessage>) {
        self.state.lock().unwrap().history.insert(room_id, messages);
    }

    pub fn upload_calls(&self) -> usize {
        self.state.lock().unwrap().uploads.len()
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ApiState>, ChatError> {
        let state = self.state.lock().unwrap();
        if let Some(err) = state.failure.clone() {
            return Err(err);
        }
        Ok(state)
    }

    fn author(&self) -> ChatUser {
        self.author.lock().unwrap().clone().unwrap_or_else(|| ChatUser::new(1, "alice"))
    }
}

impl RoomApi for FakeApi {
    async fn list_rooms(&self) -> Result<Vec<ChatRoom>, ChatError> {
        Ok(self.guard()?.rooms.clone())
    }

    async fn create_room(&self, data: &CreateRoomDTO) -> Result<ChatRoom, ChatError> {
        let mut state = self.guard()?;
        state.next_id += 1;
        let room = ChatRoom {
            id: state.next_id,
            name: data.name.clone(),
            description: data.description.clone(),
            owner_id: 1,
        };
        state.rooms.push(room.clone());
        Ok(room)
    }

    async fn update_room(&self, room_id: IdType, data: &UpdateRoomDTO) -> Result<ChatRoom, ChatError> {
        let mut state = self.guard()?;
        let room = state
            .rooms
            .iter_mut()
            .find(|r| r.id == room_id)
            .ok_or_else(|| ChatError::server(404, "Room not found"))?;
        if let Some(name) = &data.name {
            room.name = name.clone();
        }
        if let Some(description) = &data.description {
            room.description = Some(description.clone());
        }
        Ok(room.clone())
    }

    async fn delete_room(&self, room_id: IdType) -> Result<(), ChatError> {
        let mut state = self.guard()?;
        state.rooms.retain(|r| r.id != room_id);
        state.history.remove(&room_id);
        Ok(())
    }
}

impl MessageApi for FakeApi {
    async fn fetch_messages(&self, room_id: IdType, query: &MessagesQuery) -> Result<Vec<ChatMessage>, ChatError> {
        let mut state = self.guard()?;
        state.queries.push((room_id, query.clone()));
        let older: Vec<ChatMessage> = state
            .history
            .get(&room_id)
            .map(|h| {
                h.iter()
                    .filter(|m| query.before.is_none_or(|before| m.id < before))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let skip = older.len().saturating_sub(query.limit as usize);
        Ok(older.into_iter().skip(skip).collect())
    }

    async fn send_message(&self, room_id: IdType, text: &str) -> Result<ChatMessage, ChatError> {
        let author = self.author();
        let mut state = self.guard()?;
        state.next_id += 1;
        let message = text_message(state.next_id, &author, text);
        state.sent_texts.push((room_id, text.to_string()));
        state.history.entry(room_id).or_default().push(message.clone());
        Ok(message)
    }

    async fn upload_media(&self, room_id: IdType, upload: &MediaUpload) -> Result<ChatMessage, ChatError> {
        let author = self.author();
        let mut state = self.guard()?;
        assert!(upload.path.exists(), "staged copy must exist during the upload");
        state.next_id += 1;
        let stored = format!("uploads/{}", upload.path.file_name().unwrap().to_string_lossy());
        let mut message = text_message(state.next_id, &author, "");
        message.message = upload.caption.clone();
        match upload.kind.part_name() {
            "image" => message.image_path = Some(stored),
            _ => message.video_path = Some(stored),
        }
        state.uploads.push((room_id, upload.clone()));
        Ok(message)
    }
}

impl InviteApi for FakeApi {
    async fn list_invites(&self) -> Result<Vec<ChatInvite>, ChatError> {
        Ok(self.guard()?.invites.clone())
    }

    async fn invite_user(&self, room_id: IdType, user_id: IdType) -> Result<(), ChatError> {
        self.guard()?.sent_invites.push((room_id, user_id));
        Ok(())
    }

    async fn accept_invite(&self, room_id: IdType) -> Result<(), ChatError> {
        let mut state = self.guard()?;
        let accepted = state
            .invites
            .iter()
            .position(|i| i.room_id == room_id)
            .map(|idx| state.invites.remove(idx))
            .ok_or_else(|| ChatError::server(404, "Invitation not found"))?;
        state.accepted.push(room_id);
        state.rooms.push(room(room_id, &accepted.room_name));
        Ok(())
    }

    async fn decline_invite(&self, room_id: IdType) -> Result<(), ChatError> {
        let mut state = self.guard()?;
        state.invites.retain(|i| i.room_id != room_id);
        state.declined.push(room_id);
        Ok(())
    }
}

// ==================== In-memory realtime transport ====================

#[derive(Default)]
pub struct TransportState {
    pub events: Mutex<Option<UnboundedSender<SocketEvent>>>,
    pub connected: AtomicBool,
    pub fail_sends: AtomicBool,
    pub connect_calls: AtomicUsize,
    pub sent: Mutex<Vec<WsCommandDTO>>,
    /// Server id and author used to echo `SendMessage` back before `send` returns
    pub echo: Mutex<Option<(IdType, ChatUser)>>,
}

/// `RealtimeTransport` double; the test plays the server through `push`
#[derive(Clone, Default)]
pub struct FakeTransport {
    pub state: Arc<TransportState>,
}

impl FakeTransport {
    /// Delivers an event as if the server had sent it
    pub fn push(&self, event: SocketEvent) {
        let events = self.state.events.lock().unwrap();
        events
            .as_ref()
            .expect("transport is not connected")
            .send(event)
            .expect("router is not listening");
    }

    /// Simulates the connection dropping on the server side
    pub fn drop_connection(&self) {
        self.state.connected.store(false, Ordering::SeqCst);
        self.state.events.lock().unwrap().take();
    }

    pub fn fail_sends(&self, fail: bool) {
        self.state.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Makes the next `SendMessage` come back as a `NewMessage` with `id`
    /// while `send` is still running, as a fast server would
    pub fn echo_next_send(&self, id: IdType, author: ChatUser) {
        *self.state.echo.lock().unwrap() = Some((id, author));
    }

    pub fn sent(&self) -> Vec<WsCommandDTO> {
        self.state.sent.lock().unwrap().clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.state.connect_calls.load(Ordering::SeqCst)
    }
}

impl RealtimeTransport for FakeTransport {
    async fn connect(&self, events: UnboundedSender<SocketEvent>) -> Result<(), ChatError> {
        self.state.connect_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.events.lock().unwrap() = Some(events);
        self.state.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        self.drop_connection();
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    fn send(&self, command: WsCommandDTO) -> Result<(), ChatError> {
        if !self.is_connected() || self.state.fail_sends.load(Ordering::SeqCst) {
            return Err(ChatError::network("WebSocket is not connected"));
        }
        if let WsCommandDTO::SendMessage { room_id, message } = &command {
            if let Some((id, author)) = self.state.echo.lock().unwrap().take() {
                self.push(SocketEvent::NewMessage {
                    room_id: *room_id,
                    message: text_message(id, &author, message),
                });
                // give the router time to apply the echo before `send` returns
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
        }
        self.state.sent.lock().unwrap().push(command);
        Ok(())
    }
}

pub type TestService = ChatService<FakeApi, FakeTransport>;

/// Service logged in as `alice`, with handles on its fakes
pub struct TestContext {
    pub service: TestService,
    pub api: FakeApi,
    pub transport: FakeTransport,
    pub user: ChatUser,
    pub media_dir: PathBuf,
}

pub fn create_test_context() -> TestContext {
    create_test_context_with(alice_session())
}

pub fn create_test_context_with(session: Arc<Session>) -> TestContext {
    let user = session.current_user().unwrap_or_else(|_| ChatUser::new(1, "alice"));
    let api = FakeApi::new(user.clone());
    let transport = FakeTransport::default();
    let media_dir = scratch_dir("media");
    let options = ServiceOptions {
        page_size: 3,
        media_cache_dir: media_dir.clone(),
    };
    let service = ChatService::new(api.clone(), transport.clone(), session, options);
    TestContext {
        service,
        api,
        transport,
        user,
        media_dir,
    }
}

/// Upper bound for anything the router does in the background
pub const WAIT: std::time::Duration = std::time::Duration::from_secs(2);

/// Waits until the observed value satisfies `pred`
pub async fn wait_until<T>(rx: &mut tokio::sync::watch::Receiver<T>, pred: impl FnMut(&T) -> bool) {
    tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for state change")
        .expect("channel closed");
}

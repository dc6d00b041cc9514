//! Chat Façade - Single entry point for chat screens
//!
//! `ChatService` owns the message cache, the typing tracker, the room list
//! and the pending invites. Screens read them through `watch` receivers and
//! mutate them only through the operations below.

use crate::chat::media::CachedMedia;
use crate::chat::{InviteList, InviteSet, MessageCache, MessageList, TypingSet, TypingTracker};
use crate::core::{ChatError, Config, Session};
use crate::dtos::{CreateRoomDTO, MediaKind, MessagesQuery, SendMessageDTO, UpdateRoomDTO};
use crate::entities::{ChatMessage, ChatRoom, ChatUser, IdType};
use crate::repositories::{ChatApi, MediaUpload};
use crate::ws::{ChatNotice, EventRouter, NOTICE_CHANNEL_CAPACITY, RealtimeTransport, RouterHandle};
use chrono::Utc;
use dashmap::DashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::{Mutex, broadcast, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

pub type RoomList = Arc<Vec<ChatRoom>>;

/// Tunables taken from `Config`
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub page_size: u32,
    pub media_cache_dir: PathBuf,
}

impl From<&Config> for ServiceOptions {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.page_size,
            media_cache_dir: config.media_cache_dir.clone(),
        }
    }
}

pub struct ChatService<A, T> {
    api: A,
    transport: T,
    session: Arc<Session>,
    options: ServiceOptions,
    messages: Arc<MessageCache>,
    typing: Arc<TypingTracker>,
    invites: InviteSet,
    rooms: watch::Sender<RoomList>,
    joined: Arc<DashSet<IdType>>,
    notices: broadcast::Sender<ChatNotice>,
    router: Mutex<Option<RouterHandle>>,
    last_local_id: AtomicI64,
}

impl<A: ChatApi, T: RealtimeTransport> ChatService<A, T> {
    pub fn new(api: A, transport: T, session: Arc<Session>, options: ServiceOptions) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self {
            api,
            transport,
            session,
            options,
            messages: Arc::new(MessageCache::new()),
            typing: Arc::new(TypingTracker::new()),
            invites: InviteSet::new(),
            rooms: watch::channel(Arc::new(Vec::new())).0,
            joined: Arc::new(DashSet::new()),
            notices,
            router: Mutex::new(None),
            last_local_id: AtomicI64::new(0),
        }
    }

    // ==================== Connection ====================

    /// Opens the realtime connection and starts routing its events.
    /// Calling it while connected does nothing.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<(), ChatError> {
        let mut router = self.router.lock().await;
        let router_alive = router.as_ref().is_some_and(|r| !r.is_finished());
        if self.transport.is_connected() && router_alive {
            debug!("Already connected");
            return Ok(());
        }

        let current_user = self.session.current_user()?;
        if let Some(stale) = router.take() {
            stale.shutdown().await;
        }
        if self.transport.is_connected() {
            // transport without a router: its events have nowhere to go
            self.transport.disconnect().await;
        }

        let (events_tx, events_rx) = unbounded_channel();
        self.transport.connect(events_tx).await?;
        let handle = EventRouter::new(
            self.messages.clone(),
            self.typing.clone(),
            self.notices.clone(),
            self.joined.clone(),
            current_user,
        )
        .spawn(events_rx);
        *router = Some(handle);
        info!("Connected");
        Ok(())
    }

    /// Closes the connection and stops the router. Every room becomes
    /// unjoined; cached history is kept.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) {
        let mut router = self.router.lock().await;
        self.transport.disconnect().await;
        if let Some(handle) = router.take() {
            handle.shutdown().await;
        }
        for room_id in self.joined.iter().map(|r| *r).collect::<Vec<_>>() {
            self.typing.clear_room(room_id);
        }
        self.joined.clear();
        info!("Disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    // ==================== Rooms presence ====================

    #[instrument(skip(self))]
    pub fn join_room(&self, room_id: IdType) -> Result<(), ChatError> {
        // marked first so typing that follows the join is not dropped
        let newly_joined = self.joined.insert(room_id);
        if let Err(e) = self.transport.join_room(room_id) {
            if newly_joined {
                self.joined.remove(&room_id);
            }
            return Err(e);
        }
        info!("Joined room");
        Ok(())
    }

    /// Leaves a room: typing state is dropped, history is kept. Typing
    /// events still queued for the room are ignored by the router.
    #[instrument(skip(self))]
    pub fn leave_room(&self, room_id: IdType) -> Result<(), ChatError> {
        self.joined.remove(&room_id);
        self.typing.clear_room(room_id);
        if self.transport.is_connected() {
            self.transport.leave_room(room_id)?;
        }
        info!("Left room");
        Ok(())
    }

    pub fn is_joined(&self, room_id: IdType) -> bool {
        self.joined.contains(&room_id)
    }

    #[instrument(skip(self))]
    pub fn start_typing(&self, room_id: IdType) -> Result<(), ChatError> {
        self.transport.typing_start(room_id)
    }

    #[instrument(skip(self))]
    pub fn stop_typing(&self, room_id: IdType) -> Result<(), ChatError> {
        self.transport.typing_stop(room_id)
    }

    // ==================== Messages ====================

    /// Sends a text message.
    ///
    /// Over a live socket the message is shown at once as an optimistic
    /// entry (negative id) and confirmed later by the server's echo.
    /// Without a socket the REST endpoint is used and the stored copy is
    /// merged; on failure nothing changes locally.
    #[instrument(skip(self, text))]
    pub async fn send_message(&self, room_id: IdType, text: &str) -> Result<ChatMessage, ChatError> {
        let body = SendMessageDTO::new(text)?;
        let current_user = self.session.current_user()?;

        if self.transport.is_connected() {
            // recorded before sending, so an early echo always finds it
            let message = ChatMessage::optimistic(self.next_local_id(), &current_user, body.message.clone());
            self.messages.record_incoming(room_id, message.clone());
            match self.transport.send_message(room_id, &body.message) {
                Ok(()) => {
                    debug!(local_id = message.id, "Message handed to socket");
                    return Ok(message);
                }
                Err(e) => {
                    self.messages.discard(room_id, message.id);
                    warn!("Socket send failed, falling back to REST: {}", e);
                }
            }
        }

        let message = self.api.send_message(room_id, &body.message).await?;
        self.messages.record_incoming(room_id, message.clone());
        info!(message_id = message.id, "Message sent through REST");
        Ok(message)
    }

    /// Loads a page of history.
    ///
    /// Without `before_id` the room's history is replaced by the page; with
    /// it, only unknown messages of the page are put in front. Returns the
    /// number of messages added.
    #[instrument(skip(self))]
    pub async fn load_page(&self, room_id: IdType, limit: u32, before_id: Option<IdType>) -> Result<usize, ChatError> {
        if limit == 0 {
            return Err(ChatError::invalid_input("Page limit must be positive"));
        }
        let query = MessagesQuery {
            limit,
            before: before_id,
        };
        let page = self.api.fetch_messages(room_id, &query).await?;

        let added = match before_id {
            None => {
                let count = page.len();
                self.messages.replace(room_id, page);
                count
            }
            Some(_) => self.messages.prepend_older(room_id, page),
        };
        info!(added, "Page loaded");
        Ok(added)
    }

    /// Latest page with the configured size
    pub async fn load_latest(&self, room_id: IdType) -> Result<usize, ChatError> {
        self.load_page(room_id, self.options.page_size, None).await
    }

    /// Page before the oldest message held; loads the latest page when the
    /// room holds nothing confirmed yet.
    pub async fn load_older(&self, room_id: IdType) -> Result<usize, ChatError> {
        match self.messages.oldest_confirmed_id(room_id) {
            Some(oldest) => self.load_page(room_id, self.options.page_size, Some(oldest)).await,
            None => self.load_latest(room_id).await,
        }
    }

    pub async fn upload_image(&self, room_id: IdType, source: &Path, caption: Option<&str>) -> Result<ChatMessage, ChatError> {
        self.upload_media(room_id, MediaKind::Image, source, caption).await
    }

    pub async fn upload_video(&self, room_id: IdType, source: &Path, caption: Option<&str>) -> Result<ChatMessage, ChatError> {
        self.upload_media(room_id, MediaKind::Video, source, caption).await
    }

    #[instrument(skip(self, source, caption), fields(kind = kind.part_name()))]
    async fn upload_media(
        &self,
        room_id: IdType,
        kind: MediaKind,
        source: &Path,
        caption: Option<&str>,
    ) -> Result<ChatMessage, ChatError> {
        let staged = CachedMedia::stage(&self.options.media_cache_dir, source, kind).await?;
        if staged.is_empty() {
            warn!("Refusing to upload an empty file");
            return Err(kind.empty_error());
        }

        let upload = MediaUpload {
            kind,
            path: staged.path().to_path_buf(),
            caption: caption.map(str::to_string),
        };
        let message = self.api.upload_media(room_id, &upload).await?;
        drop(staged);

        self.messages.record_incoming(room_id, message.clone());
        info!(message_id = message.id, "Media message stored");
        Ok(message)
    }

    // ==================== Rooms ====================

    #[instrument(skip(self))]
    pub async fn load_rooms(&self) -> Result<RoomList, ChatError> {
        let rooms = Arc::new(self.api.list_rooms().await?);
        self.rooms.send_replace(rooms.clone());
        Ok(rooms)
    }

    #[instrument(skip(self, description))]
    pub async fn create_room(&self, name: &str, description: Option<&str>) -> Result<ChatRoom, ChatError> {
        let data = CreateRoomDTO {
            name: name.trim().to_string(),
            description: description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
        };
        data.validate()?;
        let room = self.api.create_room(&data).await?;
        self.replace_rooms(|rooms| rooms.push(room.clone()));
        Ok(room)
    }

    /// Renames and/or re-describes a room; `None` leaves a field as it is
    #[instrument(skip(self, description))]
    pub async fn update_room(
        &self,
        room_id: IdType,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<ChatRoom, ChatError> {
        let data = UpdateRoomDTO {
            name: name.map(|n| n.trim().to_string()),
            description: description.map(|d| d.trim().to_string()),
        };
        data.validate()?;
        let room = self.api.update_room(room_id, &data).await?;
        self.replace_rooms(|rooms| match rooms.iter_mut().find(|r| r.id == room.id) {
            Some(existing) => *existing = room.clone(),
            None => rooms.push(room.clone()),
        });
        Ok(room)
    }

    /// Deletes a room and forgets its history and typing state
    #[instrument(skip(self))]
    pub async fn delete_room(&self, room_id: IdType) -> Result<(), ChatError> {
        self.api.delete_room(room_id).await?;
        self.replace_rooms(|rooms| rooms.retain(|r| r.id != room_id));
        self.joined.remove(&room_id);
        self.messages.remove_room(room_id);
        self.typing.remove_room(room_id);
        Ok(())
    }

    /// Publishes a new room list built from the current one
    fn replace_rooms(&self, change: impl FnOnce(&mut Vec<ChatRoom>)) {
        let mut rooms: Vec<ChatRoom> = (**self.rooms.borrow()).clone();
        change(&mut rooms);
        self.rooms.send_replace(Arc::new(rooms));
    }

    // ==================== Invites ====================

    #[instrument(skip(self))]
    pub async fn load_invites(&self) -> Result<InviteList, ChatError> {
        let invites = self.api.list_invites().await?;
        self.invites.replace(invites);
        Ok(self.invites.snapshot())
    }

    #[instrument(skip(self))]
    pub async fn invite_user(&self, room_id: IdType, user_id: IdType) -> Result<(), ChatError> {
        self.api.invite_user(room_id, user_id).await
    }

    /// Accepts an invite; the room list is refreshed to include the room
    #[instrument(skip(self))]
    pub async fn accept_invite(&self, room_id: IdType) -> Result<(), ChatError> {
        self.api.accept_invite(room_id).await?;
        self.invites.remove(room_id);
        if let Err(e) = self.load_rooms().await {
            warn!("Invite accepted but room list refresh failed: {}", e);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn decline_invite(&self, room_id: IdType) -> Result<(), ChatError> {
        self.api.decline_invite(room_id).await?;
        self.invites.remove(room_id);
        Ok(())
    }

    // ==================== Observables ====================

    pub fn messages_for(&self, room_id: IdType) -> watch::Receiver<MessageList> {
        self.messages.messages_for(room_id)
    }

    pub fn watch_messages(&self, room_id: IdType) -> WatchStream<MessageList> {
        WatchStream::new(self.messages.messages_for(room_id))
    }

    pub fn typing_in(&self, room_id: IdType) -> watch::Receiver<TypingSet> {
        self.typing.typing_in(room_id)
    }

    pub fn rooms(&self) -> watch::Receiver<RoomList> {
        self.rooms.subscribe()
    }

    pub fn invites(&self) -> watch::Receiver<InviteList> {
        self.invites.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<ChatNotice> {
        self.notices.subscribe()
    }

    pub fn current_user(&self) -> Result<ChatUser, ChatError> {
        self.session.current_user()
    }

    /// Strictly decreasing negative ids derived from the millisecond clock
    fn next_local_id(&self) -> IdType {
        let candidate = -Utc::now().timestamp_millis().max(1);
        let previous = self
            .last_local_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(candidate.min(last - 1)))
            .unwrap_or_else(|last| last);
        candidate.min(previous - 1)
    }
}

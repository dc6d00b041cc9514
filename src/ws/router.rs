//! Socket Event Router - Fans transport events out to the caches
//!
//! A single task drains the event channel in arrival order and applies each
//! event to the message cache or the typing tracker. Nothing here retries:
//! when the transport drops, its sender goes away and the task ends.

use crate::chat::{MessageCache, TypingTracker};
use crate::entities::{ChatUser, IdType};
use crate::ws::{ChatNotice, SocketEvent};
use dashmap::DashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub struct EventRouter {
    messages: Arc<MessageCache>,
    typing: Arc<TypingTracker>,
    notices: broadcast::Sender<ChatNotice>,
    /// Rooms the client is currently in; typing outside them is dropped
    joined: Arc<DashSet<IdType>>,
    current_user: ChatUser,
}

impl EventRouter {
    pub fn new(
        messages: Arc<MessageCache>,
        typing: Arc<TypingTracker>,
        notices: broadcast::Sender<ChatNotice>,
        joined: Arc<DashSet<IdType>>,
        current_user: ChatUser,
    ) -> Self {
        Self {
            messages,
            typing,
            notices,
            joined,
            current_user,
        }
    }

    /// Applies one event to the caches and re-publishes it when relevant
    #[instrument(skip(self, event), fields(room_id = ?event.room_id()))]
    pub fn apply(&self, event: SocketEvent) {
        match event {
            SocketEvent::NewMessage { room_id, message } => {
                if self.messages.record_incoming(room_id, message.clone()) {
                    debug!(message_id = message.id, "Message recorded");
                    self.notify(ChatNotice::MessageReceived { room_id, message });
                } else {
                    debug!(message_id = message.id, "Duplicate message ignored");
                }
            }
            SocketEvent::UserTyping { room_id, user } => {
                if user.id == self.current_user.id {
                    return;
                }
                if !self.joined.contains(&room_id) {
                    debug!(user_id = user.id, "Typing in a room not joined, ignored");
                    return;
                }
                self.typing.set_typing(room_id, &user.handle, true);
                // the room may have been left meanwhile, and its clear may already have run
                if !self.joined.contains(&room_id) {
                    self.typing.set_typing(room_id, &user.handle, false);
                }
            }
            SocketEvent::UserStoppedTyping { room_id, user } => {
                if user.id != self.current_user.id {
                    self.typing.set_typing(room_id, &user.handle, false);
                }
            }
            SocketEvent::UserJoined { room_id, user } => {
                info!(user_id = user.id, "User joined room");
                self.notify(ChatNotice::UserJoined { room_id, user });
            }
            SocketEvent::UserLeft { room_id, user } => {
                info!(user_id = user.id, "User left room");
                // a user who leaves cannot keep typing
                self.typing.set_typing(room_id, &user.handle, false);
                self.notify(ChatNotice::UserLeft { room_id, user });
            }
            SocketEvent::Error { message } => {
                warn!(error_message = %message, "Realtime error");
                self.notify(ChatNotice::Error { message });
            }
        }
    }

    fn notify(&self, notice: ChatNotice) {
        // Err only means nobody is listening right now
        let _ = self.notices.send(notice);
    }

    /// Moves the router onto its own task
    pub fn spawn(self, events: UnboundedReceiver<SocketEvent>) -> RouterHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(events, shutdown_rx));
        RouterHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    #[instrument(skip_all, fields(user_id = self.current_user.id))]
    async fn run(self, mut events: UnboundedReceiver<SocketEvent>, mut shutdown: oneshot::Receiver<()>) {
        info!("Event router started");
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.apply(event),
                    None => {
                        info!("Event channel closed");
                        break;
                    }
                },
            }
        }
        info!("Event router terminated");
    }
}

/// Owner side of a running router
pub struct RouterHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Drop for RouterHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl RouterHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the router and waits for it to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("Event router ended abnormally: {:?}", e);
        }
    }
}

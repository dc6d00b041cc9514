//! Room Message Cache - Per-room ordered, duplicate-free message history
//!
//! Each room owns a `watch` channel, so observers always start from the
//! latest list and are woken on every change.

use crate::entities::{ChatMessage, IdType};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument};

pub type MessageList = Arc<Vec<ChatMessage>>;

#[derive(Default)]
pub struct MessageCache {
    rooms: DashMap<IdType, watch::Sender<MessageList>>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_room<R>(&self, room_id: IdType, f: impl FnOnce(&watch::Sender<MessageList>) -> R) -> R {
        let entry = self
            .rooms
            .entry(room_id)
            .or_insert_with(|| watch::channel(Arc::new(Vec::new())).0);
        f(entry.value())
    }

    /// Observable history of a room, created empty on first access
    pub fn messages_for(&self, room_id: IdType) -> watch::Receiver<MessageList> {
        self.with_room(room_id, |tx| tx.subscribe())
    }

    pub fn snapshot(&self, room_id: IdType) -> MessageList {
        self.with_room(room_id, |tx| tx.borrow().clone())
    }

    /// Appends `message` unless the room already holds its id.
    ///
    /// A server message from the same author and with the same text as a
    /// pending optimistic entry takes that entry's place instead of being
    /// appended. Returns whether the history changed.
    #[instrument(skip(self, message), fields(message_id = message.id))]
    pub fn record_incoming(&self, room_id: IdType, message: ChatMessage) -> bool {
        self.with_room(room_id, |tx| {
            tx.send_if_modified(|list| {
                if list.iter().any(|m| m.id == message.id) {
                    return false;
                }
                let pending = list.iter().position(|m| m.is_confirmed_by(&message));
                let list = Arc::make_mut(list);
                match pending {
                    Some(idx) => {
                        debug!(local_id = list[idx].id, "Optimistic message confirmed");
                        list[idx] = message;
                    }
                    None => list.push(message),
                }
                true
            })
        })
    }

    /// Replaces the whole history, dropping any optimistic entries
    #[instrument(skip(self, page), fields(count = page.len()))]
    pub fn replace(&self, room_id: IdType, page: Vec<ChatMessage>) {
        let mut seen = HashSet::with_capacity(page.len());
        let page: Vec<ChatMessage> = page.into_iter().filter(|m| seen.insert(m.id)).collect();
        self.with_room(room_id, |tx| {
            tx.send_replace(Arc::new(page));
        });
    }

    /// Puts the messages of an older page in front of the current history,
    /// skipping those already held. Returns how many were added.
    #[instrument(skip(self, page), fields(count = page.len()))]
    pub fn prepend_older(&self, room_id: IdType, page: Vec<ChatMessage>) -> usize {
        self.with_room(room_id, |tx| {
            let mut added = 0;
            tx.send_if_modified(|list| {
                let mut seen: HashSet<IdType> = list.iter().map(|m| m.id).collect();
                let mut merged: Vec<ChatMessage> = page.into_iter().filter(|m| seen.insert(m.id)).collect();
                added = merged.len();
                if added == 0 {
                    return false;
                }
                merged.extend(list.iter().cloned());
                *list = Arc::new(merged);
                true
            });
            added
        })
    }

    /// Oldest server-assigned id held for the room, the cursor for the next older page
    pub fn oldest_confirmed_id(&self, room_id: IdType) -> Option<IdType> {
        self.with_room(room_id, |tx| {
            tx.borrow().iter().find(|m| !m.is_optimistic()).map(|m| m.id)
        })
    }

    /// Drops the entry with `message_id`, if held. Returns whether it was.
    #[instrument(skip(self))]
    pub fn discard(&self, room_id: IdType, message_id: IdType) -> bool {
        self.with_room(room_id, |tx| {
            tx.send_if_modified(|list| {
                if !list.iter().any(|m| m.id == message_id) {
                    return false;
                }
                Arc::make_mut(list).retain(|m| m.id != message_id);
                true
            })
        })
    }

    /// Forgets a room entirely; current observers see an empty history
    pub fn remove_room(&self, room_id: IdType) {
        if let Some((_, tx)) = self.rooms.remove(&room_id) {
            tx.send_replace(Arc::new(Vec::new()));
        }
    }
}

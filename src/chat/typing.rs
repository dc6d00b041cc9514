//! Typing Presence Tracker - Handles currently composing a message, per room
//!
//! Entries only go away through a stop event or `clear_room`; there is no
//! time-based expiry.

use crate::entities::IdType;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument};

pub type TypingSet = Arc<BTreeSet<String>>;

#[derive(Default)]
pub struct TypingTracker {
    rooms: DashMap<IdType, watch::Sender<TypingSet>>,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_room<R>(&self, room_id: IdType, f: impl FnOnce(&watch::Sender<TypingSet>) -> R) -> R {
        let entry = self
            .rooms
            .entry(room_id)
            .or_insert_with(|| watch::channel(Arc::new(BTreeSet::new())).0);
        f(entry.value())
    }

    pub fn typing_in(&self, room_id: IdType) -> watch::Receiver<TypingSet> {
        self.with_room(room_id, |tx| tx.subscribe())
    }

    pub fn snapshot(&self, room_id: IdType) -> TypingSet {
        self.with_room(room_id, |tx| tx.borrow().clone())
    }

    /// Adds or removes `handle`. Idempotent; returns whether the set changed.
    #[instrument(skip(self))]
    pub fn set_typing(&self, room_id: IdType, handle: &str, is_typing: bool) -> bool {
        self.with_room(room_id, |tx| {
            tx.send_if_modified(|set| {
                let present = set.contains(handle);
                if present == is_typing {
                    return false;
                }
                let set = Arc::make_mut(set);
                if is_typing {
                    set.insert(handle.to_string());
                } else {
                    set.remove(handle);
                }
                debug!("Typing state changed");
                true
            })
        })
    }

    /// Removes every entry of the room
    #[instrument(skip(self))]
    pub fn clear_room(&self, room_id: IdType) {
        if let Some(tx) = self.rooms.get(&room_id) {
            tx.send_if_modified(|set| {
                if set.is_empty() {
                    return false;
                }
                *set = Arc::new(BTreeSet::new());
                true
            });
        }
    }

    /// Clears the room and drops its channel
    pub fn remove_room(&self, room_id: IdType) {
        self.clear_room(room_id);
        self.rooms.remove(&room_id);
    }
}

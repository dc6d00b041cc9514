//! Pending invites held for the current user

use crate::entities::{ChatInvite, IdType};
use std::sync::Arc;
use tokio::sync::watch;

pub type InviteList = Arc<Vec<ChatInvite>>;

pub struct InviteSet {
    tx: watch::Sender<InviteList>,
}

impl Default for InviteSet {
    fn default() -> Self {
        Self {
            tx: watch::channel(Arc::new(Vec::new())).0,
        }
    }
}

impl InviteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> watch::Receiver<InviteList> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> InviteList {
        self.tx.borrow().clone()
    }

    /// Replaces the set, keeping the first invite seen per room
    pub fn replace(&self, mut invites: Vec<ChatInvite>) {
        let mut seen = std::collections::HashSet::new();
        invites.retain(|i| seen.insert(i.room_id));
        self.tx.send_replace(Arc::new(invites));
    }

    /// Drops the invite for `room_id`, returning it if it was pending
    pub fn remove(&self, room_id: IdType) -> Option<ChatInvite> {
        let mut removed = None;
        self.tx.send_if_modified(|list| {
            let Some(idx) = list.iter().position(|i| i.room_id == room_id) else {
                return false;
            };
            removed = Some(Arc::make_mut(list).remove(idx));
            true
        });
        removed
    }
}

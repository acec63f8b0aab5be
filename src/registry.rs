//! Room Registry
//!
//! Maps room ids to joined rooms. Lives inside the Session, so only the
//! parser task touches it.
//!
//! Each registered room gets a mailbox drained by its own task, so delivery
//! never blocks the parser and messages reach subscribers in arrival order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::message::ChatMessage;
use crate::room::Room;
use crate::types::RoomId;

#[derive(Debug)]
struct Entry {
    room: Arc<Room>,
    mailbox: mpsc::UnboundedSender<ChatMessage>,
}

/// Joined rooms by id
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Entry>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a room under its own id and start its delivery task
    ///
    /// Must be called inside a tokio runtime. Returns the room previously
    /// registered under that id, if any; its task finishes whatever is
    /// already queued and then exits.
    pub fn register(&mut self, room: Arc<Room>) -> Option<Arc<Room>> {
        let (mailbox, mut inbox) = mpsc::unbounded_channel::<ChatMessage>();
        let delivery_room = room.clone();
        tokio::spawn(async move {
            while let Some(message) = inbox.recv().await {
                delivery_room.dispatch(&message).await;
            }
        });

        self.rooms
            .insert(room.id().clone(), Entry { room, mailbox })
            .map(|previous| previous.room)
    }

    /// Queue a message for its room
    ///
    /// Returns false when no room is registered under `message.room`.
    pub fn deliver(&self, message: ChatMessage) -> bool {
        let Some(entry) = self.rooms.get(&message.room) else {
            return false;
        };
        entry.mailbox.send(message).is_ok()
    }

    pub fn get(&self, id: &RoomId) -> Option<&Arc<Room>> {
        self.rooms.get(id).map(|entry| &entry.room)
    }

    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

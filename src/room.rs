//! Room handle
//!
//! A joined chat or battle room. Rooms enqueue outbound text through the
//! shared Outbox and fan incoming chat messages out to their subscribers.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::error::SendError;
use crate::message::{ChatMessage, Command};
use crate::queue::Outbox;
use crate::types::RoomId;

/// Room flavour
///
/// Battle rooms carry no extra state yet; the tag is where battle
/// handling hooks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    Chat,
    Battle,
}

/// Capability hook for battle rooms
///
/// Empty for now; battle handling will hang its methods here.
pub trait BattleHandler: Send + Sync {}

impl BattleHandler for Room {}

/// Receives chat messages dispatched to a room
pub trait RoomSubscriber: Send + Sync {
    fn notify(&self, room: &Room, message: &ChatMessage);
}

impl<F> RoomSubscriber for F
where
    F: Fn(&Room, &ChatMessage) + Send + Sync,
{
    fn notify(&self, room: &Room, message: &ChatMessage) {
        self(room, message)
    }
}

/// Forwards messages into an mpsc channel
struct ChannelSubscriber {
    sender: mpsc::UnboundedSender<ChatMessage>,
}

impl RoomSubscriber for ChannelSubscriber {
    fn notify(&self, _room: &Room, message: &ChatMessage) {
        // Receiver dropped: the subscriber just goes quiet
        let _ = self.sender.send(message.clone());
    }
}

/// A joined room
pub struct Room {
    id: RoomId,
    kind: RoomKind,
    outbox: Outbox,
    subscribers: RwLock<Vec<Arc<dyn RoomSubscriber>>>,
}

impl Room {
    /// Create a room bound to the client's Outbox
    pub fn new(id: RoomId, kind: RoomKind, outbox: Outbox) -> Self {
        Self {
            id,
            kind,
            outbox,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn kind(&self) -> RoomKind {
        self.kind
    }

    pub fn is_battle(&self) -> bool {
        self.kind == RoomKind::Battle
    }

    /// Battle view of this room; `None` for chat rooms
    pub fn as_battle(&self) -> Option<&dyn BattleHandler> {
        self.is_battle().then_some(self as &dyn BattleHandler)
    }

    /// Say something in this room
    ///
    /// Enqueues `<roomid>|<text>` on the Outbound Queue.
    pub fn send(&self, text: impl Into<String>) -> Result<(), SendError> {
        self.outbox.send_command(&Command::Say {
            room: self.id.clone(),
            text: text.into(),
        })
    }

    /// Attach a subscriber
    pub async fn subscribe(&self, subscriber: impl RoomSubscriber + 'static) {
        self.subscribers.write().await.push(Arc::new(subscriber));
    }

    /// Subscribe through a channel
    ///
    /// Every message dispatched after this call is delivered to the
    /// returned receiver.
    pub async fn messages(&self) -> mpsc::UnboundedReceiver<ChatMessage> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribe(ChannelSubscriber { sender }).await;
        receiver
    }

    /// Number of attached subscribers
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Invoke every subscriber with `message`
    pub async fn dispatch(&self, message: &ChatMessage) {
        let subscribers = self.subscribers.read().await.clone();
        for subscriber in subscribers {
            subscriber.notify(self, message);
        }
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

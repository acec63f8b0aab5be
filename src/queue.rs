//! Outbound and inbound queues
//!
//! Both queues are unbounded FIFO mpsc channels. `recv` suspends while
//! empty, so the consumers never spin.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::Command;

/// Receiving end of the Outbound Queue (consumed by the sender loop)
pub type OutboundReceiver = mpsc::UnboundedReceiver<String>;

/// Sending end of the Inbound Queue (fed by the receiver loop)
pub type InboundSender = mpsc::UnboundedSender<String>;

/// Receiving end of the Inbound Queue (consumed by the parser)
pub type InboundReceiver = mpsc::UnboundedReceiver<String>;

/// Producer handle for the Outbound Queue
///
/// Cheap to clone; rooms, the parser and the input feed each hold one.
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: mpsc::UnboundedSender<String>,
}

impl Outbox {
    /// Enqueue a raw command string
    ///
    /// Returns an error if the sender loop is gone.
    pub fn send(&self, command: impl Into<String>) -> Result<(), SendError> {
        self.sender
            .send(command.into())
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Enqueue a typed command
    pub fn send_command(&self, command: &Command) -> Result<(), SendError> {
        self.send(command.to_string())
    }

    /// Check whether the consumer has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Create the Outbound Queue
pub fn outbound_queue() -> (Outbox, OutboundReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Outbox { sender }, receiver)
}

/// Create the Inbound Queue
pub fn inbound_queue() -> (InboundSender, InboundReceiver) {
    mpsc::unbounded_channel()
}

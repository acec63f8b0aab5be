//! Protocol Parser actor
//!
//! The single stateful component. Owns the Session, consumes raw frames from
//! the Inbound Queue and control commands from client handles, drives the
//! login state machine and routes chat messages to rooms.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::Authenticator;
use crate::error::ClientError;
use crate::message::{parse_frame, ChatMessage, Command, ParsedEvent};
use crate::queue::{InboundReceiver, Outbox};
use crate::room::Room;
use crate::session::{AuthState, Session};

/// Commands sent from client handles to the parser
#[derive(Debug)]
pub enum ControlCommand {
    /// Make a room reachable for dispatch
    Register(Arc<Room>),
}

/// The parser actor
pub struct Parser {
    session: Session,
    outbox: Outbox,
    auth: Arc<dyn Authenticator>,
    state: watch::Sender<AuthState>,
    control: mpsc::UnboundedReceiver<ControlCommand>,
    inbound: InboundReceiver,
    cancel: CancellationToken,
}

impl Parser {
    pub fn new(
        session: Session,
        outbox: Outbox,
        auth: Arc<dyn Authenticator>,
        state: watch::Sender<AuthState>,
        control: mpsc::UnboundedReceiver<ControlCommand>,
        inbound: InboundReceiver,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            outbox,
            auth,
            state,
            control,
            inbound,
            cancel,
        }
    }

    /// Run the parser loop
    ///
    /// Control commands are drained before the next frame so a room is
    /// always registered before the reply to its `/join` is parsed.
    /// Ends on cancellation or when the Inbound Queue closes.
    pub async fn run(mut self) -> Result<(), ClientError> {
        debug!("Parser started");

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                Some(cmd) = self.control.recv() => self.handle_control(cmd),
                frame = self.inbound.recv() => match frame {
                    Some(frame) => self.handle_frame(&frame).await,
                    None => {
                        debug!("Inbound queue closed");
                        break;
                    }
                },
            }
        }

        debug!("Parser stopped");
        Ok(())
    }

    fn handle_control(&mut self, cmd: ControlCommand) {
        match cmd {
            ControlCommand::Register(room) => {
                debug!("Registering room {}", room.id());
                if self.session.rooms.register(room).is_some() {
                    debug!("Replaced existing room handle");
                }
            }
        }
    }

    /// Process one raw frame
    pub async fn handle_frame(&mut self, frame: &str) {
        for event in parse_frame(frame) {
            match event {
                ParsedEvent::Chat(message) => self.dispatch(message),
                ParsedEvent::Challstr(challstr) => self.handle_challstr(challstr).await,
                ParsedEvent::UpdateSearch => {
                    self.mark_ready();
                }
                ParsedEvent::Init => debug!("Room init, skipping rest of frame"),
                ParsedEvent::Unrecognized(line) => debug!("Ignoring line: {}", line),
            }
        }
    }

    /// Hand a chat message to its room without waiting for subscribers
    fn dispatch(&self, message: ChatMessage) {
        let room = message.room.clone();
        if !self.session.rooms.deliver(message) {
            debug!("Dropping message for unregistered room {}", room);
        }
    }

    /// Run the login handshake for a fresh challstr
    async fn handle_challstr(&mut self, challstr: String) {
        self.session.challstr = challstr;
        self.state.send_replace(AuthState::LoggingIn);
        info!("Received challstr, logging in as {}", self.session.credentials.username);

        let result = tokio::select! {
            _ = self.cancel.cancelled() => return,
            result = self.auth.login(&self.session.credentials, &self.session.challstr) => result,
        };

        let assertion = match result {
            Ok(assertion) => assertion,
            Err(e) => {
                warn!("Login failed: {}", e);
                return;
            }
        };

        let login = Command::Login {
            username: self.session.credentials.username.clone(),
            assertion,
        };
        if self.outbox.send_command(&login).is_err() {
            warn!("Outbound queue closed before login could be sent");
            return;
        }
        self.state.send_replace(AuthState::Authenticated);
    }

    /// Complete the ready signal; returns true only on the first call
    fn mark_ready(&self) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if *state == AuthState::Ready {
                false
            } else {
                *state = AuthState::Ready;
                true
            }
        });
        if changed {
            info!("Session ready");
        }
        changed
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

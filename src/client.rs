//! Client and client handle
//!
//! `Client` owns everything needed to run one connection; `ClientHandle` is
//! the cheap, clonable way for rooms, the input feed and callers to talk to
//! a running (or not yet started) client.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::auth::{Authenticator, HttpAuthenticator};
use crate::config::ClientConfig;
use crate::error::{ClientError, SendError};
use crate::message::Command;
use crate::parser::{ControlCommand, Parser};
use crate::pump::{receive_loop, send_loop};
use crate::queue::{inbound_queue, outbound_queue, OutboundReceiver, Outbox};
use crate::room::{Room, RoomKind};
use crate::session::{AuthState, Credentials, Session};
use crate::transport::Transport;
use crate::types::RoomId;

/// Clonable handle to a client
#[derive(Debug, Clone)]
pub struct ClientHandle {
    outbox: Outbox,
    control: mpsc::UnboundedSender<ControlCommand>,
    state: watch::Receiver<AuthState>,
    cancel: CancellationToken,
}

impl ClientHandle {
    /// Join a chat room
    ///
    /// The room is registered before `|/join <id>` is enqueued, so it can
    /// receive messages as soon as the server answers.
    pub fn join_room(&self, id: impl Into<RoomId>) -> Result<Arc<Room>, SendError> {
        self.join(id.into(), RoomKind::Chat)
    }

    /// Join a battle room
    pub fn join_battle(&self, id: impl Into<RoomId>) -> Result<Arc<Room>, SendError> {
        self.join(id.into(), RoomKind::Battle)
    }

    fn join(&self, id: RoomId, kind: RoomKind) -> Result<Arc<Room>, SendError> {
        let room = Arc::new(Room::new(id.clone(), kind, self.outbox.clone()));
        self.control
            .send(ControlCommand::Register(room.clone()))
            .map_err(|_| SendError::ChannelClosed)?;
        self.outbox.send_command(&Command::Join(id))?;
        info!("Joining room {}", room.id());
        Ok(room)
    }

    /// Enqueue a raw protocol command
    pub fn send(&self, command: impl Into<String>) -> Result<(), SendError> {
        self.outbox.send(command)
    }

    /// Current authentication state
    pub fn auth_state(&self) -> AuthState {
        *self.state.borrow()
    }

    /// Wait until the server has confirmed the login
    ///
    /// Fails if the client stops first.
    pub async fn ready(&self) -> Result<(), ClientError> {
        let mut state = self.state.clone();
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ClientError::ConnectionClosed),
            result = state.wait_for(|s| *s == AuthState::Ready) => {
                result.map(|_| ()).map_err(|_| ClientError::ConnectionClosed)
            }
        }
    }

    /// Stop the client
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolve once the client has been told to stop
    pub async fn stopped(&self) {
        self.cancel.cancelled().await
    }
}

/// A client for one connection
pub struct Client {
    config: ClientConfig,
    session: Session,
    auth: Arc<dyn Authenticator>,
    handle: ClientHandle,
    outbound: OutboundReceiver,
    control: mpsc::UnboundedReceiver<ControlCommand>,
    state: watch::Sender<AuthState>,
}

impl Client {
    /// Create a client that logs in over HTTP
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self, ClientError> {
        let auth = Arc::new(HttpAuthenticator::new(&config)?);
        Ok(Self::with_authenticator(config, credentials, auth))
    }

    /// Create a client with a custom login handshake
    pub fn with_authenticator(
        config: ClientConfig,
        credentials: Credentials,
        auth: Arc<dyn Authenticator>,
    ) -> Self {
        let (outbox, outbound) = outbound_queue();
        let (control_tx, control) = mpsc::unbounded_channel();
        let (state, state_rx) = watch::channel(AuthState::default());

        let handle = ClientHandle {
            outbox,
            control: control_tx,
            state: state_rx,
            cancel: CancellationToken::new(),
        };

        Self {
            config,
            session: Session::new(credentials),
            auth,
            handle,
            outbound,
            control,
            state,
        }
    }

    pub fn handle(&self) -> ClientHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect and run until any loop ends or the handle shuts down
    ///
    /// The first loop to finish cancels the others and closes the socket.
    /// Every loop failure is logged; the first one is returned.
    pub async fn run(self) -> Result<(), ClientError> {
        let cancel = self.handle.cancel.clone();
        let url = self.config.websocket_url();

        let transport = match Transport::connect(&url).await {
            Ok(transport) => Arc::new(transport),
            Err(e) => {
                error!("Failed to connect to {}: {}", url, e);
                cancel.cancel();
                return Err(e);
            }
        };

        let (inbound_tx, inbound_rx) = inbound_queue();
        let parser = Parser::new(
            self.session,
            self.handle.outbox.clone(),
            self.auth,
            self.state,
            self.control,
            inbound_rx,
            cancel.clone(),
        );

        let mut tasks = JoinSet::new();
        let send_transport = transport.clone();
        let send_cancel = cancel.clone();
        let outbound = self.outbound;
        tasks.spawn(async move {
            ("sender", send_loop(send_transport, outbound, send_cancel).await)
        });
        let recv_transport = transport.clone();
        let recv_cancel = cancel.clone();
        tasks.spawn(async move {
            ("receiver", receive_loop(recv_transport, inbound_tx, recv_cancel).await)
        });
        tasks.spawn(async move { ("parser", parser.run().await) });

        info!("Client running");

        let mut outcome = Ok(());
        while let Some(joined) = tasks.join_next().await {
            if !cancel.is_cancelled() {
                debug!("First loop finished, shutting down");
                cancel.cancel();
            }
            transport.close().await;

            match joined {
                Ok((name, Ok(()))) => debug!("{} loop finished", name),
                Ok((name, Err(e))) => {
                    error!("{} loop failed: {}", name, e);
                    if outcome.is_ok() {
                        outcome = Err(e);
                    }
                }
                Err(e) => {
                    error!("Loop task failed: {}", e);
                    if outcome.is_ok() {
                        outcome = Err(e.into());
                    }
                }
            }
        }

        info!("Client stopped");
        outcome
    }
}

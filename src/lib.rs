//! Pokemon Showdown Protocol Client Library
//!
//! A client for Showdown's line-oriented, room-scoped chat protocol built
//! with tokio-tungstenite, plus the HTTP challstr login.
//!
//! # Features
//! - WebSocket connection handling
//! - Challstr login over HTTP and `/trn` authentication
//! - Room joining (chat and battle rooms)
//! - Chat message dispatch to per-room subscribers
//! - Ready signal once the server accepts the login
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - The sender and receiver loops move text between the socket and two queues
//! - `Parser` is the central actor owning the session and room registry
//! - `ClientHandle`s talk to the parser through control messages
//! - No locks on session state - all access goes through message passing
//! - One `CancellationToken` stops every loop as soon as one of them ends
//!
//! # Example
//! ```ignore
//! use showdown_client::{Client, ClientConfig, Credentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::default(), Credentials::new("ash", "pikachu"))?;
//!     let handle = client.handle();
//!
//!     let lobby = handle.join_room("lobby")?;
//!     lobby
//!         .subscribe(|_room: &showdown_client::Room, msg: &showdown_client::ChatMessage| {
//!             println!("{}: {}", msg.sender, msg.text);
//!         })
//!         .await;
//!
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod parser;
pub mod pump;
pub mod queue;
pub mod registry;
pub mod room;
pub mod session;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use auth::{Authenticator, HttpAuthenticator};
pub use client::{Client, ClientHandle};
pub use config::ClientConfig;
pub use error::{AuthError, ClientError, SendError};
pub use message::{parse_frame, ChatMessage, Command, ParsedEvent};
pub use queue::Outbox;
pub use registry::RoomRegistry;
pub use room::{BattleHandler, Room, RoomKind, RoomSubscriber};
pub use session::{AuthState, Credentials, Session};
pub use transport::Transport;
pub use types::RoomId;

//! Login session state
//!
//! The Session is owned by the parser task; nothing else mutates it.

use std::fmt;

use crate::registry::RoomRegistry;

/// Account credentials used for the challstr login
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication progress
///
/// `Unauthenticated → LoggingIn → Authenticated → Ready`. A failed login
/// leaves the session in `LoggingIn` until the next challstr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No challstr received yet
    #[default]
    Unauthenticated,
    /// Challstr received, HTTP login in flight or failed
    LoggingIn,
    /// `/trn` command enqueued
    Authenticated,
    /// Server confirmed with `updatesearch`
    Ready,
}

/// Per-client session
#[derive(Debug)]
pub struct Session {
    pub credentials: Credentials,
    /// Current challenge token; empty until the first `challstr`
    pub challstr: String,
    pub rooms: RoomRegistry,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            challstr: String::new(),
            rooms: RoomRegistry::new(),
        }
    }
}

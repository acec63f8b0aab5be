//! Basic type definitions for the client
//!
//! Provides newtype wrappers for type safety:
//! - `RoomId`: server-side room identifier used to scope protocol lines

/// Room used when a frame carries no `>roomid` context line
pub const DEFAULT_ROOM: &str = "lobby";

/// Room identifier (newtype pattern)
///
/// Used as the registry key and as the prefix of room-scoped commands.
/// Kept verbatim; the server is responsible for normalizing ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Create a RoomId from anything string-like
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The default room for frames without a room context
    pub fn lobby() -> Self {
        Self(DEFAULT_ROOM.to_string())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::lobby()
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Protocol definitions
//!
//! Inbound frames are newline-separated lines. A `>roomid` line sets the
//! room for the lines after it; `|verb|arg|arg...` lines are commands.
//! Outbound commands are `|/command` (global) or `roomid|text` (room-scoped).

use std::fmt;

use crate::types::RoomId;

/// Chat message received in a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Room the message was said in
    pub room: RoomId,
    /// Display name of the sender (including rank symbol)
    pub sender: String,
    /// Message body; may itself contain `|`
    pub text: String,
    /// Server timestamp in seconds
    pub timestamp: i64,
}

/// One interpreted protocol line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    /// `|c:|timestamp|user|message`
    Chat(ChatMessage),
    /// `|challstr|token` with the token reassembled
    Challstr(String),
    /// `|updatesearch|...`, sent once the login is accepted
    UpdateSearch,
    /// `|init|...`; nothing after it in the frame is interpreted
    Init,
    /// Plain text, `||` lines, unknown verbs and malformed commands
    Unrecognized(String),
}

/// Split a raw frame into events
///
/// Empty lines and `>roomid` context lines produce no event. Parsing stops
/// after an `init` line.
pub fn parse_frame(frame: &str) -> Vec<ParsedEvent> {
    let mut room = RoomId::lobby();
    let mut events = Vec::new();

    for line in frame.split('\n') {
        if line.is_empty() {
            continue;
        }
        if let Some(id) = line.strip_prefix('>') {
            room = RoomId::new(id);
            continue;
        }

        let event = parse_line(&room, line);
        let stop = event == ParsedEvent::Init;
        events.push(event);
        if stop {
            break;
        }
    }

    events
}

/// Interpret a single non-context line in the given room
fn parse_line(room: &RoomId, line: &str) -> ParsedEvent {
    if !line.starts_with('|') || line.starts_with("||") {
        return ParsedEvent::Unrecognized(line.to_string());
    }

    let parts: Vec<&str> = line.split('|').collect();
    match parts[1] {
        "init" => ParsedEvent::Init,
        "c:" => parse_chat(room, &parts)
            .unwrap_or_else(|| ParsedEvent::Unrecognized(line.to_string())),
        "challstr" if parts.len() > 2 && !parts[2].is_empty() => {
            ParsedEvent::Challstr(parts[2..].join("|"))
        }
        "updatesearch" => ParsedEvent::UpdateSearch,
        _ => ParsedEvent::Unrecognized(line.to_string()),
    }
}

fn parse_chat(room: &RoomId, parts: &[&str]) -> Option<ParsedEvent> {
    if parts.len() < 4 {
        return None;
    }
    let timestamp = parts[2].parse::<i64>().ok()?;
    Some(ParsedEvent::Chat(ChatMessage {
        room: room.clone(),
        sender: parts[3].to_string(),
        text: parts[4..].join("|"),
        timestamp,
    }))
}

/// Client → Server command
///
/// `Display` renders the exact wire text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `|/join <room>`
    Join(RoomId),
    /// `|/trn <username>,0,<assertion>` completes the login
    Login { username: String, assertion: String },
    /// `<room>|<text>`
    Say { room: RoomId, text: String },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Join(room) => write!(f, "|/join {}", room),
            Command::Login { username, assertion } => {
                write!(f, "|/trn {},0,{}", username, assertion)
            }
            Command::Say { room, text } => write!(f, "{}|{}", room, text),
        }
    }
}

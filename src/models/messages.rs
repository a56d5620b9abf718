use serde::{Deserialize, Serialize};

use crate::game::board::Color;
use crate::game::state::LogEntry;
use crate::sync::room::RoomStatus;

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientMessage {
    pub action: String,
    pub room_id: Option<String>,
    pub row: Option<usize>,
    pub col: Option<usize>,
}

/// Message sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ServerMessage {
    pub message_type: String,
    pub room_id: Option<String>,
    pub color: Option<Color>,
    pub board: Option<String>,
    pub turn: Option<Color>,
    pub winner: Option<Color>,
    pub status: Option<RoomStatus>,
    pub destinations: Option<Vec<[usize; 2]>>,
    pub log_entry: Option<LogEntry>,
    pub error: Option<String>,
}

impl ServerMessage {
    pub fn of_type(message_type: &str) -> ServerMessage {
        ServerMessage {
            message_type: message_type.to_string(),
            ..ServerMessage::default()
        }
    }

    pub fn error(text: impl Into<String>) -> ServerMessage {
        ServerMessage {
            message_type: "error".to_string(),
            error: Some(text.into()),
            ..ServerMessage::default()
        }
    }
}

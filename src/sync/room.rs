use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::game::board::{Board, Color, Piece, PieceKind, Square, BOARD_SIZE};
use crate::game::state::LogEntry;

/// Length of the human-shareable room code.
pub const ROOM_CODE_LEN: usize = 6;

/// Lifecycle of a room: created Waiting with only the light seat
/// filled, Playing once the dark seat fills. No expiry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
}

/// The shared document representing one live session. Owned by the
/// store; clients hold eventually-consistent copies delivered through
/// their subscriptions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoomDocument {
    pub board: String,
    pub turn: Color,
    pub winner: Option<Color>,
    pub last_log: Option<LogEntry>,
    pub seat_light: String,
    pub seat_dark: Option<String>,
    pub status: RoomStatus,
}

impl RoomDocument {
    /// The document a freshly created room starts with.
    pub fn new(creator_identity: &str) -> RoomDocument {
        RoomDocument {
            board: encode_board(&Board::initial()),
            turn: Color::Light,
            winner: None,
            last_log: None,
            seat_light: creator_identity.to_string(),
            seat_dark: None,
            status: RoomStatus::Waiting,
        }
    }

    /// The seat color bound to `identity`, if any.
    pub fn seat_of(&self, identity: &str) -> Option<Color> {
        if self.seat_light == identity {
            Some(Color::Light)
        } else if self.seat_dark.as_deref() == Some(identity) {
            Some(Color::Dark)
        } else {
            None
        }
    }
}

/// Partial document written after a local move. Merge semantics: the
/// store preserves seats and status, which are not part of the write.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoomUpdate {
    pub board: String,
    pub turn: Color,
    pub winner: Option<Color>,
    pub last_log: Option<LogEntry>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("encoded board has {0} cells, expected 64")]
    BadLength(usize),
    #[error("encoded board contains unknown piece character {0:?}")]
    BadPiece(char),
}

fn piece_to_char(piece: Piece) -> char {
    let c = match piece.kind {
        PieceKind::Pawn => 'p',
        PieceKind::Knight => 'n',
        PieceKind::Bishop => 'b',
        PieceKind::Rook => 'r',
        PieceKind::Queen => 'q',
        PieceKind::King => 'k',
    };
    match piece.color {
        Color::Light => c.to_ascii_uppercase(),
        Color::Dark => c,
    }
}

fn piece_from_char(c: char) -> Result<Piece, DecodeError> {
    let color = if c.is_ascii_uppercase() {
        Color::Light
    } else {
        Color::Dark
    };
    let kind = match c.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return Err(DecodeError::BadPiece(c)),
    };
    Ok(Piece::new(color, kind))
}

/// Serializes a board as 64 characters, row-major from row 0.
/// Uppercase letters are Light pieces, lowercase Dark, '.' empty.
pub fn encode_board(board: &Board) -> String {
    let mut out = String::with_capacity(BOARD_SIZE * BOARD_SIZE);
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            match board.get(Square::new(row, col)) {
                Some(piece) => out.push(piece_to_char(piece)),
                None => out.push('.'),
            }
        }
    }
    out
}

/// Inverse of `encode_board`. Malformed input is an error, never a
/// default board.
pub fn decode_board(encoded: &str) -> Result<Board, DecodeError> {
    let cells: Vec<char> = encoded.chars().collect();
    if cells.len() != BOARD_SIZE * BOARD_SIZE {
        return Err(DecodeError::BadLength(cells.len()));
    }
    let mut board = Board::empty();
    for (index, c) in cells.into_iter().enumerate() {
        if c == '.' {
            continue;
        }
        let square = Square::new(index / BOARD_SIZE, index % BOARD_SIZE);
        board.set(square, Some(piece_from_char(c)?));
    }
    Ok(board)
}

/// Generates a 6-character uppercase room code. Codes are matched
/// case-insensitively; `normalize_room_code` is applied on lookup.
pub fn new_room_code() -> String {
    Uuid::new_v4().simple().to_string()[..ROOM_CODE_LEN].to_uppercase()
}

pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_uppercase()
}

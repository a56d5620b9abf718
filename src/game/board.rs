use serde::{Deserialize, Serialize};

/// One of the two factions. Light sits on rows 6-7 and moves toward
/// row 0; Dark sits on rows 0-1 and moves toward row 7.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Light,
    Dark,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::Light => Color::Dark,
            Color::Dark => Color::Light,
        }
    }

    /// Display name used in battle-log text.
    pub fn side_name(self) -> &'static str {
        match self {
            Color::Light => "Light",
            Color::Dark => "Dark",
        }
    }

    /// Row a pawn of this color starts on.
    pub fn pawn_start_row(self) -> usize {
        match self {
            Color::Light => 6,
            Color::Dark => 1,
        }
    }

    /// Row direction this color's pawns advance in.
    pub fn forward(self) -> i32 {
        match self {
            Color::Light => -1,
            Color::Dark => 1,
        }
    }

    /// The opponent's back rank, where this color's pawns promote.
    pub fn promotion_row(self) -> usize {
        match self {
            Color::Light => 0,
            Color::Dark => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn name(self) -> &'static str {
        match self {
            PieceKind::Pawn => "Pawn",
            PieceKind::Knight => "Knight",
            PieceKind::Bishop => "Bishop",
            PieceKind::Rook => "Rook",
            PieceKind::Queen => "Queen",
            PieceKind::King => "King",
        }
    }
}

/// A piece on the board. Immutable value; promotion replaces the piece
/// rather than mutating it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(color: Color, kind: PieceKind) -> Piece {
        Piece { color, kind }
    }

    /// Log-friendly name, e.g. "Light Queen".
    pub fn display_name(self) -> String {
        format!("{} {}", self.color.side_name(), self.kind.name())
    }
}

pub const BOARD_SIZE: usize = 8;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    pub fn new(row: usize, col: usize) -> Square {
        Square { row, col }
    }

    /// Returns the square only if the coordinates are on the board.
    pub fn checked(row: usize, col: usize) -> Option<Square> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Square { row, col })
        } else {
            None
        }
    }

    /// The square offset by (dr, dc), or None if it falls off the board.
    pub fn offset(self, dr: i32, dc: i32) -> Option<Square> {
        let row = self.row as i32 + dr;
        let col = self.col as i32 + dc;
        if (0..BOARD_SIZE as i32).contains(&row) && (0..BOARD_SIZE as i32).contains(&col) {
            Some(Square::new(row as usize, col as usize))
        } else {
            None
        }
    }
}

/// Fixed 8x8 grid of optional pieces. Row 0 is the Dark back rank,
/// row 7 the Light back rank. At most one piece per cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn empty() -> Board {
        Board {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// The standard starting position.
    pub fn initial() -> Board {
        use PieceKind::*;
        let back_rank = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        let mut board = Board::empty();
        for (col, kind) in back_rank.into_iter().enumerate() {
            board.cells[0][col] = Some(Piece::new(Color::Dark, kind));
            board.cells[7][col] = Some(Piece::new(Color::Light, kind));
        }
        for col in 0..BOARD_SIZE {
            board.cells[1][col] = Some(Piece::new(Color::Dark, Pawn));
            board.cells[6][col] = Some(Piece::new(Color::Light, Pawn));
        }
        board
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        self.cells[square.row][square.col]
    }

    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.cells[square.row][square.col] = piece;
    }

    /// Removes and returns the piece at `square`.
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        self.cells[square.row][square.col].take()
    }

    /// Iterates over all occupied squares with their pieces.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cols)| {
            cols.iter()
                .enumerate()
                .filter_map(move |(col, piece)| piece.map(|p| (Square::new(row, col), p)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_board_has_standard_setup() {
        let board = Board::initial();
        assert_eq!(
            board.get(Square::new(0, 4)),
            Some(Piece::new(Color::Dark, PieceKind::King))
        );
        assert_eq!(
            board.get(Square::new(7, 4)),
            Some(Piece::new(Color::Light, PieceKind::King))
        );
        assert_eq!(
            board.get(Square::new(0, 3)),
            Some(Piece::new(Color::Dark, PieceKind::Queen))
        );
        for col in 0..BOARD_SIZE {
            assert_eq!(
                board.get(Square::new(1, col)),
                Some(Piece::new(Color::Dark, PieceKind::Pawn))
            );
            assert_eq!(
                board.get(Square::new(6, col)),
                Some(Piece::new(Color::Light, PieceKind::Pawn))
            );
        }
        for row in 2..6 {
            for col in 0..BOARD_SIZE {
                assert_eq!(board.get(Square::new(row, col)), None);
            }
        }
        assert_eq!(board.pieces().count(), 32);
    }

    #[test]
    fn take_clears_the_cell() {
        let mut board = Board::initial();
        let square = Square::new(6, 0);
        let piece = board.take(square);
        assert_eq!(piece, Some(Piece::new(Color::Light, PieceKind::Pawn)));
        assert_eq!(board.get(square), None);
    }

    #[test]
    fn offset_rejects_off_board_squares() {
        assert_eq!(Square::new(0, 0).offset(-1, 0), None);
        assert_eq!(Square::new(7, 7).offset(0, 1), None);
        assert_eq!(Square::new(3, 3).offset(-2, 1), Some(Square::new(1, 4)));
        assert_eq!(Square::checked(8, 0), None);
    }
}

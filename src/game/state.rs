use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::board::{Board, Color, Piece, PieceKind, Square};
use crate::game::movegen::pseudo_legal_moves;

const WELCOME_TEXT: &str = "A long time ago in a galaxy far, far away...";

/// One battle-log line. Ids increase strictly over time; the log is
/// append-only and ordered most-recent-first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: u64,
    pub text: String,
}

/// The active player's current selection together with its cached
/// pseudo-legal destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub square: Square,
    pub destinations: Vec<Square>,
}

/// Everything `apply_move` did, handed back to the caller and to the
/// sync layer for publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub from: Square,
    pub to: Square,
    /// The piece as it stands on `to`, after any promotion.
    pub moved: Piece,
    pub captured: Option<Piece>,
    pub promoted: bool,
    pub winner: Option<Color>,
    pub entry: LogEntry,
}

/// Outcome of a square click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A piece of the active color was selected (or reselected).
    Selected(Square),
    /// A legal destination was clicked and the move was applied.
    Moved(MoveRecord),
    /// The click was neither a selectable piece nor a legal
    /// destination; any selection was cleared.
    InvalidSelection,
    /// The game is over; input is a no-op contract-violation signal.
    GameOver,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("move from ({}, {}) to ({}, {}) is not in the current legal set", .from.row, .from.col, .to.row, .to.col)]
    IllegalMove { from: Square, to: Square },
    #[error("the game is already over")]
    GameOver,
}

/// The turn/selection/capture/promotion/win state machine. All
/// transitions run on a single thread; `apply_move` is not reentrant.
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    turn: Color,
    selection: Option<Selection>,
    log: Vec<LogEntry>,
    winner: Option<Color>,
}

impl GameState {
    pub fn new() -> GameState {
        let mut game = GameState {
            board: Board::initial(),
            turn: Color::Light,
            selection: None,
            log: Vec::new(),
            winner: None,
        };
        let welcome = LogEntry {
            id: game.next_log_id(),
            text: WELCOME_TEXT.to_string(),
        };
        game.log.push(welcome);
        game
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Cached legal destinations of the current selection, empty when
    /// nothing is selected.
    pub fn legal_destinations(&self) -> &[Square] {
        self.selection
            .as_ref()
            .map(|s| s.destinations.as_slice())
            .unwrap_or(&[])
    }

    /// Most-recent-first battle log.
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn latest_log_id(&self) -> Option<u64> {
        self.log.first().map(|entry| entry.id)
    }

    /// Feeds one (row, col) click into the state machine.
    pub fn on_square_clicked(&mut self, row: usize, col: usize) -> ClickOutcome {
        if self.winner.is_some() {
            return ClickOutcome::GameOver;
        }
        let Some(square) = Square::checked(row, col) else {
            // An off-board click is never a destination or a piece, so
            // any selection is cleared like any other invalid click.
            self.selection = None;
            return ClickOutcome::InvalidSelection;
        };
        let piece = self.board.get(square);

        if let Some(selection) = &self.selection {
            if selection.destinations.contains(&square) {
                let from = selection.square;
                return match self.apply_move(from, square) {
                    Ok(record) => ClickOutcome::Moved(record),
                    Err(_) => ClickOutcome::InvalidSelection,
                };
            }
            // Clicking another of our own pieces switches the selection.
            if matches!(piece, Some(p) if p.color == self.turn) {
                return self.select(square);
            }
            self.selection = None;
            return ClickOutcome::InvalidSelection;
        }

        if matches!(piece, Some(p) if p.color == self.turn) {
            return self.select(square);
        }
        ClickOutcome::InvalidSelection
    }

    fn select(&mut self, square: Square) -> ClickOutcome {
        let destinations = pseudo_legal_moves(&self.board, square);
        self.selection = Some(Selection {
            square,
            destinations,
        });
        ClickOutcome::Selected(square)
    }

    /// Applies a move previously validated against the cached legal
    /// set. The only state-mutating operation. Any (from, to) pair
    /// outside the cached set is rejected without touching the board.
    pub fn apply_move(&mut self, from: Square, to: Square) -> Result<MoveRecord, MoveError> {
        if self.winner.is_some() {
            return Err(MoveError::GameOver);
        }
        let legal = self
            .selection
            .as_ref()
            .is_some_and(|s| s.square == from && s.destinations.contains(&to));
        if !legal {
            return Err(MoveError::IllegalMove { from, to });
        }
        let Some(mut piece) = self.board.get(from) else {
            return Err(MoveError::IllegalMove { from, to });
        };
        let captured = self.board.get(to);

        let mut text = match captured {
            Some(target) => format!(
                "CRITICAL HIT! {} destroys {}!",
                piece.display_name(),
                target.display_name()
            ),
            None => format!("{} advances.", piece.display_name()),
        };

        if matches!(captured, Some(t) if t.kind == PieceKind::King) {
            self.winner = Some(piece.color);
            text.push_str(match piece.color {
                Color::Light => " The Galaxy is saved!",
                Color::Dark => " The Dark Side claims the Galaxy...",
            });
        }

        let mut promoted = false;
        if piece.kind == PieceKind::Pawn && to.row == piece.color.promotion_row() {
            piece = Piece::new(piece.color, PieceKind::Queen);
            promoted = true;
            text.push_str(&format!(" -> Promoted to {}!", piece.display_name()));
        }

        self.board.set(to, Some(piece));
        self.board.set(from, None);
        if self.winner.is_none() {
            self.turn = self.turn.opponent();
        }
        self.selection = None;

        let entry = LogEntry {
            id: self.next_log_id(),
            text,
        };
        self.log.insert(0, entry.clone());

        Ok(MoveRecord {
            from,
            to,
            moved: piece,
            captured,
            promoted,
            winner: self.winner,
            entry,
        })
    }

    /// Restores the initial position and a fresh welcome entry.
    pub fn reset(&mut self) {
        *self = GameState::new();
    }

    /// Wholesale replacement of board/turn/winner from a remote
    /// snapshot. Clears the selection, whose cached destinations are
    /// stale against the new board.
    pub fn restore(&mut self, board: Board, turn: Color, winner: Option<Color>) {
        self.board = board;
        self.turn = turn;
        self.winner = winner;
        self.selection = None;
    }

    /// Prepends a log entry produced elsewhere (a remote move).
    pub fn record_entry(&mut self, entry: LogEntry) {
        self.log.insert(0, entry);
    }

    /// Millisecond timestamp clamped to stay strictly above the newest
    /// log id, so two entries in the same millisecond still order.
    fn next_log_id(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let floor = self
            .latest_log_id()
            .map(|id| id.saturating_add(1))
            .unwrap_or(0);
        now.max(floor)
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(row: usize, col: usize) -> Square {
        Square::new(row, col)
    }

    #[test]
    fn new_game_starts_with_light_and_a_welcome_entry() {
        let game = GameState::new();
        assert_eq!(game.turn(), Color::Light);
        assert_eq!(game.winner(), None);
        assert!(game.selection().is_none());
        assert_eq!(game.log().len(), 1);
        assert_eq!(game.log()[0].text, WELCOME_TEXT);
    }

    #[test]
    fn selecting_own_piece_caches_destinations() {
        let mut game = GameState::new();
        assert_eq!(game.on_square_clicked(6, 4), ClickOutcome::Selected(sq(6, 4)));
        let mut dests: Vec<_> = game
            .legal_destinations()
            .iter()
            .map(|s| (s.row, s.col))
            .collect();
        dests.sort_unstable();
        assert_eq!(dests, vec![(4, 4), (5, 4)]);
    }

    #[test]
    fn selecting_enemy_piece_or_empty_square_is_invalid() {
        let mut game = GameState::new();
        assert_eq!(game.on_square_clicked(1, 0), ClickOutcome::InvalidSelection);
        assert_eq!(game.on_square_clicked(4, 4), ClickOutcome::InvalidSelection);
        assert!(game.selection().is_none());
    }

    #[test]
    fn clicking_another_own_piece_switches_selection() {
        let mut game = GameState::new();
        game.on_square_clicked(6, 4);
        assert_eq!(game.on_square_clicked(6, 0), ClickOutcome::Selected(sq(6, 0)));
        assert_eq!(game.selection().map(|s| s.square), Some(sq(6, 0)));
    }

    #[test]
    fn clicking_an_invalid_square_clears_selection() {
        let mut game = GameState::new();
        game.on_square_clicked(6, 4);
        assert_eq!(game.on_square_clicked(3, 0), ClickOutcome::InvalidSelection);
        assert!(game.selection().is_none());
    }

    #[test]
    fn moving_flips_the_turn_and_logs_an_advance() {
        let mut game = GameState::new();
        game.on_square_clicked(6, 4);
        let outcome = game.on_square_clicked(4, 4);
        let ClickOutcome::Moved(record) = outcome else {
            panic!("expected a move, got {outcome:?}");
        };
        assert_eq!(record.from, sq(6, 4));
        assert_eq!(record.to, sq(4, 4));
        assert_eq!(record.captured, None);
        assert_eq!(game.turn(), Color::Dark);
        assert!(game.selection().is_none());
        assert_eq!(game.log()[0].text, "Light Pawn advances.");
        assert!(game.log()[0].id > game.log()[1].id);
    }

    #[test]
    fn apply_move_rejects_pairs_outside_the_cached_set() {
        let mut game = GameState::new();
        // Nothing selected at all.
        assert_eq!(
            game.apply_move(sq(6, 4), sq(4, 4)),
            Err(MoveError::IllegalMove {
                from: sq(6, 4),
                to: sq(4, 4)
            })
        );
        game.on_square_clicked(6, 4);
        // Selected, but the destination is not legal.
        assert!(game.apply_move(sq(6, 4), sq(3, 4)).is_err());
        // Board untouched.
        assert_eq!(game.board(), GameState::new().board());
    }

    #[test]
    fn capture_logs_both_pieces() {
        let mut game = GameState::new();
        let mut board = Board::empty();
        board.set(sq(4, 4), Some(Piece::new(Color::Light, PieceKind::Rook)));
        board.set(sq(4, 7), Some(Piece::new(Color::Dark, PieceKind::Knight)));
        game.restore(board, Color::Light, None);

        game.on_square_clicked(4, 4);
        let ClickOutcome::Moved(record) = game.on_square_clicked(4, 7) else {
            panic!("expected capture");
        };
        assert_eq!(
            record.captured,
            Some(Piece::new(Color::Dark, PieceKind::Knight))
        );
        assert_eq!(
            game.log()[0].text,
            "CRITICAL HIT! Light Rook destroys Dark Knight!"
        );
        assert_eq!(game.winner(), None);
        assert_eq!(game.turn(), Color::Dark);
    }

    #[test]
    fn capturing_the_king_sets_winner_and_freezes_the_board() {
        let mut game = GameState::new();
        let mut board = Board::empty();
        board.set(sq(4, 4), Some(Piece::new(Color::Dark, PieceKind::Queen)));
        board.set(sq(4, 0), Some(Piece::new(Color::Light, PieceKind::King)));
        game.restore(board, Color::Dark, None);

        game.on_square_clicked(4, 4);
        let ClickOutcome::Moved(record) = game.on_square_clicked(4, 0) else {
            panic!("expected capture");
        };
        assert_eq!(record.winner, Some(Color::Dark));
        assert_eq!(game.winner(), Some(Color::Dark));
        // Turn never advances after the winning move.
        assert_eq!(game.turn(), Color::Dark);
        assert!(game.log()[0].text.ends_with("The Dark Side claims the Galaxy..."));
        // Terminal state: all further input is a no-op signal.
        assert_eq!(game.on_square_clicked(4, 0), ClickOutcome::GameOver);
        assert_eq!(
            game.apply_move(sq(4, 0), sq(4, 1)),
            Err(MoveError::GameOver)
        );
    }

    #[test]
    fn pawn_reaching_the_far_rank_promotes_to_queen() {
        let mut game = GameState::new();
        let mut board = Board::empty();
        board.set(sq(1, 2), Some(Piece::new(Color::Light, PieceKind::Pawn)));
        game.restore(board, Color::Light, None);

        game.on_square_clicked(1, 2);
        let ClickOutcome::Moved(record) = game.on_square_clicked(0, 2) else {
            panic!("expected promotion move");
        };
        assert!(record.promoted);
        assert_eq!(record.moved, Piece::new(Color::Light, PieceKind::Queen));
        assert_eq!(
            game.board().get(sq(0, 2)),
            Some(Piece::new(Color::Light, PieceKind::Queen))
        );
        assert!(game.log()[0].text.contains("Promoted to Light Queen!"));
    }

    #[test]
    fn pawn_short_of_the_far_rank_is_not_promoted() {
        let mut game = GameState::new();
        let mut board = Board::empty();
        board.set(sq(2, 2), Some(Piece::new(Color::Light, PieceKind::Pawn)));
        game.restore(board, Color::Light, None);

        game.on_square_clicked(2, 2);
        let ClickOutcome::Moved(record) = game.on_square_clicked(1, 2) else {
            panic!("expected move");
        };
        assert!(!record.promoted);
        assert_eq!(record.moved.kind, PieceKind::Pawn);
    }

    #[test]
    fn apply_move_bookkeeping_is_deterministic() {
        let run = || {
            let mut game = GameState::new();
            game.on_square_clicked(6, 4);
            let ClickOutcome::Moved(record) = game.on_square_clicked(4, 4) else {
                panic!("expected move");
            };
            (game.board().clone(), game.turn(), record.entry.text)
        };
        let (board_a, turn_a, text_a) = run();
        let (board_b, turn_b, text_b) = run();
        assert_eq!(board_a, board_b);
        assert_eq!(turn_a, turn_b);
        assert_eq!(text_a, text_b);
    }

    #[test]
    fn turn_strictly_alternates_over_a_sequence_of_moves() {
        let mut game = GameState::new();
        let moves = [
            ((6, 4), (4, 4)),
            ((1, 4), (3, 4)),
            ((7, 6), (5, 5)),
            ((0, 1), (2, 2)),
        ];
        let mut expected = Color::Light;
        for ((fr, fc), (tr, tc)) in moves {
            assert_eq!(game.turn(), expected);
            game.on_square_clicked(fr, fc);
            assert!(matches!(
                game.on_square_clicked(tr, tc),
                ClickOutcome::Moved(_)
            ));
            expected = expected.opponent();
        }
        assert_eq!(game.turn(), expected);
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut game = GameState::new();
        game.on_square_clicked(6, 4);
        game.on_square_clicked(4, 4);
        game.reset();
        assert_eq!(game.turn(), Color::Light);
        assert_eq!(game.board(), &Board::initial());
        assert_eq!(game.log().len(), 1);
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn off_board_click_clears_an_existing_selection() {
        let mut game = GameState::new();
        game.on_square_clicked(6, 4);
        assert!(game.selection().is_some());
        assert_eq!(game.on_square_clicked(9, 9), ClickOutcome::InvalidSelection);
        assert!(game.selection().is_none());
        // Back in the unselected state: the old cached destinations
        // are gone, so the square they pointed at no longer moves.
        assert_eq!(game.on_square_clicked(4, 4), ClickOutcome::InvalidSelection);
        assert_eq!(game.board(), &Board::initial());
    }

    #[test]
    fn log_ids_saturate_instead_of_overflowing() {
        let mut game = GameState::new();
        // A remote document can carry an arbitrary id.
        game.record_entry(LogEntry {
            id: u64::MAX,
            text: "Dark Pawn advances.".to_string(),
        });
        game.on_square_clicked(6, 4);
        let ClickOutcome::Moved(record) = game.on_square_clicked(4, 4) else {
            panic!("expected move");
        };
        assert_eq!(record.entry.id, u64::MAX);
        assert_eq!(game.log().len(), 3);
    }

    #[test]
    fn record_entry_prepends_without_touching_the_board() {
        let mut game = GameState::new();
        let before = game.board().clone();
        game.record_entry(LogEntry {
            id: u64::MAX,
            text: "Dark Pawn advances.".to_string(),
        });
        assert_eq!(game.log()[0].id, u64::MAX);
        assert_eq!(game.log().len(), 2);
        assert_eq!(game.board(), &before);
    }
}

use galactic_chess::game::{
    pseudo_legal_moves, Board, ClickOutcome, Color, GameState, Piece, PieceKind, Square,
};

fn sq(row: usize, col: usize) -> Square {
    Square::new(row, col)
}

#[test]
fn opposing_pawns_block_each_other_head_on() {
    let mut board = Board::empty();
    board.set(sq(6, 4), Some(Piece::new(Color::Light, PieceKind::Pawn)));
    board.set(sq(1, 4), Some(Piece::new(Color::Dark, PieceKind::Pawn)));
    let mut game = GameState::new();
    game.restore(board, Color::Light, None);

    game.on_square_clicked(6, 4);
    assert!(matches!(game.on_square_clicked(4, 4), ClickOutcome::Moved(_)));
    game.on_square_clicked(1, 4);
    assert!(matches!(game.on_square_clicked(3, 4), ClickOutcome::Moved(_)));

    // Nose to nose: no forward move, and no enemy on either diagonal,
    // so the light pawn has nothing at all.
    let moves = pseudo_legal_moves(game.board(), sq(4, 4));
    assert!(moves.is_empty(), "blocked pawn generated {moves:?}");
}

#[test]
fn corner_rook_sweeps_its_rank_and_file_and_can_win() {
    let mut board = Board::empty();
    board.set(sq(7, 0), Some(Piece::new(Color::Light, PieceKind::Rook)));
    board.set(sq(0, 0), Some(Piece::new(Color::Dark, PieceKind::King)));

    let mut moves: Vec<_> = pseudo_legal_moves(&board, sq(7, 0))
        .into_iter()
        .map(|s| (s.row, s.col))
        .collect();
    moves.sort_unstable();

    let mut expected: Vec<(usize, usize)> = (0..=6).map(|row| (row, 0)).collect();
    expected.extend((1..=7).map(|col| (7usize, col)));
    expected.sort_unstable();
    assert_eq!(moves, expected);

    let mut game = GameState::new();
    game.restore(board, Color::Light, None);
    game.on_square_clicked(7, 0);
    let ClickOutcome::Moved(record) = game.on_square_clicked(0, 0) else {
        panic!("expected the king capture to be a legal move");
    };
    assert_eq!(record.winner, Some(Color::Light));
    assert_eq!(game.winner(), Some(Color::Light));
    // Terminal: the board is frozen.
    assert_eq!(game.on_square_clicked(0, 0), ClickOutcome::GameOver);
}

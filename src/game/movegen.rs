use crate::game::board::{Board, Color, PieceKind, Square};

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const ORTHOGONAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Computes the pseudo-legal destination squares for the piece at
/// `from`. Pure: the board is never mutated. Moves that would leave the
/// mover's own king exposed are NOT filtered out; this engine is
/// pseudo-legal only and has no check detection.
///
/// Returns an empty set if `from` is empty.
pub fn pseudo_legal_moves(board: &Board, from: Square) -> Vec<Square> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };
    let mut moves = Vec::new();
    match piece.kind {
        PieceKind::Pawn => pawn_moves(board, from, piece.color, &mut moves),
        PieceKind::Knight => step_moves(board, from, piece.color, &KNIGHT_OFFSETS, &mut moves),
        PieceKind::King => step_moves(board, from, piece.color, &KING_OFFSETS, &mut moves),
        PieceKind::Rook => slide_moves(board, from, piece.color, &ORTHOGONAL, &mut moves),
        PieceKind::Bishop => slide_moves(board, from, piece.color, &DIAGONAL, &mut moves),
        PieceKind::Queen => {
            slide_moves(board, from, piece.color, &ORTHOGONAL, &mut moves);
            slide_moves(board, from, piece.color, &DIAGONAL, &mut moves);
        }
    }
    moves
}

/// Pawns advance one step toward the opponent's back rank onto an empty
/// square, may advance two from their starting rank when both squares
/// are empty, and capture onto the two forward diagonals only when an
/// enemy piece stands there. No en passant.
fn pawn_moves(board: &Board, from: Square, color: Color, moves: &mut Vec<Square>) {
    let dir = color.forward();

    if let Some(one) = from.offset(dir, 0) {
        if board.get(one).is_none() {
            moves.push(one);
            if from.row == color.pawn_start_row() {
                if let Some(two) = from.offset(2 * dir, 0) {
                    if board.get(two).is_none() {
                        moves.push(two);
                    }
                }
            }
        }
    }

    for dc in [-1, 1] {
        if let Some(target) = from.offset(dir, dc) {
            if matches!(board.get(target), Some(p) if p.color != color) {
                moves.push(target);
            }
        }
    }
}

/// Fixed-offset movers (knight, king): on-board and not occupied by a
/// friendly piece.
fn step_moves(
    board: &Board,
    from: Square,
    color: Color,
    offsets: &[(i32, i32)],
    moves: &mut Vec<Square>,
) {
    for &(dr, dc) in offsets {
        if let Some(target) = from.offset(dr, dc) {
            if !matches!(board.get(target), Some(p) if p.color == color) {
                moves.push(target);
            }
        }
    }
}

/// Ray casters (rook, bishop, queen): each ray extends while squares
/// are empty, includes the first occupied square only when it holds an
/// enemy piece, and always stops at the first obstruction.
fn slide_moves(
    board: &Board,
    from: Square,
    color: Color,
    directions: &[(i32, i32)],
    moves: &mut Vec<Square>,
) {
    for &(dr, dc) in directions {
        let mut current = from;
        while let Some(target) = current.offset(dr, dc) {
            match board.get(target) {
                None => {
                    moves.push(target);
                    current = target;
                }
                Some(p) => {
                    if p.color != color {
                        moves.push(target);
                    }
                    break;
                }
            }
        }
    }
}

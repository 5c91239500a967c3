// Static evaluation. Scores are from black's point of view: positive favours
// black, negative favours white, since the computer always plays black.

use crate::engine::{Board, Color, Move, Piece, PieceKind, Square, is_in_check, is_in_checkmate};

const CHECK_BONUS: i32 = 50;
const CHECKMATE_BONUS: i32 = 10_000;

pub fn evaluate_board(board: &Board) -> i32 {
    let mut score = 0;
    for (sq, piece) in board.pieces() {
        let material = piece.kind.value();
        score += match piece.color {
            Color::Black => material,
            Color::White => -material,
        };
        score += position_value(piece, sq);
    }

    if is_in_check(board, Color::White) {
        score += CHECK_BONUS;
        if is_in_checkmate(board, Color::White) {
            score += CHECKMATE_BONUS;
        }
    }
    if is_in_check(board, Color::Black) {
        score -= CHECK_BONUS;
        if is_in_checkmate(board, Color::Black) {
            score -= CHECKMATE_BONUS;
        }
    }
    score
}

/// Placement bonus for one piece, already signed by colour.
pub fn position_value(piece: Piece, sq: Square) -> i32 {
    let (row, col) = (sq.row, sq.col);
    let central = (2..=5).contains(&row) && (2..=5).contains(&col);

    let bonus = match piece.kind {
        PieceKind::Pawn => {
            let advancement = match piece.color {
                Color::Black => row as i32,
                Color::White => 7 - row as i32,
            };
            advancement + if (2..=5).contains(&col) { 2 } else { 0 }
        }
        PieceKind::Knight if central => 5,
        PieceKind::Queen if central => 2,
        PieceKind::Bishop if (1..=6).contains(&col) => 3,
        PieceKind::Rook => {
            // Seventh rank from the owner's side.
            let seventh = match piece.color {
                Color::Black => 6,
                Color::White => 1,
            };
            if row == seventh { 10 } else { 0 }
        }
        PieceKind::King => {
            let home_side = match piece.color {
                Color::Black => row <= 1,
                Color::White => row >= 6,
            };
            if home_side && (col <= 2 || col >= 6) { 10 } else { 0 }
        }
        _ => 0,
    };

    match piece.color {
        Color::Black => bonus,
        Color::White => -bonus,
    }
}

/// Cheap one-move heuristic used by the medium tier; assumes black is moving.
pub fn evaluate_move(board: &Board, mv: &Move) -> i32 {
    let mut score = 0;

    if let Some(victim) = board.piece_at(mv.to) {
        score += victim.kind.capture_value();
    }

    let mut scratch = *board;
    scratch.relocate(mv.from, mv.to);
    if is_in_check(&scratch, Color::White) {
        score += 15;
    }
    if is_in_check(&scratch, Color::Black) {
        score -= 20;
    }

    if (3..=4).contains(&mv.to.row) && (3..=4).contains(&mv.to.col) {
        score += 5;
    }

    if board
        .piece_at(mv.from)
        .is_some_and(|p| p.kind == PieceKind::Pawn)
    {
        score += 2 * (mv.to.row as i32 - mv.from.row as i32);
    }

    if mv.is_castling {
        score += 20;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::STARTING_FEN;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn starting_position_is_balanced() {
        assert_eq!(evaluate_board(&Board::from_fen(STARTING_FEN)), 0);
    }

    #[test]
    fn extra_black_material_is_positive() {
        // White is missing the queen.
        let board = Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB1KBNR w KQkq - 0 1");
        assert_eq!(evaluate_board(&board), 9);
    }

    #[test]
    fn position_bonuses_follow_piece_tables() {
        let black = |kind| Piece::new(kind, Color::Black);
        let white = |kind| Piece::new(kind, Color::White);

        assert_eq!(position_value(black(PieceKind::Pawn), sq("d4")), 4 + 2);
        assert_eq!(position_value(white(PieceKind::Pawn), sq("a2")), -1);
        assert_eq!(position_value(black(PieceKind::Knight), sq("e5")), 5);
        assert_eq!(position_value(black(PieceKind::Knight), sq("a8")), 0);
        assert_eq!(position_value(white(PieceKind::Bishop), sq("c1")), -3);
        assert_eq!(position_value(white(PieceKind::Bishop), sq("h3")), 0);
        assert_eq!(position_value(black(PieceKind::Rook), sq("a2")), 10);
        assert_eq!(position_value(white(PieceKind::Rook), sq("a7")), -10);
        assert_eq!(position_value(white(PieceKind::Queen), sq("d4")), -2);
        assert_eq!(position_value(black(PieceKind::King), sq("g8")), 10);
        assert_eq!(position_value(black(PieceKind::King), sq("e8")), 0);
        assert_eq!(position_value(white(PieceKind::King), sq("c1")), -10);
    }

    #[test]
    fn checkmate_dominates_material() {
        let board = Board::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 3");
        assert!(evaluate_board(&board) > CHECKMATE_BONUS);
    }

    #[test]
    fn check_off_turn_scores_check_bonus_only() {
        // Rook attacks the white king on black's move: +5 material, +50 check.
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K2r b - - 0 1");
        assert_eq!(evaluate_board(&board), 5 + CHECK_BONUS);
    }

    #[test]
    fn move_heuristic_rewards_captures_and_checks() {
        let board = Board::from_fen("4k3/8/8/3q4/8/8/3R4/4K3 b - - 0 1");
        let capture = Move::new(sq("d5"), sq("d2"));
        // Rook on d2 (50) plus check on e1 (15); d2 is not central.
        assert_eq!(evaluate_move(&board, &capture), 65);

        let quiet = Move::new(sq("d5"), sq("a5"));
        assert_eq!(evaluate_move(&board, &quiet), 0);
    }

    #[test]
    fn move_heuristic_penalises_self_check() {
        // Moving the pinned bishop exposes the black king.
        let board = Board::from_fen("4k3/4b3/8/8/8/8/8/4RK2 b - - 0 1");
        let mv = Move::new(sq("e7"), sq("d6"));
        assert_eq!(evaluate_move(&board, &mv), -20);
    }

    #[test]
    fn move_heuristic_pawn_and_castle_terms() {
        let board = Board::from_fen("r3k2r/3p4/8/8/8/8/8/4K3 b kq - 0 1");
        let push = Move::new(sq("d7"), sq("d6"));
        assert_eq!(evaluate_move(&board, &push), 2);
        // Double step into the centre picks up the centre bonus too.
        let push = Move::new(sq("d7"), sq("d5"));
        assert_eq!(evaluate_move(&board, &push), 4 + 5);
        let castle = Move::castle(sq("e8"), sq("g8"));
        assert_eq!(evaluate_move(&board, &castle), 20);
    }
}

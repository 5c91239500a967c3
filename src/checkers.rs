// Checkers: board, move rules, capture-first heuristic AI and a game session.
// Red starts at the bottom (rows 5-7) and moves first; the computer plays black.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::engine::{BOARD_SIZE, Square};
use crate::error::{GameError, Result};
use crate::search::Difficulty;
use crate::session::{AiRequest, TapOutcome};

pub const PIECES_PER_SIDE: u8 = 12;
pub const THINKING_TIME: Duration = Duration::from_millis(1000);

const STEP_DIRS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const JUMP_DIRS: [(i32, i32); 4] = [(2, 2), (2, -2), (-2, 2), (-2, -2)];

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Side {
    Red,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Red => Side::Black,
            Side::Black => Side::Red,
        }
    }

    /// Row a man of this side is crowned on.
    pub fn crown_row(self) -> usize {
        match self {
            Side::Red => 0,
            Side::Black => BOARD_SIZE - 1,
        }
    }

    fn forward(self) -> i32 {
        match self {
            Side::Red => -1,
            Side::Black => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Red => write!(f, "Red"),
            Side::Black => write!(f, "Black"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Checker {
    pub side: Side,
    pub king: bool,
}

impl Checker {
    pub const fn man(side: Side) -> Checker {
        Checker { side, king: false }
    }

    pub const fn king(side: Side) -> Checker {
        Checker { side, king: true }
    }

    fn to_char(self) -> char {
        match (self.side, self.king) {
            (Side::Red, false) => 'r',
            (Side::Red, true) => 'R',
            (Side::Black, false) => 'b',
            (Side::Black, true) => 'B',
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CheckersMove {
    pub from: Square,
    pub to: Square,
}

impl CheckersMove {
    pub fn new(from: Square, to: Square) -> Self {
        CheckersMove { from, to }
    }

    pub fn is_jump(&self) -> bool {
        self.from.row.abs_diff(self.to.row) == 2
    }

    /// Square of the captured piece, for jumps.
    pub fn jumped_square(&self) -> Option<Square> {
        self.is_jump().then(|| {
            Square::new(
                (self.from.row + self.to.row) / 2,
                (self.from.col + self.to.col) / 2,
            )
        })
    }
}

impl fmt::Display for CheckersMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.is_jump() { 'x' } else { '-' };
        write!(f, "{}{}{}", self.from, sep, self.to)
    }
}

// ============================================================================
// Board
// ============================================================================

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CheckersBoard {
    squares: [[Option<Checker>; BOARD_SIZE]; BOARD_SIZE],
    side_to_move: Side,
    red_count: u8,
    black_count: u8,
}

impl Default for CheckersBoard {
    fn default() -> Self {
        CheckersBoard::starting_position()
    }
}

impl CheckersBoard {
    pub fn starting_position() -> Self {
        let mut squares = [[None; BOARD_SIZE]; BOARD_SIZE];
        for sq in Square::all().filter(|sq| (sq.row + sq.col) % 2 == 1) {
            squares[sq.row][sq.col] = match sq.row {
                0..=2 => Some(Checker::man(Side::Black)),
                5..=7 => Some(Checker::man(Side::Red)),
                _ => None,
            };
        }
        CheckersBoard {
            squares,
            side_to_move: Side::Red,
            red_count: PIECES_PER_SIDE,
            black_count: PIECES_PER_SIDE,
        }
    }

    /// Builds a position from eight rows of `r`/`R`/`b`/`B`/`.`, top row
    /// first. Counters follow the pieces placed.
    pub fn from_rows(rows: [&str; BOARD_SIZE], side_to_move: Side) -> Self {
        let mut board = CheckersBoard {
            squares: [[None; BOARD_SIZE]; BOARD_SIZE],
            side_to_move,
            red_count: 0,
            black_count: 0,
        };
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().take(BOARD_SIZE).enumerate() {
                let piece = match ch {
                    'r' => Checker::man(Side::Red),
                    'R' => Checker::king(Side::Red),
                    'b' => Checker::man(Side::Black),
                    'B' => Checker::king(Side::Black),
                    _ => continue,
                };
                board.squares[row][col] = Some(piece);
                match piece.side {
                    Side::Red => board.red_count += 1,
                    Side::Black => board.black_count += 1,
                }
            }
        }
        board
    }

    pub fn piece_at(&self, sq: Square) -> Option<Checker> {
        self.squares[sq.row][sq.col]
    }

    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    pub fn red_count(&self) -> u8 {
        self.red_count
    }

    pub fn black_count(&self) -> u8 {
        self.black_count
    }

    pub fn count(&self, side: Side) -> u8 {
        match side {
            Side::Red => self.red_count,
            Side::Black => self.black_count,
        }
    }

    /// Moves a piece without validation: crowns it on the far row, removes a
    /// jumped piece and hands the turn over. Returns the captured piece.
    pub fn move_piece(&mut self, mv: CheckersMove) -> Option<Checker> {
        let mut piece = self.squares[mv.from.row][mv.from.col].take();
        if let Some(p) = piece.as_mut() {
            if mv.to.row == p.side.crown_row() {
                p.king = true;
            }
        }
        self.squares[mv.to.row][mv.to.col] = piece;

        let captured = mv
            .jumped_square()
            .and_then(|jumped| self.squares[jumped.row][jumped.col].take());
        if let Some(victim) = captured {
            match victim.side {
                Side::Red => self.red_count = self.red_count.saturating_sub(1),
                Side::Black => self.black_count = self.black_count.saturating_sub(1),
            }
        }

        self.side_to_move = self.side_to_move.opposite();
        captured
    }

    /// The side that has captured every opposing piece, if any.
    pub fn winner(&self) -> Option<Side> {
        if self.red_count == 0 {
            Some(Side::Black)
        } else if self.black_count == 0 {
            Some(Side::Red)
        } else {
            None
        }
    }
}

impl fmt::Display for CheckersBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIZE {
            write!(f, "{} ", BOARD_SIZE - row)?;
            for col in 0..BOARD_SIZE {
                let c = self
                    .piece_at(Square::new(row, col))
                    .map_or('.', Checker::to_char);
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}

// ============================================================================
// Rules
// ============================================================================

/// One diagonal step onto an empty square (forward only for men), or a jump
/// over an adjacent opposing piece onto the empty square beyond it.
pub fn is_valid_move(board: &CheckersBoard, from: Square, to: Square) -> bool {
    let Some(piece) = board.piece_at(from) else {
        return false;
    };
    if board.piece_at(to).is_some() {
        return false;
    }

    let d_row = to.row as i32 - from.row as i32;
    let d_col = to.col as i32 - from.col as i32;
    if d_row.abs() != d_col.abs() {
        return false;
    }
    if !piece.king && d_row.signum() != piece.side.forward() {
        return false;
    }

    match d_row.abs() {
        1 => true,
        2 => CheckersMove::new(from, to)
            .jumped_square()
            .and_then(|jumped| board.piece_at(jumped))
            .is_some_and(|victim| victim.side != piece.side),
        _ => false,
    }
}

fn moves_in(board: &CheckersBoard, side: Side, dirs: &[(i32, i32)]) -> Vec<CheckersMove> {
    let mut moves = Vec::new();
    for sq in Square::all() {
        if !board.piece_at(sq).is_some_and(|p| p.side == side) {
            continue;
        }
        for &(dr, dc) in dirs {
            if let Some(to) = sq.offset(dr, dc) {
                if is_valid_move(board, sq, to) {
                    moves.push(CheckersMove::new(sq, to));
                }
            }
        }
    }
    moves
}

pub fn jump_moves(board: &CheckersBoard, side: Side) -> Vec<CheckersMove> {
    moves_in(board, side, &JUMP_DIRS)
}

pub fn step_moves(board: &CheckersBoard, side: Side) -> Vec<CheckersMove> {
    moves_in(board, side, &STEP_DIRS)
}

/// Every valid move for `side`: jumps first, then single steps.
pub fn valid_moves(board: &CheckersBoard, side: Side) -> Vec<CheckersMove> {
    let mut moves = jump_moves(board, side);
    moves.extend(step_moves(board, side));
    moves
}

/// Squares the piece on `from` can move to.
pub fn valid_targets(board: &CheckersBoard, from: Square) -> Vec<Square> {
    JUMP_DIRS
        .iter()
        .chain(STEP_DIRS.iter())
        .filter_map(|&(dr, dc)| from.offset(dr, dc))
        .filter(|&to| is_valid_move(board, from, to))
        .collect()
}

// ============================================================================
// AI
// ============================================================================

/// A jump taking a king if one exists, otherwise the first jump found.
pub fn find_best_jump(board: &CheckersBoard, side: Side) -> Option<CheckersMove> {
    let jumps = jump_moves(board, side);
    jumps
        .iter()
        .find(|mv| {
            mv.jumped_square()
                .and_then(|sq| board.piece_at(sq))
                .is_some_and(|victim| victim.king)
        })
        .or_else(|| jumps.first())
        .copied()
}

/// True when no opposing piece could jump the moved piece right afterwards.
pub fn is_safe_move(board: &CheckersBoard, mv: CheckersMove) -> bool {
    let Some(mover) = board.piece_at(mv.from) else {
        return false;
    };
    let mut after = *board;
    after.move_piece(mv);

    jump_moves(&after, mover.side.opposite())
        .iter()
        .all(|reply| reply.jumped_square() != Some(mv.to))
}

/// A safe single step, preferring king moves and moves that crown.
pub fn find_safe_move(board: &CheckersBoard, side: Side) -> Option<CheckersMove> {
    let safe: Vec<CheckersMove> = step_moves(board, side)
        .into_iter()
        .filter(|&mv| is_safe_move(board, mv))
        .collect();
    safe.iter()
        .find(|mv| {
            mv.to.row == side.crown_row() || board.piece_at(mv.from).is_some_and(|p| p.king)
        })
        .or_else(|| safe.first())
        .copied()
}

pub fn find_any_move(board: &CheckersBoard, side: Side) -> Option<CheckersMove> {
    step_moves(board, side).into_iter().next()
}

/// Priority: capture, then a safe step, then any step.
pub fn select_move(board: &CheckersBoard, side: Side) -> Option<CheckersMove> {
    find_best_jump(board, side)
        .or_else(|| find_safe_move(board, side))
        .or_else(|| find_any_move(board, side))
}

// ============================================================================
// Session
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckersState {
    pub board: CheckersBoard,
    pub selected: Option<Square>,
    pub valid_moves: Vec<Square>,
    pub winner: Option<Side>,
    pub difficulty: Difficulty,
    pub game_in_progress: bool,
    pub is_ai_thinking: bool,
}

impl CheckersState {
    fn new(difficulty: Difficulty) -> Self {
        CheckersState {
            board: CheckersBoard::starting_position(),
            selected: None,
            valid_moves: Vec::new(),
            winner: None,
            difficulty: checkers_difficulty(difficulty),
            game_in_progress: false,
            is_ai_thinking: false,
        }
    }

    pub fn is_red_turn(&self) -> bool {
        self.board.side_to_move() == Side::Red
    }
}

/// Checkers only knows "no AI" and the medium heuristic.
fn checkers_difficulty(difficulty: Difficulty) -> Difficulty {
    if difficulty.is_ai() {
        Difficulty::Medium
    } else {
        Difficulty::None
    }
}

pub struct CheckersGame {
    state: CheckersState,
    generation: u64,
    think_delay: Option<Duration>,
}

impl CheckersGame {
    pub const AI_SIDE: Side = Side::Black;

    pub fn new(difficulty: Difficulty) -> Self {
        CheckersGame {
            state: CheckersState::new(difficulty),
            generation: 0,
            think_delay: None,
        }
    }

    pub fn with_think_delay(mut self, delay: Option<Duration>) -> Self {
        self.think_delay = delay;
        self
    }

    pub fn state(&self) -> &CheckersState {
        &self.state
    }

    pub fn board(&self) -> &CheckersBoard {
        &self.state.board
    }

    pub fn snapshot(&self) -> CheckersState {
        self.state.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn start_new_game(&mut self) {
        self.generation += 1;
        self.state = CheckersState {
            game_in_progress: true,
            ..CheckersState::new(self.state.difficulty)
        };
        info!(generation = self.generation, difficulty = %self.state.difficulty, "checkers game started");
    }

    pub fn reset(&mut self) {
        self.generation += 1;
        self.state.game_in_progress = false;
        self.state.is_ai_thinking = false;
        self.state.selected = None;
        self.state.valid_moves.clear();
        info!(generation = self.generation, "checkers game reset");
    }

    /// Returns true when the change hands the move to the computer.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        self.state.difficulty = checkers_difficulty(difficulty);
        self.is_ai_turn()
    }

    pub fn is_ai_turn(&self) -> bool {
        self.state.game_in_progress
            && self.state.winner.is_none()
            && self.state.difficulty.is_ai()
            && self.state.board.side_to_move() == Self::AI_SIDE
    }

    pub fn handle_tap(&mut self, sq: Square) -> TapOutcome<CheckersMove> {
        if self.state.winner.is_some() || !self.state.game_in_progress {
            return TapOutcome::Ignored;
        }
        if self.is_ai_turn() || self.state.is_ai_thinking {
            return TapOutcome::Ignored;
        }

        if let Some(selected) = self.state.selected {
            if selected == sq {
                self.state.selected = None;
                self.state.valid_moves.clear();
                return TapOutcome::Deselected;
            }
            match self.try_move(selected, sq) {
                Ok(mv) => return TapOutcome::Moved(mv),
                Err(err) => trace!(%err, "tap did not move"),
            }
        }

        let side = self.state.board.side_to_move();
        let selectable = self.state.board.piece_at(sq).is_some_and(|p| {
            p.side == side && (side != Self::AI_SIDE || !self.state.difficulty.is_ai())
        });
        if selectable {
            self.state.selected = Some(sq);
            self.state.valid_moves = valid_targets(&self.state.board, sq);
            return TapOutcome::Selected(self.state.valid_moves.clone());
        }
        TapOutcome::Ignored
    }

    pub fn try_move(&mut self, from: Square, to: Square) -> Result<CheckersMove> {
        if self.state.winner.is_some() || !self.state.game_in_progress {
            return Err(GameError::GameOver);
        }
        if self.is_ai_turn() || self.state.is_ai_thinking {
            return Err(GameError::AiTurn);
        }
        let piece = self
            .state
            .board
            .piece_at(from)
            .ok_or(GameError::NoPieceAtSquare(from))?;
        if piece.side != self.state.board.side_to_move() {
            return Err(GameError::NotYourTurn(from));
        }
        if !is_valid_move(&self.state.board, from, to) {
            trace!(%from, %to, "illegal checkers move rejected");
            return Err(GameError::IllegalMove { from, to });
        }

        let mv = CheckersMove::new(from, to);
        self.apply(mv);
        Ok(mv)
    }

    fn apply(&mut self, mv: CheckersMove) {
        self.state.board.move_piece(mv);
        self.state.selected = None;
        self.state.valid_moves.clear();
        self.check_for_winner();
    }

    pub fn check_for_winner(&mut self) {
        if let Some(winner) = self.state.board.winner() {
            self.declare_winner(winner);
        }
    }

    fn declare_winner(&mut self, winner: Side) {
        self.state.winner = Some(winner);
        self.state.game_in_progress = false;
        info!(%winner, red = self.state.board.red_count(), black = self.state.board.black_count(), "checkers game over");
    }

    pub fn begin_ai_turn(&mut self) -> Option<AiRequest<CheckersMove>> {
        if !self.is_ai_turn() || self.state.is_ai_thinking {
            return None;
        }
        self.state.is_ai_thinking = true;
        self.state.selected = None;
        self.state.valid_moves.clear();

        let board = self.state.board;
        let delay = self.think_delay.unwrap_or(THINKING_TIME);
        debug!(generation = self.generation, ?delay, "checkers ai turn requested");
        Some(AiRequest::new(self.generation, delay, move |_stop| {
            select_move(&board, Self::AI_SIDE)
        }))
    }

    /// Applies the computer's answer. With no move available the human wins.
    pub fn complete_ai_turn(
        &mut self,
        generation: u64,
        mv: Option<CheckersMove>,
    ) -> Option<CheckersMove> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "discarding stale checkers ai result");
            return None;
        }
        self.state.is_ai_thinking = false;

        let Some(mv) = mv else {
            self.declare_winner(Self::AI_SIDE.opposite());
            return None;
        };
        let owned = self
            .state
            .board
            .piece_at(mv.from)
            .is_some_and(|p| p.side == Self::AI_SIDE);
        if !owned || !is_valid_move(&self.state.board, mv.from, mv.to) {
            warn!(%mv, "ai proposed an invalid checkers move");
            return None;
        }
        self.apply(mv);
        info!(%mv, "checkers ai move applied");
        Some(mv)
    }

    pub fn play_ai_move(&mut self) -> Option<CheckersMove> {
        let request = self.begin_ai_turn()?;
        let generation = request.generation;
        let mv = request.run(Arc::new(AtomicBool::new(false)));
        self.complete_ai_turn(generation, mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    const EMPTY: &str = "........";

    #[test]
    fn starting_layout() {
        let board = CheckersBoard::starting_position();
        assert_eq!(board.red_count(), 12);
        assert_eq!(board.black_count(), 12);
        assert_eq!(board.side_to_move(), Side::Red);
        assert_eq!(board.piece_at(Square::new(0, 1)), Some(Checker::man(Side::Black)));
        assert_eq!(board.piece_at(Square::new(7, 0)), Some(Checker::man(Side::Red)));
        assert_eq!(board.piece_at(Square::new(0, 0)), None);
        assert_eq!(step_moves(&board, Side::Red).len(), 7);
        assert!(jump_moves(&board, Side::Red).is_empty());
    }

    #[test]
    fn men_move_forward_only() {
        let board = CheckersBoard::from_rows(
            [EMPTY, EMPTY, EMPTY, "...b....", "....r...", EMPTY, EMPTY, EMPTY],
            Side::Red,
        );
        // Red man on e4 (row 4, col 4).
        assert!(is_valid_move(&board, Square::new(4, 4), Square::new(3, 5)));
        assert!(!is_valid_move(&board, Square::new(4, 4), Square::new(5, 5)));
        assert!(!is_valid_move(&board, Square::new(4, 4), Square::new(4, 5)));
        assert!(!is_valid_move(&board, Square::new(4, 4), Square::new(3, 3)));
        // Empty source is never valid.
        assert!(!is_valid_move(&board, Square::new(5, 5), Square::new(4, 6)));
    }

    #[test]
    fn kings_move_both_ways() {
        let board = CheckersBoard::from_rows(
            [EMPTY, EMPTY, EMPTY, EMPTY, "....R...", EMPTY, EMPTY, EMPTY],
            Side::Red,
        );
        assert_eq!(valid_targets(&board, Square::new(4, 4)).len(), 4);
    }

    #[test]
    fn black_jump_captures_red() {
        let mut board = CheckersBoard::from_rows(
            [EMPTY, EMPTY, "..b.....", "...r....", EMPTY, EMPTY, "r.......", EMPTY],
            Side::Black,
        );
        let jump = CheckersMove::new(Square::new(2, 2), Square::new(4, 4));
        assert!(jump_moves(&board, Side::Black).contains(&jump));
        assert!(is_valid_move(&board, jump.from, jump.to));

        let red_before = board.red_count();
        let captured = board.move_piece(jump);
        assert_eq!(captured, Some(Checker::man(Side::Red)));
        assert_eq!(board.red_count(), red_before - 1);
        assert_eq!(board.piece_at(Square::new(3, 3)), None);
        assert_eq!(board.piece_at(Square::new(4, 4)), Some(Checker::man(Side::Black)));
        assert_eq!(board.side_to_move(), Side::Red);
    }

    #[test]
    fn cannot_jump_own_piece() {
        let board = CheckersBoard::from_rows(
            [EMPTY, EMPTY, "..b.....", "...b....", EMPTY, EMPTY, EMPTY, EMPTY],
            Side::Black,
        );
        assert!(!is_valid_move(&board, Square::new(2, 2), Square::new(4, 4)));
    }

    #[test]
    fn reaching_far_row_crowns() {
        let mut board = CheckersBoard::from_rows(
            [EMPTY, "..r.....", EMPTY, EMPTY, EMPTY, EMPTY, "....b...", EMPTY],
            Side::Red,
        );
        board.move_piece(CheckersMove::new(Square::new(1, 2), Square::new(0, 1)));
        assert_eq!(board.piece_at(Square::new(0, 1)), Some(Checker::king(Side::Red)));
        board.move_piece(CheckersMove::new(Square::new(6, 4), Square::new(7, 5)));
        assert_eq!(board.piece_at(Square::new(7, 5)), Some(Checker::king(Side::Black)));
    }

    #[test]
    fn winner_when_side_is_wiped_out() {
        let mut board = CheckersBoard::from_rows(
            [EMPTY, EMPTY, "..b.....", "...r....", EMPTY, EMPTY, EMPTY, EMPTY],
            Side::Black,
        );
        assert_eq!(board.winner(), None);
        board.move_piece(CheckersMove::new(Square::new(2, 2), Square::new(4, 4)));
        assert_eq!(board.winner(), Some(Side::Black));
    }

    #[test]
    fn ai_prefers_king_capture() {
        let board = CheckersBoard::from_rows(
            [EMPTY, "b...b...", ".r...R..", EMPTY, EMPTY, EMPTY, "r.......", EMPTY],
            Side::Black,
        );
        let mv = select_move(&board, Side::Black).unwrap();
        assert_eq!(mv.jumped_square(), Some(Square::new(2, 5)));
    }

    #[test]
    fn ai_avoids_unsafe_steps() {
        // Stepping to d5 (row 3, col 3) lets the red man on e4 jump it.
        let board = CheckersBoard::from_rows(
            [EMPTY, EMPTY, "..b.....", EMPTY, "....r...", EMPTY, EMPTY, EMPTY],
            Side::Black,
        );
        let unsafe_step = CheckersMove::new(Square::new(2, 2), Square::new(3, 3));
        let safe_step = CheckersMove::new(Square::new(2, 2), Square::new(3, 1));
        assert!(!is_safe_move(&board, unsafe_step));
        assert!(is_safe_move(&board, safe_step));
        assert_eq!(select_move(&board, Side::Black), Some(safe_step));
    }

    #[test]
    fn only_legal_jumps_count_as_threats() {
        // The red man above d5 could only take it by jumping backwards.
        let board = CheckersBoard::from_rows(
            [EMPTY, EMPTY, "..b.r...", EMPTY, EMPTY, EMPTY, EMPTY, EMPTY],
            Side::Black,
        );
        let step = CheckersMove::new(Square::new(2, 2), Square::new(3, 3));
        assert!(is_safe_move(&board, step));

        let board = CheckersBoard::from_rows(
            [EMPTY, EMPTY, "..b.R...", EMPTY, EMPTY, EMPTY, EMPTY, EMPTY],
            Side::Black,
        );
        assert!(!is_safe_move(&board, step));
    }

    #[test]
    fn ai_prefers_crowning_step() {
        let board = CheckersBoard::from_rows(
            [EMPTY, EMPTY, "b.......", EMPTY, EMPTY, EMPTY, "....b...", "r......."],
            Side::Black,
        );
        let mv = find_safe_move(&board, Side::Black).unwrap();
        assert_eq!(mv.to.row, 7);
    }

    #[test]
    fn session_tap_flow_and_ai_reply() {
        let mut game = CheckersGame::new(Difficulty::Hard);
        assert_eq!(game.state().difficulty, Difficulty::Medium);
        game.start_new_game();

        match game.handle_tap(sq("c3")) {
            TapOutcome::Selected(targets) => assert_eq!(targets.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            game.handle_tap(sq("d4")),
            TapOutcome::Moved(CheckersMove::new(sq("c3"), sq("d4")))
        );
        assert!(game.is_ai_turn());
        assert_eq!(game.handle_tap(sq("b6")), TapOutcome::Ignored);

        let reply = game.play_ai_move().unwrap();
        assert_eq!(game.board().piece_at(reply.to).map(|p| p.side), Some(Side::Black));
        assert!(game.state().is_red_turn());
    }

    #[test]
    fn ai_without_moves_concedes() {
        let mut game = CheckersGame::new(Difficulty::Medium);
        game.start_new_game();
        game.state.board = CheckersBoard::from_rows(
            [EMPTY, EMPTY, EMPTY, EMPTY, EMPTY, EMPTY, "r.......", ".b......"],
            Side::Black,
        );
        assert!(game.is_ai_turn());
        assert_eq!(game.play_ai_move(), None);
        assert_eq!(game.state().winner, Some(Side::Red));
        assert!(!game.state().game_in_progress);
    }

    #[test]
    fn stale_result_after_reset() {
        let mut game = CheckersGame::new(Difficulty::Medium);
        game.start_new_game();
        game.try_move(sq("c3"), sq("d4")).unwrap();
        let request = game.begin_ai_turn().unwrap();
        let generation = request.generation;
        let mv = request.run(Arc::new(AtomicBool::new(false)));
        game.reset();
        assert_eq!(game.complete_ai_turn(generation, mv), None);
        assert_eq!(game.state().winner, None);
    }
}

//! Chess game session: owns the live board and its status flags, handles the
//! two-phase tap gesture and hands AI work off as self-contained requests.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::engine::{
    Board, Color, Move, Piece, PieceKind, Square, can_castle, is_in_check, is_in_checkmate,
    is_stalemate, is_valid_move, legal_moves, valid_targets,
};
use crate::error::{GameError, Result};
use crate::search::{Difficulty, SearchLimits, select_ai_move};

/// The computer always plays black.
pub const AI_COLOR: Color = Color::Black;

/// What a tap did to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TapOutcome<M> {
    Ignored,
    Selected(Vec<Square>),
    Deselected,
    Moved(M),
}

type AiTask<M> = Box<dyn FnOnce(Arc<AtomicBool>) -> Option<M> + Send>;

/// A computer move to be computed away from the session. The task only sees a
/// copy of the position; its result goes back through `complete_ai_turn`
/// together with `generation`.
pub struct AiRequest<M> {
    pub generation: u64,
    pub delay: Duration,
    task: AiTask<M>,
}

impl<M> AiRequest<M> {
    pub fn new(
        generation: u64,
        delay: Duration,
        task: impl FnOnce(Arc<AtomicBool>) -> Option<M> + Send + 'static,
    ) -> Self {
        AiRequest {
            generation,
            delay,
            task: Box::new(task),
        }
    }

    pub fn run(self, stop: Arc<AtomicBool>) -> Option<M> {
        (self.task)(stop)
    }
}

impl<M> fmt::Debug for AiRequest<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiRequest")
            .field("generation", &self.generation)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Game State
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub winner: Option<Color>,
    pub white_in_check: bool,
    pub black_in_check: bool,
    pub white_in_checkmate: bool,
    pub black_in_checkmate: bool,
    pub stalemate: bool,
    pub difficulty: Difficulty,
    pub game_in_progress: bool,
    pub selected: Option<Square>,
    pub valid_moves: Vec<Square>,
    pub is_ai_thinking: bool,
    pub history: Vec<Move>,
}

impl GameState {
    fn new(difficulty: Difficulty) -> Self {
        GameState {
            board: Board::starting_position(),
            winner: None,
            white_in_check: false,
            black_in_check: false,
            white_in_checkmate: false,
            black_in_checkmate: false,
            stalemate: false,
            difficulty,
            game_in_progress: false,
            selected: None,
            valid_moves: Vec::new(),
            is_ai_thinking: false,
            history: Vec::new(),
        }
    }

    pub fn is_white_turn(&self) -> bool {
        self.board.side_to_move() == Color::White
    }

    pub fn search_depth(&self) -> i32 {
        self.difficulty.search_depth()
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some() || self.stalemate
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().copied()
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct GameSession {
    state: GameState,
    generation: u64,
    rng: StdRng,
    time_limit: Option<Duration>,
    think_delay: Option<Duration>,
}

impl GameSession {
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_rng(difficulty, StdRng::from_entropy())
    }

    pub fn with_seed(difficulty: Difficulty, seed: u64) -> Self {
        Self::with_rng(difficulty, StdRng::seed_from_u64(seed))
    }

    fn with_rng(difficulty: Difficulty, rng: StdRng) -> Self {
        GameSession {
            state: GameState::new(difficulty),
            generation: 0,
            rng,
            time_limit: None,
            think_delay: None,
        }
    }

    /// Caps the hard tier's search time.
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    /// Overrides the per-difficulty thinking delay.
    pub fn with_think_delay(mut self, delay: Option<Duration>) -> Self {
        self.think_delay = delay;
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn board(&self) -> &Board {
        &self.state.board
    }

    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn difficulty(&self) -> Difficulty {
        self.state.difficulty
    }

    pub fn start_new_game(&mut self) {
        self.generation += 1;
        self.state = GameState {
            game_in_progress: true,
            ..GameState::new(self.state.difficulty)
        };
        info!(generation = self.generation, difficulty = %self.state.difficulty, "chess game started");
    }

    /// Ends the current game. Any AI request still in flight becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state.game_in_progress = false;
        self.state.is_ai_thinking = false;
        self.clear_selection();
        info!(generation = self.generation, "chess game reset");
    }

    /// Returns true when the change hands the move to the computer.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        self.state.difficulty = difficulty;
        self.is_ai_turn()
    }

    pub fn is_ai_turn(&self) -> bool {
        self.state.game_in_progress
            && !self.state.is_over()
            && self.state.difficulty.is_ai()
            && self.state.board.side_to_move() == AI_COLOR
    }

    fn clear_selection(&mut self) {
        self.state.selected = None;
        self.state.valid_moves.clear();
    }

    // ------------------------------------------------------------------------
    // Human input
    // ------------------------------------------------------------------------

    /// Two-phase gesture: tap an own piece to select it, then tap a target.
    pub fn handle_tap(&mut self, sq: Square) -> TapOutcome<Move> {
        if self.state.is_over() || !self.state.game_in_progress {
            return TapOutcome::Ignored;
        }
        if self.is_ai_turn() || self.state.is_ai_thinking {
            return TapOutcome::Ignored;
        }

        if let Some(selected) = self.state.selected {
            if selected == sq {
                self.clear_selection();
                return TapOutcome::Deselected;
            }
            match self.try_move(selected, sq) {
                Ok(mv) => return TapOutcome::Moved(mv),
                Err(err) => trace!(%err, "tap did not move"),
            }
        }

        let side = self.state.board.side_to_move();
        let selectable = self
            .state
            .board
            .piece_at(sq)
            .is_some_and(|p| p.color == side && (side != AI_COLOR || !self.state.difficulty.is_ai()));
        if selectable {
            self.state.selected = Some(sq);
            self.state.valid_moves = valid_targets(&self.state.board, sq);
            return TapOutcome::Selected(self.state.valid_moves.clone());
        }
        TapOutcome::Ignored
    }

    /// Plays `from -> to` for the side to move. A king moved two files
    /// toward an unmoved rook castles.
    pub fn try_move(&mut self, from: Square, to: Square) -> Result<Move> {
        if self.state.is_over() || !self.state.game_in_progress {
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
        if piece.color != self.state.board.side_to_move() {
            return Err(GameError::NotYourTurn(from));
        }

        if piece.is_unmoved(PieceKind::King)
            && from.row == to.row
            && from.col.abs_diff(to.col) == 2
        {
            let castle = Move::castle(from, to);
            let rook = castle.rook_square();
            if can_castle(&self.state.board, from, rook) {
                self.perform_castle(from, rook);
                self.clear_selection();
                return Ok(castle);
            }
        }

        if !is_valid_move(&self.state.board, from, to) {
            trace!(%from, %to, "illegal move rejected");
            return Err(GameError::IllegalMove { from, to });
        }
        self.apply_move(from, to);
        self.clear_selection();
        Ok(Move::new(from, to))
    }

    // ------------------------------------------------------------------------
    // Executor
    // ------------------------------------------------------------------------

    /// Applies a move without validation, then refreshes the status flags.
    pub fn apply_move(&mut self, from: Square, to: Square) -> Option<Piece> {
        let mover = self.state.board.side_to_move();
        let captured = self.state.board.make_move(Move::new(from, to));
        self.state.history.push(Move::new(from, to));

        if let Some(victim) = captured.filter(|p| p.kind == PieceKind::King) {
            warn!(%from, %to, victim = %victim.color, "king captured outside the legal move filter");
            self.state.winner = Some(mover);
        }
        self.refresh_status();
        captured
    }

    pub fn perform_castle(&mut self, king: Square, rook: Square) {
        self.state.board.perform_castle(king, rook);
        let step: i32 = if rook.col > king.col { 2 } else { -2 };
        if let Some(to) = king.offset(0, step) {
            self.state.history.push(Move::castle(king, to));
        }
        self.refresh_status();
    }

    pub fn refresh_status(&mut self) {
        let board = &self.state.board;
        self.state.white_in_check = is_in_check(board, Color::White);
        self.state.black_in_check = is_in_check(board, Color::Black);
        self.state.white_in_checkmate =
            self.state.white_in_check && is_in_checkmate(board, Color::White);
        self.state.black_in_checkmate =
            self.state.black_in_check && is_in_checkmate(board, Color::Black);

        if self.state.white_in_checkmate {
            self.state.winner = Some(Color::Black);
        } else if self.state.black_in_checkmate {
            self.state.winner = Some(Color::White);
        }
        self.state.stalemate =
            self.state.winner.is_none() && is_stalemate(board, board.side_to_move());

        if let Some(winner) = self.state.winner {
            info!(%winner, moves = self.state.history.len(), "checkmate");
        } else if self.state.stalemate {
            info!(moves = self.state.history.len(), "stalemate");
        }
    }

    // ------------------------------------------------------------------------
    // Computer turn
    // ------------------------------------------------------------------------

    /// Marks the AI as thinking and packages its search for the caller to
    /// run, or returns `None` when it is not the computer's turn.
    pub fn begin_ai_turn(&mut self) -> Option<AiRequest<Move>> {
        if !self.is_ai_turn() || self.state.is_ai_thinking {
            return None;
        }
        self.state.is_ai_thinking = true;
        self.clear_selection();

        let board = self.state.board;
        let difficulty = self.state.difficulty;
        let time_limit = self.time_limit;
        let mut rng = StdRng::seed_from_u64(self.rng.next_u64());
        let delay = self.think_delay.unwrap_or_else(|| difficulty.thinking_time());
        debug!(generation = self.generation, %difficulty, ?delay, "ai turn requested");

        Some(AiRequest::new(self.generation, delay, move |stop| {
            let limits = SearchLimits::default()
                .with_time_limit(time_limit)
                .with_stop(stop);
            select_ai_move(&board, difficulty, &limits, &mut rng)
        }))
    }

    /// Applies the computer's answer to the request tagged `generation`.
    /// Results from an earlier game are dropped.
    pub fn complete_ai_turn(&mut self, generation: u64, mv: Option<Move>) -> Option<Move> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "discarding stale ai result");
            return None;
        }
        self.state.is_ai_thinking = false;

        let mv = mv?;
        let legal = legal_moves(&self.state.board, AI_COLOR)
            .iter()
            .any(|m| m.same_squares(&mv) && m.is_castling == mv.is_castling);
        if !legal {
            warn!(%mv, "ai proposed a move that is not legal here");
            return None;
        }

        if mv.is_castling {
            self.perform_castle(mv.from, mv.rook_square());
        } else {
            self.apply_move(mv.from, mv.to);
        }
        info!(%mv, "ai move applied");
        Some(mv)
    }

    /// Computes and applies the computer's move on the calling thread,
    /// skipping the thinking delay.
    pub fn play_ai_move(&mut self) -> Option<Move> {
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

    fn started(difficulty: Difficulty) -> GameSession {
        let mut session = GameSession::with_seed(difficulty, 3);
        session.start_new_game();
        session
    }

    #[test]
    fn new_game_state() {
        let session = started(Difficulty::Medium);
        let state = session.state();
        assert!(state.game_in_progress);
        assert!(state.is_white_turn());
        assert_eq!(state.winner, None);
        assert_eq!(state.search_depth(), 2);
        assert!(!session.is_ai_turn());
    }

    #[test]
    fn taps_before_start_are_ignored() {
        let mut session = GameSession::with_seed(Difficulty::None, 1);
        assert_eq!(session.handle_tap(sq("e2")), TapOutcome::Ignored);
    }

    #[test]
    fn select_deselect_and_move() {
        let mut session = started(Difficulty::None);
        match session.handle_tap(sq("e2")) {
            TapOutcome::Selected(targets) => {
                assert_eq!(targets.len(), 2);
                assert!(targets.contains(&sq("e4")));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(session.handle_tap(sq("e2")), TapOutcome::Deselected);
        assert_eq!(session.state().selected, None);

        session.handle_tap(sq("e2"));
        // Illegal target keeps the selection.
        assert_eq!(session.handle_tap(sq("e5")), TapOutcome::Ignored);
        assert_eq!(session.state().selected, Some(sq("e2")));

        assert_eq!(
            session.handle_tap(sq("e4")),
            TapOutcome::Moved(Move::new(sq("e2"), sq("e4")))
        );
        assert!(!session.state().is_white_turn());
        assert!(session.state().valid_moves.is_empty());
    }

    #[test]
    fn tapping_another_own_piece_reselects() {
        let mut session = started(Difficulty::None);
        session.handle_tap(sq("e2"));
        assert!(matches!(session.handle_tap(sq("g1")), TapOutcome::Selected(_)));
        assert_eq!(session.state().selected, Some(sq("g1")));
    }

    #[test]
    fn try_move_reports_reasons() {
        let mut session = started(Difficulty::None);
        assert_eq!(
            session.try_move(sq("e4"), sq("e5")),
            Err(GameError::NoPieceAtSquare(sq("e4")))
        );
        assert_eq!(
            session.try_move(sq("e7"), sq("e5")),
            Err(GameError::NotYourTurn(sq("e7")))
        );
        assert_eq!(
            session.try_move(sq("e2"), sq("e5")),
            Err(GameError::IllegalMove {
                from: sq("e2"),
                to: sq("e5")
            })
        );
        assert_eq!(*session.board(), Board::starting_position());
    }

    #[test]
    fn fools_mate_ends_the_game() {
        let mut session = started(Difficulty::None);
        for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
            session.try_move(sq(from), sq(to)).unwrap();
        }
        let state = session.snapshot();
        assert!(state.white_in_check);
        assert!(state.white_in_checkmate);
        assert_eq!(state.winner, Some(Color::Black));
        assert!(state.is_over());
        assert_eq!(session.try_move(sq("a2"), sq("a3")), Err(GameError::GameOver));
        assert_eq!(session.handle_tap(sq("a2")), TapOutcome::Ignored);
    }

    #[test]
    fn castling_through_session() {
        let mut session = started(Difficulty::None);
        for (from, to) in [
            ("g1", "f3"),
            ("b8", "c6"),
            ("e2", "e3"),
            ("c6", "b8"),
            ("f1", "e2"),
            ("b8", "c6"),
        ] {
            session.try_move(sq(from), sq(to)).unwrap();
        }
        let mv = session.try_move(sq("e1"), sq("g1")).unwrap();
        assert!(mv.is_castling);
        let board = session.board();
        assert_eq!(board.piece_at(sq("g1")).map(|p| p.kind), Some(PieceKind::King));
        assert_eq!(board.piece_at(sq("f1")).map(|p| p.kind), Some(PieceKind::Rook));
        assert_eq!(session.state().last_move(), Some(mv));
    }

    #[test]
    fn ai_turn_blocks_human_and_plays_black() {
        let mut session = started(Difficulty::Easy);
        session.try_move(sq("e2"), sq("e4")).unwrap();
        assert!(session.is_ai_turn());
        assert_eq!(session.try_move(sq("e7"), sq("e5")), Err(GameError::AiTurn));
        assert_eq!(session.handle_tap(sq("e7")), TapOutcome::Ignored);

        let mv = session.play_ai_move().unwrap();
        assert_eq!(session.board().piece_at(mv.to).map(|p| p.color), Some(Color::Black));
        assert!(session.state().is_white_turn());
        assert!(!session.state().is_ai_thinking);
    }

    #[test]
    fn stale_ai_result_is_discarded() {
        let mut session = started(Difficulty::Medium);
        session.try_move(sq("d2"), sq("d4")).unwrap();
        let request = session.begin_ai_turn().unwrap();
        assert!(session.state().is_ai_thinking);
        assert!(session.begin_ai_turn().is_none());

        let generation = request.generation;
        let mv = request.run(Arc::new(AtomicBool::new(false)));
        assert!(mv.is_some());

        session.start_new_game();
        assert_eq!(session.complete_ai_turn(generation, mv), None);
        assert_eq!(*session.board(), Board::starting_position());
    }

    #[test]
    fn enabling_ai_on_blacks_turn_hands_over() {
        let mut session = started(Difficulty::None);
        session.try_move(sq("e2"), sq("e4")).unwrap();
        assert!(!session.is_ai_turn());
        assert!(session.set_difficulty(Difficulty::Hard));
        assert_eq!(session.difficulty(), Difficulty::Hard);
    }

    #[test]
    fn reset_stops_play() {
        let mut session = started(Difficulty::None);
        let before = session.generation();
        session.reset();
        assert!(session.generation() > before);
        assert!(!session.state().game_in_progress);
        assert_eq!(session.try_move(sq("e2"), sq("e4")), Err(GameError::GameOver));
    }

    #[test]
    fn promotion_through_session() {
        let mut session = started(Difficulty::None);
        let mut board = Board::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1");
        board.set_side_to_move(Color::White);
        session.state.board = board;
        session.try_move(sq("a7"), sq("a8")).unwrap();
        let queen = session.board().piece_at(sq("a8")).unwrap();
        assert_eq!(queen.kind, PieceKind::Queen);
        assert!(queen.has_moved);
        // The new queen checks along the back rank.
        assert!(session.state().black_in_check);
    }

    #[test]
    fn stalemate_is_a_draw() {
        let mut session = started(Difficulty::None);
        session.state.board = Board::from_fen("k7/8/1QK5/8/8/8/8/8 w - - 0 1");
        session.try_move(sq("b6"), sq("c7")).unwrap();
        let state = session.state();
        assert!(state.stalemate);
        assert_eq!(state.winner, None);
        assert!(state.is_over());
    }
}

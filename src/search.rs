// Move selection for the computer player:
// - Difficulty tiers (random / heuristic / minimax)
// - Minimax with alpha-beta pruning over board copies
// - Optional iterative deepening under a wall-clock limit or external stop flag

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::engine::{Board, Color, Move, is_in_check, legal_moves};
use crate::error::ParseError;
use crate::evaluation::{evaluate_board, evaluate_move};

// =====================
// Difficulty
// =====================

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub enum Difficulty {
    /// Human plays both sides.
    None,
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::None,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
    ];

    /// Plies searched by minimax. Only the hard tier actually builds a tree.
    pub fn search_depth(self) -> i32 {
        match self {
            Difficulty::None => 0,
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn thinking_time(self) -> Duration {
        match self {
            Difficulty::None => Duration::ZERO,
            Difficulty::Easy => Duration::from_millis(500),
            Difficulty::Medium => Duration::from_millis(1000),
            Difficulty::Hard => Duration::from_millis(1500),
        }
    }

    pub fn is_ai(self) -> bool {
        self != Difficulty::None
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::None => "none",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" | "0" => Ok(Difficulty::None),
            "easy" | "1" => Ok(Difficulty::Easy),
            "medium" | "2" => Ok(Difficulty::Medium),
            "hard" | "3" => Ok(Difficulty::Hard),
            _ => Err(ParseError::UnknownDifficulty(s.to_string())),
        }
    }
}

// =====================
// Search
// =====================

#[derive(Clone, Debug, Default)]
pub struct SearchLimits {
    pub depth: i32,
    /// Wall-clock cap. The first ply is always completed.
    pub time_limit: Option<Duration>,
    pub stop: Option<Arc<AtomicBool>>,
}

impl SearchLimits {
    pub fn depth(depth: i32) -> Self {
        SearchLimits {
            depth,
            ..Default::default()
        }
    }

    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_stop(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth_reached: i32,
    pub nodes: u64,
    pub elapsed: Duration,
}

struct SearchInfo {
    nodes: u64,
    start: Instant,
    time_limit: Option<Duration>,
    deadline_armed: bool,
    stop: Option<Arc<AtomicBool>>,
    aborted: bool,
}

impl SearchInfo {
    fn new(limits: &SearchLimits) -> Self {
        SearchInfo {
            nodes: 0,
            start: Instant::now(),
            time_limit: limits.time_limit,
            deadline_armed: false,
            stop: limits.stop.clone(),
            aborted: false,
        }
    }

    fn unbounded() -> Self {
        SearchInfo::new(&SearchLimits::default())
    }

    fn should_stop(&mut self) -> bool {
        if self.aborted {
            return true;
        }
        let stopped = self.stop.as_ref().is_some_and(|s| s.load(Ordering::Relaxed));
        let timed_out = self.deadline_armed
            && self
                .time_limit
                .is_some_and(|limit| self.start.elapsed() >= limit);
        self.aborted = stopped || timed_out;
        self.aborted
    }
}

fn side_for(maximizing: bool) -> Color {
    if maximizing { Color::Black } else { Color::White }
}

/// Minimax with alpha-beta pruning. The maximizing side is black.
pub fn minimax(board: &Board, depth: i32, alpha: i32, beta: i32, maximizing: bool) -> i32 {
    alpha_beta(board, depth, alpha, beta, maximizing, &mut SearchInfo::unbounded())
}

fn alpha_beta(
    board: &Board,
    depth: i32,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    info: &mut SearchInfo,
) -> i32 {
    info.nodes += 1;
    if depth <= 0 {
        return evaluate_board(board);
    }

    let color = side_for(maximizing);
    let mut node = *board;
    node.set_side_to_move(color);

    let moves = legal_moves(&node, color);
    if moves.is_empty() {
        // Faster mates score higher.
        return if !is_in_check(&node, color) {
            0
        } else if maximizing {
            -1000 - depth
        } else {
            1000 + depth
        };
    }

    if maximizing {
        let mut max_eval = i32::MIN;
        for mv in moves {
            if info.should_stop() {
                break;
            }
            let eval = alpha_beta(&node.with_move(mv), depth - 1, alpha, beta, false, info);
            max_eval = max_eval.max(eval);
            alpha = alpha.max(eval);
            if beta <= alpha {
                break;
            }
        }
        max_eval
    } else {
        let mut min_eval = i32::MAX;
        for mv in moves {
            if info.should_stop() {
                break;
            }
            let eval = alpha_beta(&node.with_move(mv), depth - 1, alpha, beta, true, info);
            min_eval = min_eval.min(eval);
            beta = beta.min(eval);
            if beta <= alpha {
                break;
            }
        }
        min_eval
    }
}

// Each root move gets a full window; the first best score wins ties.
fn search_root(board: &Board, moves: &[Move], depth: i32, info: &mut SearchInfo) -> Option<(Move, i32)> {
    let maximizing = board.side_to_move() == Color::Black;
    let mut best: Option<(Move, i32)> = None;

    for &mv in moves {
        let score = alpha_beta(
            &board.with_move(mv),
            depth - 1,
            i32::MIN,
            i32::MAX,
            !maximizing,
            info,
        );
        if info.aborted {
            break;
        }
        let better = match best {
            None => true,
            Some((_, best_score)) if maximizing => score > best_score,
            Some((_, best_score)) => score < best_score,
        };
        if better {
            best = Some((mv, score));
        }
    }
    best
}

/// Best move for the side to move at a fixed depth.
pub fn find_best_move(board: &Board, depth: i32) -> Option<Move> {
    search_with_limits(board, &SearchLimits::depth(depth)).best_move
}

/// Runs the search under `limits`. Without a time limit this is a single
/// fixed-depth pass; with one it deepens from one ply and keeps the move of
/// the last completed depth.
pub fn search_with_limits(board: &Board, limits: &SearchLimits) -> SearchReport {
    let mut info = SearchInfo::new(limits);
    let max_depth = limits.depth.max(1);
    let root_moves = legal_moves(board, board.side_to_move());

    let mut report = SearchReport {
        best_move: None,
        score: 0,
        depth_reached: 0,
        nodes: 0,
        elapsed: Duration::ZERO,
    };
    if root_moves.is_empty() {
        debug!("no legal moves at root");
        return report;
    }

    let first_depth = if limits.time_limit.is_some() { 1 } else { max_depth };
    for depth in first_depth..=max_depth {
        let result = search_root(board, &root_moves, depth, &mut info);
        if info.aborted {
            if report.best_move.is_none() {
                if let Some((mv, score)) = result {
                    report.best_move = Some(mv);
                    report.score = score;
                }
            }
            warn!(depth, nodes = info.nodes, "search stopped before completing depth");
            break;
        }
        if let Some((mv, score)) = result {
            report.best_move = Some(mv);
            report.score = score;
            report.depth_reached = depth;
            debug!(depth, score, nodes = info.nodes, best = %mv, "depth complete");
        }
        info.deadline_armed = true;
    }

    report.nodes = info.nodes;
    report.elapsed = info.start.elapsed();
    report
}

// =====================
// Move Selection
// =====================

/// Picks the computer's move for the side to move, or `None` when there is
/// nothing to play (no legal moves, no AI, or the search was stopped early).
pub fn select_ai_move<R: Rng + ?Sized>(
    board: &Board,
    difficulty: Difficulty,
    limits: &SearchLimits,
    rng: &mut R,
) -> Option<Move> {
    let mut moves = legal_moves(board, board.side_to_move());
    if moves.is_empty() {
        return None;
    }

    let chosen = match difficulty {
        Difficulty::None => None,
        Difficulty::Easy => moves.choose(rng).copied(),
        Difficulty::Medium => {
            for mv in moves.iter_mut() {
                mv.score = evaluate_move(board, mv);
            }
            moves.sort_by(|a, b| b.score.cmp(&a.score));
            let top = moves.len().min(3);
            Some(moves[rng.gen_range(0..top)])
        }
        Difficulty::Hard => {
            let limits = SearchLimits {
                depth: difficulty.search_depth(),
                ..limits.clone()
            };
            let report = search_with_limits(board, &limits);
            debug!(
                depth = report.depth_reached,
                score = report.score,
                nodes = report.nodes,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "hard search finished"
            );
            report.best_move
        }
    };
    debug!(%difficulty, chosen = ?chosen.map(|m| m.to_string()), "ai move selected");
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Square, is_in_checkmate};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn after_e4() -> Board {
        Board::starting_position().with_move(Move::new(sq("e2"), sq("e4")))
    }

    #[test]
    fn difficulty_tables() {
        let depths: Vec<i32> = Difficulty::ALL.iter().map(|d| d.search_depth()).collect();
        assert_eq!(depths, vec![0, 1, 2, 3]);
        assert_eq!(Difficulty::Hard.thinking_time(), Duration::from_millis(1500));
        assert_eq!(Difficulty::None.thinking_time(), Duration::ZERO);
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(
            "brutal".parse::<Difficulty>(),
            Err(ParseError::UnknownDifficulty("brutal".into()))
        );
    }

    #[test]
    fn finds_back_rank_mate() {
        let board = Board::from_fen("r5k1/8/8/8/8/8/5PPP/6K1 b - - 0 1");
        for depth in 1..=2 {
            let best = find_best_move(&board, depth).unwrap();
            assert_eq!((best.from, best.to), (sq("a8"), sq("a1")), "depth {depth}");
            assert!(is_in_checkmate(&board.with_move(best), Color::White));
        }
    }

    #[test]
    fn minimax_scores_mate_by_depth() {
        let mated = Board::from_fen("r5k1/8/8/8/8/8/5PPP/r5K1 w - - 0 1");
        assert_eq!(minimax(&mated, 1, i32::MIN, i32::MAX, false), 1001);
        assert_eq!(minimax(&mated, 2, i32::MIN, i32::MAX, false), 1002);
    }

    #[test]
    fn minimax_stalemate_is_zero() {
        let board = Board::from_fen("k7/2Q5/1K6/8/8/8/8/8 b - - 0 1");
        assert_eq!(minimax(&board, 2, i32::MIN, i32::MAX, true), 0);
    }

    #[test]
    fn hard_search_is_deterministic() {
        let board = after_e4();
        let first = find_best_move(&board, 2);
        assert!(first.is_some());
        for _ in 0..3 {
            assert_eq!(find_best_move(&board, 2), first);
        }
        assert_eq!(board, after_e4());
    }

    #[test]
    fn hard_tier_is_a_seed_independent_depth_three_search() {
        let board = Board::from_fen("3rk3/8/8/8/8/8/8/3QK3 b - - 0 1");
        let expected = find_best_move(&board, 3);
        assert!(expected.is_some());
        for seed in [1, 99] {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = select_ai_move(&board, Difficulty::Hard, &SearchLimits::default(), &mut rng);
            assert_eq!(chosen, expected);
        }
    }

    #[test]
    fn search_prefers_winning_material() {
        // Black can take the undefended queen.
        let board = Board::from_fen("3rk3/8/8/8/8/8/8/3QK3 b - - 0 1");
        let best = find_best_move(&board, 2).unwrap();
        assert_eq!((best.from, best.to), (sq("d8"), sq("d1")));
    }

    #[test]
    fn zero_time_limit_still_completes_first_ply() {
        let board = after_e4();
        let limits = SearchLimits::depth(3).with_time_limit(Some(Duration::ZERO));
        let report = search_with_limits(&board, &limits);
        assert!(report.best_move.is_some());
        assert_eq!(report.depth_reached, 1);
    }

    #[test]
    fn raised_stop_flag_yields_no_move() {
        let stop = Arc::new(AtomicBool::new(true));
        let limits = SearchLimits::depth(3).with_stop(stop);
        let report = search_with_limits(&after_e4(), &limits);
        assert_eq!(report.best_move, None);
    }

    #[test]
    fn no_moves_means_no_selection() {
        let mated = Board::from_fen("r5k1/8/8/8/8/8/5PPP/r5K1 w - - 0 1");
        let mut rng = StdRng::seed_from_u64(1);
        for difficulty in Difficulty::ALL {
            assert_eq!(
                select_ai_move(&mated, difficulty, &SearchLimits::default(), &mut rng),
                None
            );
        }
    }

    #[test]
    fn none_difficulty_never_moves() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            select_ai_move(&after_e4(), Difficulty::None, &SearchLimits::default(), &mut rng),
            None
        );
    }

    #[test]
    fn easy_and_medium_pick_legal_moves() {
        let board = after_e4();
        let legal = legal_moves(&board, Color::Black);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let mv = select_ai_move(&board, Difficulty::Easy, &SearchLimits::default(), &mut rng).unwrap();
            assert!(legal.iter().any(|m| m.same_squares(&mv)));
        }
    }

    #[test]
    fn medium_picks_from_top_three() {
        let board = Board::from_fen("3rk3/8/8/8/8/8/8/3QK3 b - - 0 1");
        let mut scored = legal_moves(&board, Color::Black);
        for mv in scored.iter_mut() {
            mv.score = evaluate_move(&board, mv);
        }
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        let top: Vec<Move> = scored.into_iter().take(3).collect();

        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let mv =
                select_ai_move(&board, Difficulty::Medium, &SearchLimits::default(), &mut rng).unwrap();
            assert!(top.iter().any(|m| m.same_squares(&mv)));
        }
        assert_eq!((top[0].from, top[0].to), (sq("d8"), sq("d1")));
    }
}

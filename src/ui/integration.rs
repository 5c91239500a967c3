// Interactive controller: reads commands from stdin and drives a chess or
// checkers session, handing computer turns to the scheduler.

use super::*;
use crate::checkers::{CheckersGame, CheckersMove};
use crate::config::{Config, GameKind};
use crate::engine::legal_moves;
use crate::evaluation::evaluate_board;
use crate::scheduler::{self, Completed, Poll};
use crate::search::{SearchLimits, search_with_limits};
use crate::session::{AiRequest, GameSession, TapOutcome};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const HINT_DEPTH: i32 = 3;
const HINT_TIME_LIMIT: Duration = Duration::from_secs(3);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What the human typed during a game.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Move(Square, Square),
    Tap(Square),
    Moves,
    Hint,
    Eval,
    Difficulty(Difficulty),
    Flip,
    New,
    Resign,
    Menu,
    Help,
    Empty,
    Invalid(String),
}

fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();
    let mut words = lower.split_whitespace();
    let Some(first) = words.next() else {
        return Command::Empty;
    };

    match first {
        "moves" | "m" => Command::Moves,
        "hint" => Command::Hint,
        "eval" => Command::Eval,
        "flip" | "f" => Command::Flip,
        "new" | "restart" => Command::New,
        "resign" => Command::Resign,
        "menu" | "quit" | "q" | "exit" => Command::Menu,
        "help" | "h" | "?" => Command::Help,
        "difficulty" | "level" => match words.next().map(str::parse::<Difficulty>) {
            Some(Ok(level)) => Command::Difficulty(level),
            Some(Err(err)) => Command::Invalid(err.to_string()),
            None => Command::Invalid("usage: difficulty <none|easy|medium|hard>".to_string()),
        },
        _ => {
            if let Ok(sq) = InputValidator::parse_square(trimmed) {
                return Command::Tap(sq);
            }
            match InputValidator::parse_move(trimmed) {
                Ok((from, to)) => Command::Move(from, to),
                Err(err) => Command::Invalid(err.to_string()),
            }
        }
    }
}

/// Runs an AI request on a worker thread and waits for it, animating a
/// spinner meanwhile. `None` when the worker died without answering.
fn await_ai<M: Send + 'static>(
    display: &BoardDisplay,
    request: AiRequest<M>,
) -> Option<Completed<Option<M>>> {
    let generation = request.generation;
    let job = scheduler::schedule(generation, request.delay, move |stop| request.run(stop));
    let started = Instant::now();

    loop {
        match job.wait_timeout(POLL_INTERVAL) {
            Poll::Ready(done) => {
                print!("\r{}\r", " ".repeat(40));
                debug!(generation, elapsed_ms = started.elapsed().as_millis() as u64, "ai answered");
                return Some(done);
            }
            Poll::Pending => display.show_thinking_animation(started.elapsed()),
            Poll::Gone => {
                println!();
                warn!(generation, "ai worker exited without a result");
                return None;
            }
        }
    }
}

fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input),
    }
}

fn pause() {
    read_line(&format!("{}Press Enter to continue...{}", colors::DIM, colors::RESET));
}

pub struct GameController {
    config: Config,
    display: BoardDisplay,
    chess: GameSession,
    checkers: CheckersGame,
}

impl GameController {
    pub fn new(config: Config) -> Self {
        let chess = config.chess_session();
        let checkers = config.checkers_game();
        Self {
            config,
            display: BoardDisplay::new(),
            chess,
            checkers,
        }
    }

    pub fn run(&mut self) {
        self.display.clear_screen();
        AsciiArt::show_welcome_banner();

        // The --game flag picks what starts right away; the menu follows.
        let mut next = Some(self.config.game);
        loop {
            match next.take() {
                Some(GameKind::Chess) => self.play_chess(),
                Some(GameKind::Checkers) => self.play_checkers(),
                None => {}
            }

            let menu = create_main_menu();
            menu.display();
            let action = match menu.get_selection() {
                Ok(action) => action,
                Err(_) => break,
            };

            match action.as_str() {
                "chess" => next = Some(GameKind::Chess),
                "checkers" => next = Some(GameKind::Checkers),
                "difficulty" => self.choose_difficulty(),
                "help" => {
                    show_help();
                    pause();
                }
                "exit" => {
                    if ConfirmDialog::confirm("Are you sure you want to exit?") {
                        break;
                    }
                }
                _ => Notification::new("Invalid option", NotificationKind::Error).show(),
            }
        }

        self.chess.reset();
        self.checkers.reset();
        Notification::new("Goodbye!", NotificationKind::Info).show();
    }

    fn choose_difficulty(&mut self) {
        let menu = create_difficulty_menu();
        menu.display();
        let Ok(action) = menu.get_selection() else {
            return;
        };
        match action.parse::<Difficulty>() {
            Ok(level) => self.apply_difficulty(level),
            Err(_) if action == "back" => {}
            Err(_) => Notification::new("Invalid option", NotificationKind::Error).show(),
        }
    }

    fn apply_difficulty(&mut self, level: Difficulty) {
        self.config.difficulty = level;
        self.chess.set_difficulty(level);
        self.checkers.set_difficulty(level);
        info!(%level, "difficulty changed");
        Notification::new(
            format!("Computer strength set to {}", difficulty_label(level)),
            NotificationKind::Success,
        )
        .show();
    }

    // ========================================================================
    // CHESS
    // ========================================================================

    fn play_chess(&mut self) {
        self.chess.start_new_game();
        let mut message: Option<Notification> = None;

        loop {
            self.display.render_chess(self.chess.state());
            if let Some(note) = message.take() {
                note.show();
            }

            if let Some(result) = GameResult::from_chess(self.chess.state()) {
                result.show();
                break;
            }
            if self.chess.state().white_in_check || self.chess.state().black_in_check {
                AsciiArt::show_check();
            }

            if !self.chess.state().game_in_progress {
                pause();
                break;
            }

            if self.chess.is_ai_turn() {
                message = self.chess_ai_turn();
                continue;
            }

            let side = if self.chess.state().is_white_turn() { "White" } else { "Black" };
            let Some(input) = read_line(&format!(
                "{}{} to move{} (e.g. e2e4, 'help'): ",
                colors::BRIGHT_CYAN,
                side,
                colors::RESET
            )) else {
                break;
            };

            match parse_command(&input) {
                Command::Move(from, to) => message = Some(self.chess_move(from, to)),
                Command::Tap(sq) => message = self.chess_tap(sq),
                Command::Moves => {
                    self.show_chess_moves();
                    pause();
                }
                Command::Hint => {
                    self.show_hint();
                    pause();
                }
                Command::Eval => {
                    let score = evaluate_board(self.chess.board());
                    message = Some(Notification::new(
                        format!("Evaluation: {} (positive favours Black)", score),
                        NotificationKind::Info,
                    ));
                }
                Command::Difficulty(level) => message = Some(self.refuse_difficulty_change(level)),
                Command::Flip => self.display.flip_board = !self.display.flip_board,
                Command::New => {
                    if ConfirmDialog::confirm("Start a new chess game?") {
                        self.chess.start_new_game();
                    }
                }
                Command::Resign => {
                    if ConfirmDialog::confirm("Are you sure you want to resign?") {
                        info!("player resigned chess game");
                        GameResult::Resignation.show();
                        break;
                    }
                }
                Command::Menu => break,
                Command::Help => {
                    show_help();
                    pause();
                }
                Command::Empty => {}
                Command::Invalid(reason) => {
                    message = Some(Notification::new(reason, NotificationKind::Error));
                }
            }
        }

        // Any AI job still pending for the old game gets ignored after this.
        self.chess.reset();
    }

    fn chess_move(&mut self, from: Square, to: Square) -> Notification {
        let captured = self.chess.board().piece_at(to);
        match self.chess.try_move(from, to) {
            Ok(mv) => match captured {
                Some(piece) if !mv.is_castling => Notification::new(
                    format!("{} captures {}", format_move(&mv), piece_name(piece)),
                    NotificationKind::Success,
                ),
                _ => Notification::new(format!("Played {}", format_move(&mv)), NotificationKind::Success),
            },
            Err(err) => Notification::new(err.to_string(), NotificationKind::Error),
        }
    }

    fn chess_tap(&mut self, sq: Square) -> Option<Notification> {
        match self.chess.handle_tap(sq) {
            TapOutcome::Moved(mv) => Some(Notification::new(
                format!("Played {}", format_move(&mv)),
                NotificationKind::Success,
            )),
            TapOutcome::Selected(targets) if targets.is_empty() => Some(Notification::new(
                format!("The piece on {} has no legal moves", sq),
                NotificationKind::Warning,
            )),
            TapOutcome::Selected(_) | TapOutcome::Deselected => None,
            TapOutcome::Ignored => Some(Notification::new(
                format!("Nothing to select on {}", sq),
                NotificationKind::Warning,
            )),
        }
    }

    fn chess_ai_turn(&mut self) -> Option<Notification> {
        let request = self.chess.begin_ai_turn()?;
        let done = await_ai(&self.display, request);
        Some(self.finish_chess_ai_turn(done))
    }

    fn finish_chess_ai_turn(&mut self, done: Option<Completed<Option<Move>>>) -> Notification {
        let Some(done) = done else {
            // Still the computer's turn otherwise; asking again would loop.
            self.chess.reset();
            return abandoned_note();
        };
        match self.chess.complete_ai_turn(done.generation, done.value) {
            Some(mv) => Notification::new(
                format!("Computer played {}", format_move(&mv)),
                NotificationKind::Info,
            ),
            None => Notification::new("The computer could not find a move", NotificationKind::Warning),
        }
    }

    /// Strength is fixed while a game runs; the main menu changes it.
    fn refuse_difficulty_change(&self, requested: Difficulty) -> Notification {
        debug!(%requested, "difficulty change refused during a game");
        Notification::new(
            format!(
                "Difficulty stays {} until this game ends; change it from the main menu",
                difficulty_label(self.config.difficulty)
            ),
            NotificationKind::Warning,
        )
    }

    fn show_chess_moves(&self) {
        let board = self.chess.board();
        let moves = legal_moves(board, board.side_to_move());
        println!(
            "{}{}Legal moves ({}):{}",
            colors::BOLD,
            colors::BRIGHT_GREEN,
            moves.len(),
            colors::RESET
        );
        for chunk in moves.chunks(8) {
            let line: Vec<String> = chunk.iter().map(format_move).collect();
            println!("  {}", line.join("  "));
        }
        println!();
    }

    fn show_hint(&self) {
        let board = self.chess.board();
        let limits = SearchLimits::depth(HINT_DEPTH).with_time_limit(Some(HINT_TIME_LIMIT));
        let report = search_with_limits(board, &limits);
        self.display.print_analysis(&report);
        match report.best_move {
            Some(mv) => Notification::new(format!("Try {}", format_move(&mv)), NotificationKind::Info).show(),
            None => Notification::new("No legal moves", NotificationKind::Warning).show(),
        }
    }

    // ========================================================================
    // CHECKERS
    // ========================================================================

    fn play_checkers(&mut self) {
        self.checkers.start_new_game();
        let mut message: Option<Notification> = None;

        loop {
            self.display.render_checkers(self.checkers.state());
            if let Some(note) = message.take() {
                note.show();
            }

            if let Some(result) = GameResult::from_checkers(self.checkers.state()) {
                result.show();
                break;
            }

            if !self.checkers.state().game_in_progress {
                pause();
                break;
            }

            if self.checkers.is_ai_turn() {
                message = self.checkers_ai_turn();
                continue;
            }

            let side = if self.checkers.state().is_red_turn() { "Red" } else { "Black" };
            let Some(input) = read_line(&format!(
                "{}{} to move{} (e.g. c3d4, 'help'): ",
                colors::BRIGHT_CYAN,
                side,
                colors::RESET
            )) else {
                break;
            };

            match parse_command(&input) {
                Command::Move(from, to) => {
                    message = Some(match self.checkers.try_move(from, to) {
                        Ok(mv) => checkers_move_note(mv),
                        Err(err) => Notification::new(err.to_string(), NotificationKind::Error),
                    });
                }
                Command::Tap(sq) => {
                    message = match self.checkers.handle_tap(sq) {
                        TapOutcome::Moved(mv) => Some(checkers_move_note(mv)),
                        TapOutcome::Ignored => Some(Notification::new(
                            format!("Nothing to select on {}", sq),
                            NotificationKind::Warning,
                        )),
                        TapOutcome::Selected(_) | TapOutcome::Deselected => None,
                    };
                }
                Command::Difficulty(level) => message = Some(self.refuse_difficulty_change(level)),
                Command::Flip => self.display.flip_board = !self.display.flip_board,
                Command::New => {
                    if ConfirmDialog::confirm("Start a new checkers game?") {
                        self.checkers.start_new_game();
                    }
                }
                Command::Resign => {
                    if ConfirmDialog::confirm("Are you sure you want to resign?") {
                        info!("player resigned checkers game");
                        GameResult::Resignation.show();
                        break;
                    }
                }
                Command::Menu => break,
                Command::Help => {
                    show_help();
                    pause();
                }
                Command::Moves | Command::Hint | Command::Eval => {
                    message = Some(Notification::new(
                        "That command is only available in chess",
                        NotificationKind::Warning,
                    ));
                }
                Command::Empty => {}
                Command::Invalid(reason) => {
                    message = Some(Notification::new(reason, NotificationKind::Error));
                }
            }
        }

        self.checkers.reset();
    }

    fn checkers_ai_turn(&mut self) -> Option<Notification> {
        let request = self.checkers.begin_ai_turn()?;
        let done = await_ai(&self.display, request);
        self.finish_checkers_ai_turn(done)
    }

    fn finish_checkers_ai_turn(
        &mut self,
        done: Option<Completed<Option<CheckersMove>>>,
    ) -> Option<Notification> {
        let Some(done) = done else {
            // Treating a dead worker as "no move" would hand the human a win.
            self.checkers.reset();
            return Some(abandoned_note());
        };
        self.checkers
            .complete_ai_turn(done.generation, done.value)
            .map(|mv| Notification::new(format!("Computer played {}", mv), NotificationKind::Info))
    }
}

fn abandoned_note() -> Notification {
    Notification::new(
        "The computer stopped unexpectedly; game abandoned",
        NotificationKind::Error,
    )
}

fn checkers_move_note(mv: CheckersMove) -> Notification {
    if mv.is_jump() {
        Notification::new(format!("{} jumps!", mv), NotificationKind::Success)
    } else {
        Notification::new(format!("Played {}", mv), NotificationKind::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn parses_moves_and_taps() {
        assert_eq!(parse_command("e2e4\n"), Command::Move(sq("e2"), sq("e4")));
        assert_eq!(parse_command("c3 d4"), Command::Move(sq("c3"), sq("d4")));
        assert_eq!(parse_command("E2"), Command::Tap(sq("e2")));
        assert_eq!(parse_command("   "), Command::Empty);
    }

    #[test]
    fn parses_keywords() {
        assert_eq!(parse_command("hint"), Command::Hint);
        assert_eq!(parse_command("MOVES"), Command::Moves);
        assert_eq!(parse_command("quit"), Command::Menu);
        assert_eq!(parse_command("difficulty hard"), Command::Difficulty(Difficulty::Hard));
        assert!(matches!(parse_command("difficulty brutal"), Command::Invalid(_)));
        assert!(matches!(parse_command("difficulty"), Command::Invalid(_)));
        assert!(matches!(parse_command("e9e4"), Command::Invalid(_)));
    }

    #[test]
    fn ai_turn_runs_through_scheduler() {
        let config = Config {
            think_delay_ms: Some(0),
            seed: Some(3),
            ..Config::default()
        };
        let mut controller = GameController::new(config);
        controller.chess.start_new_game();
        controller.chess.try_move(sq("e2"), sq("e4")).unwrap();
        assert!(controller.chess.is_ai_turn());

        let note = controller.chess_ai_turn();
        assert!(note.is_some());
        assert_eq!(controller.chess.state().history.len(), 2);
        assert!(controller.chess.state().is_white_turn());
        assert!(!controller.chess.state().is_ai_thinking);
    }

    #[test]
    fn checkers_ai_turn_runs_through_scheduler() {
        let config = Config {
            think_delay_ms: Some(0),
            ..Config::default()
        };
        let mut controller = GameController::new(config);
        controller.checkers.start_new_game();
        controller.checkers.try_move(sq("c3"), sq("d4")).unwrap();
        assert!(controller.checkers.is_ai_turn());

        assert!(controller.checkers_ai_turn().is_some());
        assert!(controller.checkers.state().is_red_turn());
        assert_eq!(controller.checkers.state().winner, None);
    }

    #[test]
    fn difficulty_change_reaches_both_games() {
        let mut controller = GameController::new(Config::default());
        controller.apply_difficulty(Difficulty::None);
        assert_eq!(controller.chess.difficulty(), Difficulty::None);
        assert_eq!(controller.checkers.state().difficulty, Difficulty::None);
        assert!(!controller.chess.is_ai_turn());
    }

    #[test]
    fn dead_chess_worker_abandons_the_game() {
        let mut controller = GameController::new(Config::default());
        controller.chess.start_new_game();
        controller.chess.try_move(sq("e2"), sq("e4")).unwrap();
        assert!(controller.chess.begin_ai_turn().is_some());

        controller.finish_chess_ai_turn(None);
        let state = controller.chess.state();
        assert!(!state.game_in_progress);
        assert!(!state.is_ai_thinking);
        assert_eq!(state.winner, None);
        assert!(!controller.chess.is_ai_turn());
        assert_eq!(controller.chess.state().history.len(), 1);
    }

    #[test]
    fn dead_checkers_worker_abandons_the_game() {
        let mut controller = GameController::new(Config::default());
        controller.checkers.start_new_game();
        controller.checkers.try_move(sq("c3"), sq("d4")).unwrap();
        assert!(controller.checkers.begin_ai_turn().is_some());

        assert!(controller.finish_checkers_ai_turn(None).is_some());
        assert!(!controller.checkers.state().game_in_progress);
        assert_eq!(controller.checkers.state().winner, None);
        assert!(!controller.checkers.is_ai_turn());
    }

    #[test]
    fn difficulty_is_fixed_during_a_game() {
        let mut controller = GameController::new(Config::default());
        controller.chess.start_new_game();
        controller.checkers.start_new_game();
        assert_eq!(parse_command("difficulty hard"), Command::Difficulty(Difficulty::Hard));

        controller.refuse_difficulty_change(Difficulty::Hard);
        assert_eq!(controller.config.difficulty, Difficulty::Medium);
        assert_eq!(controller.chess.difficulty(), Difficulty::Medium);
        assert_eq!(controller.checkers.state().difficulty, Difficulty::Medium);
    }
}

// Terminal UI for chess and checkers
// Features: coloured boards, selection and move highlighting, menus, notifications

pub mod integration;

use crate::checkers::{Checker, CheckersState, Side};
use crate::engine::{BOARD_SIZE, Color, Move, Piece, PieceKind, Square};
use crate::error::ParseError;
use crate::search::{Difficulty, SearchReport};
use crate::session::GameState;
pub use integration::GameController;
use std::io::{self, Write};
use std::time::Duration;

// ============================================================================
// COLOR CODES & STYLING
// ============================================================================

pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const WHITE: &str = "\x1b[37m";
    pub const BRIGHT_BLACK: &str = "\x1b[90m";
    pub const BRIGHT_RED: &str = "\x1b[91m";
    pub const BRIGHT_GREEN: &str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_BLUE: &str = "\x1b[94m";
    pub const BRIGHT_MAGENTA: &str = "\x1b[95m";
    pub const BRIGHT_CYAN: &str = "\x1b[96m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";

    pub const BG_LIGHT: &str = "\x1b[48;5;252m"; // Light square
    pub const BG_DARK: &str = "\x1b[48;5;240m"; // Dark square
    pub const BG_HIGHLIGHT: &str = "\x1b[48;5;226m"; // Last move
    pub const BG_TARGET: &str = "\x1b[48;5;120m"; // Reachable square
    pub const BG_SELECTED: &str = "\x1b[48;5;117m"; // Selected square
    pub const BG_CHECK: &str = "\x1b[48;5;196m"; // King in check
}

// ============================================================================
// PIECE SYMBOLS
// ============================================================================

pub mod symbols {
    use crate::checkers::{Checker, Side};
    use crate::engine::{Color, Piece, PieceKind};

    pub const WHITE_KING: &str = "♔";
    pub const WHITE_QUEEN: &str = "♕";
    pub const WHITE_ROOK: &str = "♖";
    pub const WHITE_BISHOP: &str = "♗";
    pub const WHITE_KNIGHT: &str = "♘";
    pub const WHITE_PAWN: &str = "♙";

    pub const BLACK_KING: &str = "♚";
    pub const BLACK_QUEEN: &str = "♛";
    pub const BLACK_ROOK: &str = "♜";
    pub const BLACK_BISHOP: &str = "♝";
    pub const BLACK_KNIGHT: &str = "♞";
    pub const BLACK_PAWN: &str = "♟";

    pub const CHECKER_MAN: &str = "●";
    pub const CHECKER_KING: &str = "♛";

    pub fn piece_symbol(piece: Piece) -> &'static str {
        match (piece.color, piece.kind) {
            (Color::White, PieceKind::King) => WHITE_KING,
            (Color::White, PieceKind::Queen) => WHITE_QUEEN,
            (Color::White, PieceKind::Rook) => WHITE_ROOK,
            (Color::White, PieceKind::Bishop) => WHITE_BISHOP,
            (Color::White, PieceKind::Knight) => WHITE_KNIGHT,
            (Color::White, PieceKind::Pawn) => WHITE_PAWN,
            (Color::Black, PieceKind::King) => BLACK_KING,
            (Color::Black, PieceKind::Queen) => BLACK_QUEEN,
            (Color::Black, PieceKind::Rook) => BLACK_ROOK,
            (Color::Black, PieceKind::Bishop) => BLACK_BISHOP,
            (Color::Black, PieceKind::Knight) => BLACK_KNIGHT,
            (Color::Black, PieceKind::Pawn) => BLACK_PAWN,
        }
    }

    pub fn checker_symbol(checker: Checker) -> (&'static str, &'static str) {
        let color = match checker.side {
            Side::Red => super::colors::BRIGHT_RED,
            Side::Black => super::colors::BRIGHT_BLACK,
        };
        let glyph = if checker.king { CHECKER_KING } else { CHECKER_MAN };
        (glyph, color)
    }
}

// ============================================================================
// BOARD DISPLAY
// ============================================================================

pub struct BoardDisplay {
    pub use_unicode: bool,
    pub flip_board: bool,
}

impl Default for BoardDisplay {
    fn default() -> Self {
        Self {
            use_unicode: true,
            flip_board: false,
        }
    }
}

impl BoardDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_screen(&self) {
        print!("\x1b[2J\x1b[H");
    }

    fn print_header(&self, title: &str) {
        use colors::*;
        println!();
        println!(
            "{}{}╔════════════════════════════════════════════════════════════╗{}",
            BOLD, BRIGHT_CYAN, RESET
        );
        println!("{}{}║{}║{}", BOLD, BRIGHT_CYAN, center_text(title, 60), RESET);
        println!(
            "{}{}╚════════════════════════════════════════════════════════════╝{}",
            BOLD, BRIGHT_CYAN, RESET
        );
        println!();
    }

    fn rows(&self) -> Vec<usize> {
        if self.flip_board {
            (0..BOARD_SIZE).rev().collect()
        } else {
            (0..BOARD_SIZE).collect()
        }
    }

    fn cols(&self) -> Vec<usize> {
        if self.flip_board {
            (0..BOARD_SIZE).rev().collect()
        } else {
            (0..BOARD_SIZE).collect()
        }
    }

    fn print_file_labels(&self) {
        if self.flip_board {
            println!("       h    g    f    e    d    c    b    a   ");
        } else {
            println!("       a    b    c    d    e    f    g    h   ");
        }
        println!();
    }

    pub fn render_chess(&self, state: &GameState) {
        self.clear_screen();
        self.print_header("♚  CHESS  ♔");
        self.print_chess_board(state);
        self.print_chess_info(state);
        self.print_move_list(&state.history);
    }

    pub fn print_chess_board(&self, state: &GameState) {
        use colors::*;

        let checked_king = [
            (state.white_in_check, Color::White),
            (state.black_in_check, Color::Black),
        ]
        .into_iter()
        .filter(|(in_check, _)| *in_check)
        .filter_map(|(_, color)| state.board.find_king(color))
        .collect::<Vec<_>>();

        println!("    ╔════════════════════════════════════════╗");
        for row in self.rows() {
            print!("  {} ║", BOARD_SIZE - row);
            for col in self.cols() {
                let sq = Square::new(row, col);
                let bg = if checked_king.contains(&sq) {
                    BG_CHECK
                } else {
                    square_background(
                        sq,
                        state.selected,
                        &state.valid_moves,
                        state.last_move().map(|m| (m.from, m.to)),
                    )
                };

                match state.board.piece_at(sq) {
                    Some(piece) => {
                        let symbol = if self.use_unicode {
                            symbols::piece_symbol(piece).to_string()
                        } else {
                            piece.to_char().to_string()
                        };
                        let fg = match piece.color {
                            Color::White => BRIGHT_WHITE,
                            Color::Black => BRIGHT_BLACK,
                        };
                        print!("{}{}{}  {}  {}", bg, BOLD, fg, symbol, RESET);
                    }
                    None => print!("{}     {}", bg, RESET),
                }
            }
            println!("║");
        }
        println!("    ╚════════════════════════════════════════╝");
        self.print_file_labels();
    }

    fn print_chess_info(&self, state: &GameState) {
        use colors::*;

        println!(
            "{}┌─────────────────────────────────────────────────────────┐{}",
            BRIGHT_BLUE, RESET
        );
        let side = if state.is_white_turn() {
            format!("{}White{}", BRIGHT_WHITE, RESET)
        } else {
            format!("{}Black{}", BRIGHT_BLACK, RESET)
        };
        println!(
            "│ {}Turn:{} {}  │  {}Move:{} {}  │  {}AI:{} {}",
            BOLD,
            RESET,
            side,
            BOLD,
            RESET,
            state.history.len() / 2 + 1,
            BOLD,
            RESET,
            difficulty_label(state.difficulty)
        );
        if state.white_in_check || state.black_in_check {
            let who = if state.white_in_check { "White" } else { "Black" };
            println!("│ {}{}⚠  {} is in check{}", BOLD, BRIGHT_YELLOW, who, RESET);
        }
        if let Some(sq) = state.selected {
            let targets: Vec<String> = state.valid_moves.iter().map(|s| s.to_string()).collect();
            println!(
                "│ {}Selected:{} {}  →  {}",
                BOLD,
                RESET,
                sq,
                if targets.is_empty() {
                    "no moves".to_string()
                } else {
                    targets.join(" ")
                }
            );
        }
        println!(
            "{}└─────────────────────────────────────────────────────────┘{}",
            BRIGHT_BLUE, RESET
        );
        println!();
    }

    pub fn render_checkers(&self, state: &CheckersState) {
        self.clear_screen();
        self.print_header("●  CHECKERS  ●");
        self.print_checkers_board(state);
        self.print_checkers_info(state);
    }

    pub fn print_checkers_board(&self, state: &CheckersState) {
        use colors::*;

        println!("    ╔════════════════════════════════════════╗");
        for row in self.rows() {
            print!("  {} ║", BOARD_SIZE - row);
            for col in self.cols() {
                let sq = Square::new(row, col);
                let bg = square_background(sq, state.selected, &state.valid_moves, None);
                match state.board.piece_at(sq) {
                    Some(checker) => {
                        let (glyph, fg) = if self.use_unicode {
                            symbols::checker_symbol(checker)
                        } else {
                            checker_ascii(checker)
                        };
                        print!("{}{}{}  {}  {}", bg, BOLD, fg, glyph, RESET);
                    }
                    None => print!("{}     {}", bg, RESET),
                }
            }
            println!("║");
        }
        println!("    ╚════════════════════════════════════════╝");
        self.print_file_labels();
    }

    fn print_checkers_info(&self, state: &CheckersState) {
        use colors::*;

        let side = if state.is_red_turn() {
            format!("{}Red{}", BRIGHT_RED, RESET)
        } else {
            format!("{}Black{}", BRIGHT_BLACK, RESET)
        };
        println!(
            "{}┌─────────────────────────────────────────────────────────┐{}",
            BRIGHT_BLUE, RESET
        );
        println!(
            "│ {}Turn:{} {}  │  {}Red:{} {}  │  {}Black:{} {}  │  {}AI:{} {}",
            BOLD,
            RESET,
            side,
            BOLD,
            RESET,
            state.board.count(Side::Red),
            BOLD,
            RESET,
            state.board.count(Side::Black),
            BOLD,
            RESET,
            difficulty_label(state.difficulty)
        );
        println!(
            "{}└─────────────────────────────────────────────────────────┘{}",
            BRIGHT_BLUE, RESET
        );
        println!();
    }

    pub fn print_move_list(&self, moves: &[Move]) {
        use colors::*;

        if moves.is_empty() {
            return;
        }

        println!("{}{}═══ Move History ═══{}", BOLD, BRIGHT_MAGENTA, RESET);
        for (i, pair) in moves.chunks(2).enumerate() {
            print!("{}{}{}. {}{}", BOLD, BRIGHT_YELLOW, i + 1, RESET, format_move(&pair[0]));
            if let Some(reply) = pair.get(1) {
                print!("  {}", format_move(reply));
            }
            println!();
        }
        println!();
    }

    pub fn print_analysis(&self, report: &SearchReport) {
        use colors::*;

        println!("{}{}─── Engine Analysis ───{}", BOLD, BRIGHT_GREEN, RESET);
        let best = report
            .best_move
            .map_or_else(|| "none".to_string(), |m| format_move(&m));
        let time_ms = report.elapsed.as_millis();
        let nps = if time_ms > 0 {
            (report.nodes as f64 / time_ms as f64 * 1000.0) as u64
        } else {
            0
        };
        println!(
            "│ Depth: {}{}{}  │  Score: {}{}{} (positive favours Black)",
            BRIGHT_CYAN,
            report.depth_reached,
            RESET,
            if report.score >= 0 { BRIGHT_GREEN } else { BRIGHT_RED },
            report.score,
            RESET
        );
        println!(
            "│ Nodes: {}{}{}  │  Time: {}{}ms{}  │  NPS: {}{}{}",
            BRIGHT_YELLOW, report.nodes, RESET, BRIGHT_YELLOW, time_ms, RESET, BRIGHT_YELLOW, nps, RESET
        );
        println!("│ Best: {}{}{}", BRIGHT_WHITE, best, RESET);
        println!();
    }

    pub fn show_thinking_animation(&self, elapsed: Duration) {
        use colors::*;

        let spinners = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        let idx = (elapsed.as_millis() / 100) as usize % spinners.len();
        print!(
            "\r{}{}{}  Thinking... {:.1}s{}",
            BRIGHT_YELLOW,
            spinners[idx],
            RESET,
            elapsed.as_secs_f32(),
            " ".repeat(20)
        );
        io::stdout().flush().ok();
    }
}

fn square_background(
    sq: Square,
    selected: Option<Square>,
    targets: &[Square],
    last_move: Option<(Square, Square)>,
) -> &'static str {
    use colors::*;

    if selected == Some(sq) {
        return BG_SELECTED;
    }
    if targets.contains(&sq) {
        return BG_TARGET;
    }
    if let Some((from, to)) = last_move {
        if sq == from || sq == to {
            return BG_HIGHLIGHT;
        }
    }
    // a8 (row 0, col 0) is a light square.
    if (sq.row + sq.col) % 2 == 0 {
        BG_LIGHT
    } else {
        BG_DARK
    }
}

fn checker_ascii(checker: Checker) -> (&'static str, &'static str) {
    match (checker.side, checker.king) {
        (Side::Red, false) => ("r", colors::BRIGHT_RED),
        (Side::Red, true) => ("R", colors::BRIGHT_RED),
        (Side::Black, false) => ("b", colors::BRIGHT_BLACK),
        (Side::Black, true) => ("B", colors::BRIGHT_BLACK),
    }
}

pub fn format_move(mv: &Move) -> String {
    if mv.is_castling {
        let side = if mv.to.col > mv.from.col { "O-O" } else { "O-O-O" };
        format!("{} ({})", mv, side)
    } else {
        mv.to_string()
    }
}

fn difficulty_label(difficulty: Difficulty) -> String {
    match difficulty {
        Difficulty::None => "off (two players)".to_string(),
        other => other.to_string(),
    }
}

pub fn piece_name(piece: Piece) -> &'static str {
    match piece.kind {
        PieceKind::Pawn => "pawn",
        PieceKind::Knight => "knight",
        PieceKind::Bishop => "bishop",
        PieceKind::Rook => "rook",
        PieceKind::Queen => "queen",
        PieceKind::King => "king",
    }
}

fn center_text(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len >= width {
        return text.to_string();
    }

    let padding = (width - text_len) / 2;
    let mut result = " ".repeat(padding);
    result.push_str(text);
    result.push_str(&" ".repeat(width - text_len - padding));
    result
}

// ============================================================================
// INTERACTIVE MENU SYSTEM
// ============================================================================

pub struct Menu {
    title: String,
    options: Vec<MenuOption>,
}

pub struct MenuOption {
    pub label: String,
    pub description: String,
    pub action: String,
}

impl Menu {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            options: Vec::new(),
        }
    }

    pub fn add_option(&mut self, label: &str, description: &str, action: &str) {
        self.options.push(MenuOption {
            label: label.to_string(),
            description: description.to_string(),
            action: action.to_string(),
        });
    }

    pub fn display(&self) {
        use colors::*;

        println!();
        println!(
            "{}{}╔════════════════════════════════════════════════════════╗{}",
            BOLD, BRIGHT_CYAN, RESET
        );
        println!("{}{}║  {}  ║{}", BOLD, BRIGHT_CYAN, center_text(&self.title, 52), RESET);
        println!(
            "{}{}╚════════════════════════════════════════════════════════╝{}",
            BOLD, BRIGHT_CYAN, RESET
        );
        println!();

        for (i, option) in self.options.iter().enumerate() {
            println!(
                "    {}{}{}. {}{} - {}{}{}",
                BOLD,
                WHITE,
                i + 1,
                RESET,
                option.label,
                DIM,
                option.description,
                RESET
            );
        }

        println!();
        print!("{}Select option (1-{}): {}", BRIGHT_CYAN, self.options.len(), RESET);
        io::stdout().flush().ok();
    }

    /// Action for a 1-based choice, or an empty string.
    pub fn action_for(&self, input: &str) -> String {
        input
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0 && n <= self.options.len())
            .map(|n| self.options[n - 1].action.clone())
            .unwrap_or_default()
    }

    pub fn get_selection(&self) -> io::Result<String> {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(self.action_for(&input))
    }
}

// ============================================================================
// GAME RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    RedWins,
    Stalemate,
    Resignation,
}

impl GameResult {
    pub fn from_chess(state: &GameState) -> Option<GameResult> {
        match state.winner {
            Some(Color::White) => Some(GameResult::WhiteWins),
            Some(Color::Black) => Some(GameResult::BlackWins),
            None if state.stalemate => Some(GameResult::Stalemate),
            None => None,
        }
    }

    pub fn from_checkers(state: &CheckersState) -> Option<GameResult> {
        state.winner.map(|side| match side {
            Side::Red => GameResult::RedWins,
            Side::Black => GameResult::BlackWins,
        })
    }

    fn banner(self) -> &'static str {
        match self {
            GameResult::WhiteWins => "🏆  WHITE WINS!  🏆",
            GameResult::BlackWins => "🏆  BLACK WINS!  🏆",
            GameResult::RedWins => "🏆  RED WINS!  🏆",
            GameResult::Stalemate => "🤝  STALEMATE - DRAW  🤝",
            GameResult::Resignation => "🏳  RESIGNATION  🏳",
        }
    }

    pub fn show(self) {
        use colors::*;

        println!();
        println!(
            "{}{}╔════════════════════════════════════════════════════════╗{}",
            BOLD, BRIGHT_MAGENTA, RESET
        );
        println!("{}{}║  {}  ║{}", BOLD, BRIGHT_MAGENTA, center_text(self.banner(), 52), RESET);
        println!(
            "{}{}╚════════════════════════════════════════════════════════╝{}",
            BOLD, BRIGHT_MAGENTA, RESET
        );
        println!();
        println!("{}Press Enter to continue...{}", DIM, RESET);
        let mut dummy = String::new();
        io::stdin().read_line(&mut dummy).ok();
    }
}

// ============================================================================
// ASCII ART & BANNERS
// ============================================================================

pub struct AsciiArt;

impl AsciiArt {
    pub fn show_welcome_banner() {
        use colors::*;

        println!("{}{}", BOLD, BRIGHT_CYAN);
        println!(
            r"
    ╔═══════════════════════════════════════════════════╗
    ║                                                   ║
    ║        ♜ ♞ ♝ ♛ ♚ ♝ ♞ ♜      ● ● ● ● ● ●        ║
    ║                                                   ║
    ║            RUST BOARD GAMES  -  v0.1.0            ║
    ║       Chess and checkers against the computer     ║
    ║                                                   ║
    ╚═══════════════════════════════════════════════════╝
        "
        );
        println!("{}", RESET);
    }

    pub fn show_check() {
        use colors::*;
        println!("{}⚠️  CHECK! ⚠️{}", BRIGHT_YELLOW, RESET);
    }
}

// ============================================================================
// NOTIFICATION SYSTEM
// ============================================================================

pub struct Notification {
    message: String,
    kind: NotificationKind,
}

#[derive(Debug, Clone, Copy)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl Notification {
    pub fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn show(&self) {
        use colors::*;

        let (icon, color) = match self.kind {
            NotificationKind::Info => ("ℹ️", BRIGHT_BLUE),
            NotificationKind::Success => ("✅", BRIGHT_GREEN),
            NotificationKind::Warning => ("⚠️", BRIGHT_YELLOW),
            NotificationKind::Error => ("❌", BRIGHT_RED),
        };
        println!("{}{} {}{}", color, icon, self.message, RESET);
    }
}

// ============================================================================
// INPUT VALIDATOR
// ============================================================================

pub struct InputValidator;

impl InputValidator {
    pub fn parse_square(input: &str) -> Result<Square, ParseError> {
        Square::from_algebraic(input).ok_or_else(|| ParseError::InvalidSquare(input.trim().to_string()))
    }

    /// Accepts `e2e4`, `e2 e4`, `e2-e4` and `c3xd4`.
    pub fn parse_move(input: &str) -> Result<(Square, Square), ParseError> {
        let cleaned: String = input
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | 'x'))
            .collect();
        if cleaned.len() != 4 || !cleaned.is_ascii() {
            return Err(ParseError::InvalidMove(input.trim().to_string()));
        }
        let from = Square::from_algebraic(&cleaned[0..2]);
        let to = Square::from_algebraic(&cleaned[2..4]);
        match (from, to) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(ParseError::InvalidMove(input.trim().to_string())),
        }
    }
}

// ============================================================================
// CONFIRMATION DIALOG
// ============================================================================

pub struct ConfirmDialog;

impl ConfirmDialog {
    pub fn confirm(message: &str) -> bool {
        use colors::*;

        print!("{}{} {} (y/n): {}", BRIGHT_YELLOW, message, RESET, BRIGHT_CYAN);
        io::stdout().flush().ok();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            return false;
        }
        print!("{}", RESET);
        matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

// ============================================================================
// MENUS
// ============================================================================

pub fn create_main_menu() -> Menu {
    let mut menu = Menu::new("🏠 MAIN MENU");

    menu.add_option("Chess", "Play chess (you are White)", "chess");
    menu.add_option("Checkers", "Play checkers (you are Red)", "checkers");
    menu.add_option("Difficulty", "Choose the computer's strength", "difficulty");
    menu.add_option("Help", "How to enter moves", "help");
    menu.add_option("Exit", "Quit application", "exit");

    menu
}

pub fn create_difficulty_menu() -> Menu {
    let mut menu = Menu::new("🎮 COMPUTER STRENGTH");

    menu.add_option("None", "Two humans share the keyboard", "none");
    menu.add_option("Easy", "Random legal moves (chess)", "easy");
    menu.add_option("Medium", "Greedy captures and checks", "medium");
    menu.add_option("Hard", "Three-ply minimax search (chess)", "hard");
    menu.add_option("Back", "Return to main menu", "back");

    menu
}

pub fn show_help() {
    use colors::*;

    println!();
    println!("{}{}                    HELP & COMMANDS{}", BOLD, BRIGHT_YELLOW, RESET);
    println!();
    let commands = [
        ("e2e4 / e2 e4", "Move a piece (c3xd4 also works)"),
        ("e2", "Tap a square: select a piece, tap again to deselect"),
        ("e1g1", "Castle by moving the king two squares"),
        ("moves", "List legal moves of the side to move (chess)"),
        ("hint", "Ask the engine for a suggestion (chess)"),
        ("eval", "Static evaluation of the position (chess)"),
        ("difficulty <level>", "Shows the level; change it from the main menu"),
        ("flip", "Flip the board"),
        ("new", "Restart the current game"),
        ("resign", "Give up the current game"),
        ("menu", "Back to the main menu"),
    ];
    for (cmd, desc) in commands {
        println!("  {}{:<22}{} {}", BRIGHT_GREEN, cmd, RESET, desc);
    }
    println!();
}

// ============================================================================
// MODULE TESTS
// ============================================================================

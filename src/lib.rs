// Chess and checkers engines with a computer opponent, plus a terminal front end.

pub mod checkers;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod scheduler;
pub mod search;
pub mod session;
pub mod ui;

pub use config::{Config, GameKind};
pub use engine::{Board, Color, Move, Piece, PieceKind, Square};
pub use error::{GameError, ParseError};
pub use search::Difficulty;
pub use session::GameSession;

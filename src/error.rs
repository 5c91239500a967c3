//! Error types for game sessions and text input.

use crate::engine::Square;
use thiserror::Error;

/// Reasons a requested action was refused by a game session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The move is not among the piece's legal moves.
    #[error("illegal move from {from} to {to}")]
    IllegalMove { from: Square, to: Square },

    /// The source square is empty.
    #[error("no piece at {0}")]
    NoPieceAtSquare(Square),

    /// The piece on the source square belongs to the side not on move.
    #[error("the piece at {0} does not belong to the side to move")]
    NotYourTurn(Square),

    /// The game has already finished.
    #[error("the game is over")]
    GameOver,

    /// It is the computer's turn, or its move is still being computed.
    #[error("waiting for the computer to move")]
    AiTurn,
}

/// Failures when turning user text into squares, moves or settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid square '{0}' (expected a file a-h and a rank 1-8, e.g. e2)")]
    InvalidSquare(String),

    #[error("invalid move '{0}' (expected e.g. e2e4 or e2 e4)")]
    InvalidMove(String),

    #[error("unknown difficulty '{0}' (expected none, easy, medium or hard)")]
    UnknownDifficulty(String),

    #[error("unknown game '{0}' (expected chess or checkers)")]
    UnknownGame(String),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, GameError>;

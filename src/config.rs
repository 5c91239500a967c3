//! Command-line configuration and logging setup.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::checkers::CheckersGame;
use crate::error::ParseError;
use crate::search::Difficulty;
use crate::session::GameSession;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum GameKind {
    #[default]
    Chess,
    Checkers,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Chess => f.write_str("chess"),
            GameKind::Checkers => f.write_str("checkers"),
        }
    }
}

impl FromStr for GameKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chess" => Ok(GameKind::Chess),
            "checkers" | "draughts" => Ok(GameKind::Checkers),
            _ => Err(ParseError::UnknownGame(s.to_string())),
        }
    }
}

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "rust_board_games", version, about = "Chess and checkers in the terminal against a computer opponent")]
pub struct Config {
    /// Which game to play: chess or checkers
    #[arg(long, default_value = "chess")]
    pub game: GameKind,

    /// Computer strength: none, easy, medium or hard (checkers: none or any other for medium)
    #[arg(long, short, default_value = "medium")]
    pub difficulty: Difficulty,

    /// Override the computer's thinking delay in milliseconds
    #[arg(long)]
    pub think_delay_ms: Option<u64>,

    /// Wall-clock cap for the hard search in milliseconds
    #[arg(long)]
    pub time_limit_ms: Option<u64>,

    /// Seed for the random tiers
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter, e.g. "debug" or "rust_board_games=trace" (falls back to RUST_LOG, then "warn")
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            game: GameKind::Chess,
            difficulty: Difficulty::Medium,
            think_delay_ms: None,
            time_limit_ms: None,
            seed: None,
            log_level: None,
        }
    }
}

impl Config {
    pub fn think_delay(&self) -> Option<Duration> {
        self.think_delay_ms.map(Duration::from_millis)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    pub fn chess_session(&self) -> GameSession {
        let session = match self.seed {
            Some(seed) => GameSession::with_seed(self.difficulty, seed),
            None => GameSession::new(self.difficulty),
        };
        session
            .with_time_limit(self.time_limit())
            .with_think_delay(self.think_delay())
    }

    pub fn checkers_game(&self) -> CheckersGame {
        CheckersGame::new(self.difficulty).with_think_delay(self.think_delay())
    }
}

/// Installs the global subscriber, writing to stderr so log lines never mix
/// with the board on stdout. Calling it twice is harmless.
pub fn init_logging(level: Option<&str>) {
    let filter = level
        .and_then(|l| EnvFilter::try_new(l).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["rust_board_games"]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.think_delay(), None);
        assert_eq!(config.time_limit(), None);
    }

    #[test]
    fn parses_all_flags() {
        let config = Config::try_parse_from([
            "rust_board_games",
            "--game",
            "checkers",
            "-d",
            "hard",
            "--think-delay-ms",
            "0",
            "--time-limit-ms",
            "250",
            "--seed",
            "9",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(config.game, GameKind::Checkers);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.think_delay(), Some(Duration::ZERO));
        assert_eq!(config.time_limit(), Some(Duration::from_millis(250)));
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(Config::try_parse_from(["rust_board_games", "--difficulty", "brutal"]).is_err());
        assert!(Config::try_parse_from(["rust_board_games", "--game", "go"]).is_err());
    }

    #[test]
    fn checkers_difficulty_collapses_to_medium() {
        let config = Config {
            game: GameKind::Checkers,
            difficulty: Difficulty::Easy,
            ..Config::default()
        };
        assert_eq!(config.checkers_game().state().difficulty, Difficulty::Medium);
        assert_eq!(config.chess_session().difficulty(), Difficulty::Easy);
    }

    #[test]
    fn logging_init_is_idempotent() {
        init_logging(Some("debug"));
        init_logging(None);
    }
}

//! Triqui - tic-tac-toe against the computer, a friend or an online opponent
//!
//! # Architecture
//!
//! - **Games**: the rules engine, win/draw evaluation and the computer opponent
//! - **Local**: one-keyboard matches with coin-flipped openers and scoring
//! - **Db**: SQLite persistence for results and the saved unfinished game
//! - **Api**: REST client, remote-game mirror and state poller for online play
//! - **Server**: the axum server hosting online games over [`SessionManager`]
//! - **Tui**: ratatui screens for local and online play
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use triqui::{Board, ComputerOpponent, Difficulty, Mark, Position};
//!
//! let board = Board::from_compact("XX  O    ").unwrap();
//! let ai = ComputerOpponent::new(Mark::O, Difficulty::Expert);
//! let pick = ai.pick_move(&board, &mut StdRng::seed_from_u64(0));
//! assert_eq!(pick, Some(Position::TopRight));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod db;
pub mod games;
pub mod local;
pub mod server;
pub mod session;
pub mod tui;

// Crate-level exports - Game engine
pub use games::tictactoe::{
    Board, ComputerOpponent, Difficulty, Game, GameStatus, Mark, Move, MoveError, Phase, Position,
    Selection, Square, Tier,
};

// Crate-level exports - Local play
pub use local::{GameMode, LocalMatch, MatchResult, SavedMatch};

// Crate-level exports - Persistence and preferences
pub use config::{ConfigError, Preferences};
pub use db::{DbError, DbErrorKind, GameRecord, GameRepository, NewGameRecord, Scoreboard};

// Crate-level exports - Online play
pub use api::{ApiError, GameApiClient, RemoteEvent, RemoteGame, RemoteOutcome, StatePoller};
pub use session::{GameSession, Retention, SessionError, SessionManager};

// Crate-level exports - Terminal UI
pub use tui::{LocalApp, OnlineApp};

//! Tic-tac-toe: board, rules, game engine, and computer opponent.

mod action;
mod game;
mod opponent;
mod position;
pub mod rules;
mod types;

pub use action::{Move, MoveError};
pub use game::{Game, GameStatus, Phase};
pub use opponent::{
    ComputerOpponent, Difficulty, Selection, Tier, blocking_move, first_free_corner, random_move,
    winning_move,
};
pub use position::Position;
pub use types::{Board, BoardParseError, Mark, Square};

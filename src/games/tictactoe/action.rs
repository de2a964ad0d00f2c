//! First-class action types for tic-tac-toe.
//!
//! Moves are domain events, not side effects. They carry the mark and the
//! square, can be validated before application, and form the game history.

use super::{Mark, Position};
use serde::{Deserialize, Serialize};

/// A move in tic-tac-toe: a mark placed at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// The mark being placed.
    pub mark: Mark,
    /// The position where the mark is placed.
    pub position: Position,
}

impl Move {
    /// Creates a new move.
    pub fn new(mark: Mark, position: Position) -> Self {
        Self { mark, position }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.mark, self.position.label())
    }
}

/// Error that can occur when validating or applying a move.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// The square at the position is already occupied.
    #[display("Square {} is already occupied", _0)]
    SquareOccupied(Position),

    /// The game is already over.
    #[display("Game is already over")]
    GameOver,

    /// It's not this mark's turn.
    #[display("It's not {}'s turn", _0)]
    WrongPlayer(Mark),

    /// The computer holds the turn; human input is ignored.
    #[display("Waiting for the computer to move")]
    ComputerTurn,

    /// The human holds the turn; the computer may not move.
    #[display("It's the human player's turn")]
    HumanTurn,

    /// A restored board could not have arisen from alternating play.
    #[display("Inconsistent board: {}", _0)]
    InconsistentBoard(String),
}

impl std::error::Error for MoveError {}

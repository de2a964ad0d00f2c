//! Game rules for tic-tac-toe.
//!
//! Pure functions over a board snapshot. Rules are separated from board
//! storage so the game engine, the computer opponent, and the online
//! server all evaluate positions the same way.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{LINES, check_winner, is_winner};

use super::{Board, GameStatus};
use tracing::instrument;

/// Evaluates a board: a winner if any line is complete, a draw if the board
/// is full, otherwise still in progress.
#[instrument(level = "trace")]
pub fn evaluate(board: &Board) -> GameStatus {
    if let Some(winner) = check_winner(board) {
        GameStatus::Won(winner)
    } else if is_full(board) {
        GameStatus::Draw
    } else {
        GameStatus::InProgress
    }
}

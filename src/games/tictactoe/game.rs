//! Game engine for a single tic-tac-toe game.
//!
//! A game moves through `Idle → InProgress → {Won, Drawn}`. Terminal
//! conditions are re-evaluated after every move; once terminal, the game
//! rejects moves until [`Game::reset`] returns it to `Idle`.

use super::action::{Move, MoveError};
use super::position::Position;
use super::rules;
use super::types::{Board, Mark, Square};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    /// Game is ongoing.
    InProgress,
    /// Game ended in a win.
    Won(Mark),
    /// Game ended in a draw.
    Draw,
}

impl GameStatus {
    /// Returns true for a win or a draw.
    pub fn is_over(self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

/// Lifecycle phase of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Empty board, no move made yet.
    Idle,
    /// At least one move made, no terminal condition reached.
    InProgress,
    /// Ended with three in a row for the given mark.
    Won(Mark),
    /// Ended with a full board and no winner.
    Drawn,
}

/// Tic-tac-toe game engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    to_move: Mark,
    first: Mark,
    phase: Phase,
    history: Vec<Move>,
}

impl Game {
    /// Creates an idle game where `first` makes the opening move.
    #[instrument]
    pub fn new(first: Mark) -> Self {
        Self {
            board: Board::new(),
            to_move: first,
            first,
            phase: Phase::Idle,
            history: Vec::new(),
        }
    }

    /// Rebuilds a game from a stored board and the mark to move next.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::InconsistentBoard`] if the mark counts could not
    /// arise from alternating play ending with `to_move` on turn, and
    /// [`MoveError::GameOver`] if the board is already decided.
    #[instrument(skip(board), fields(board = %board.to_compact()))]
    pub fn restore(board: Board, to_move: Mark) -> Result<Self, MoveError> {
        let mover = board.count(to_move);
        let waiter = board.count(to_move.opponent());

        // Either both have moved equally (to_move opened the game) or the
        // waiting mark opened and is one ahead.
        let first = if mover == waiter {
            to_move
        } else if waiter == mover + 1 {
            to_move.opponent()
        } else {
            return Err(MoveError::InconsistentBoard(format!(
                "{} has {} marks but {} has {}",
                to_move,
                mover,
                to_move.opponent(),
                waiter
            )));
        };

        if rules::evaluate(&board).is_over() {
            return Err(MoveError::GameOver);
        }

        let phase = if board.move_count() == 0 {
            Phase::Idle
        } else {
            Phase::InProgress
        };

        debug!(?first, ?phase, "Game restored");
        Ok(Self {
            board,
            to_move,
            first,
            phase,
            history: Vec::new(),
        })
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the mark to move next.
    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    /// Returns the mark that opened this game.
    pub fn first_mark(&self) -> Mark {
        self.first
    }

    /// Returns the lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Moves applied through this engine, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Number of marks on the board.
    pub fn move_count(&self) -> usize {
        self.board.move_count()
    }

    /// Collapses the phase into a [`GameStatus`].
    pub fn status(&self) -> GameStatus {
        match self.phase {
            Phase::Idle | Phase::InProgress => GameStatus::InProgress,
            Phase::Won(mark) => GameStatus::Won(mark),
            Phase::Drawn => GameStatus::Draw,
        }
    }

    /// Returns true once the game is won or drawn.
    pub fn is_over(&self) -> bool {
        self.status().is_over()
    }

    /// Returns the winner, if any.
    pub fn winner(&self) -> Option<Mark> {
        match self.phase {
            Phase::Won(mark) => Some(mark),
            _ => None,
        }
    }

    /// Places the mark on turn at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::GameOver`] after a win or draw and
    /// [`MoveError::SquareOccupied`] if the square is taken.
    #[instrument(skip(self), fields(mark = %self.to_move))]
    pub fn place(&mut self, pos: Position) -> Result<GameStatus, MoveError> {
        self.apply(Move::new(self.to_move, pos))
    }

    /// Applies a move after checking it is legal.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::GameOver`], [`MoveError::WrongPlayer`] or
    /// [`MoveError::SquareOccupied`].
    #[instrument(skip(self), fields(mv = %mv))]
    pub fn apply(&mut self, mv: Move) -> Result<GameStatus, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        if mv.mark != self.to_move {
            return Err(MoveError::WrongPlayer(mv.mark));
        }
        if !self.board.is_empty(mv.position) {
            return Err(MoveError::SquareOccupied(mv.position));
        }

        self.board.set(mv.position, Square::Occupied(mv.mark));
        self.history.push(mv);

        let status = rules::evaluate(&self.board);
        self.phase = match status {
            GameStatus::InProgress => {
                self.to_move = mv.mark.opponent();
                Phase::InProgress
            }
            GameStatus::Won(mark) => {
                info!(winner = %mark, moves = self.move_count(), "Game won");
                Phase::Won(mark)
            }
            GameStatus::Draw => {
                info!(moves = self.move_count(), "Game drawn");
                Phase::Drawn
            }
        };

        Ok(status)
    }

    /// Clears the board and returns to `Idle` with `first` to open.
    #[instrument(skip(self))]
    pub fn reset(&mut self, first: Mark) {
        *self = Self::new(first);
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(Mark::X)
    }
}

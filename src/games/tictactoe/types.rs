//! Core domain types for tic-tac-toe.

use super::position::Position;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A mark placed on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, strum::EnumIter,
)]
pub enum Mark {
    /// The X mark. In play against the computer the human always holds X.
    #[display("X")]
    X,
    /// The O mark.
    #[display("O")]
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Returns the single-character symbol for this mark.
    pub fn symbol(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }

    /// Parses a mark from its symbol (`"X"` or `"O"`, case-insensitive).
    #[instrument]
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s.trim() {
            "X" | "x" => Some(Mark::X),
            "O" | "o" => Some(Mark::O),
            _ => None,
        }
    }
}

/// A square on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Square {
    /// Empty square.
    #[default]
    Empty,
    /// Square holding a mark.
    Occupied(Mark),
}

impl Square {
    /// Returns the mark in this square, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Square::Empty => None,
            Square::Occupied(mark) => Some(mark),
        }
    }
}

/// Error raised when untyped cells cannot be read as a board.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Malformed board: {}", reason)]
pub struct BoardParseError {
    /// What was wrong with the input.
    pub reason: String,
}

impl BoardParseError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// 3x3 tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Sets the square at the given position.
    pub fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.to_index()] = square;
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares in row-major order.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Returns the empty positions in row-major order.
    pub fn empty_positions(&self) -> Vec<Position> {
        Position::ALL
            .iter()
            .copied()
            .filter(|pos| self.is_empty(*pos))
            .collect()
    }

    /// Counts the squares holding the given mark.
    pub fn count(&self, mark: Mark) -> usize {
        self.squares
            .iter()
            .filter(|s| **s == Square::Occupied(mark))
            .count()
    }

    /// Number of marks placed so far.
    pub fn move_count(&self) -> usize {
        self.squares.iter().filter(|s| **s != Square::Empty).count()
    }

    /// Returns a copy of the board with `mark` placed at `pos`.
    ///
    /// Used by the computer opponent to simulate candidate moves.
    pub fn with_mark(&self, pos: Position, mark: Mark) -> Self {
        let mut next = *self;
        next.set(pos, Square::Occupied(mark));
        next
    }

    /// Encodes the board as nine characters: `X`, `O`, or a space for empty.
    pub fn to_compact(&self) -> String {
        self.squares
            .iter()
            .map(|s| s.mark().map_or(' ', Mark::symbol))
            .collect()
    }

    /// Decodes a board from [`Board::to_compact`] form.
    ///
    /// # Errors
    ///
    /// Returns [`BoardParseError`] unless the input is exactly nine characters
    /// drawn from `X`, `O`, space, `-` or `.`.
    #[instrument]
    pub fn from_compact(s: &str) -> Result<Self, BoardParseError> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 9 {
            return Err(BoardParseError::new(format!(
                "expected 9 cells, found {}",
                chars.len()
            )));
        }
        let mut board = Board::new();
        for (pos, c) in Position::ALL.iter().zip(chars) {
            let square = match c {
                'X' | 'x' => Square::Occupied(Mark::X),
                'O' | 'o' => Square::Occupied(Mark::O),
                ' ' | '-' | '.' => Square::Empty,
                other => {
                    return Err(BoardParseError::new(format!("unexpected cell '{}'", other)));
                }
            };
            board.set(*pos, square);
        }
        Ok(board)
    }

    /// Encodes the board as nine cell strings (`""`, `"X"` or `"O"`).
    pub fn to_cells(&self) -> Vec<String> {
        self.squares
            .iter()
            .map(|s| s.mark().map(|m| m.to_string()).unwrap_or_default())
            .collect()
    }

    /// Decodes a board from nine cell strings as served by the game server.
    ///
    /// # Errors
    ///
    /// Returns [`BoardParseError`] unless there are exactly nine cells, each
    /// empty, `"X"` or `"O"`.
    #[instrument(skip(cells), fields(len = cells.len()))]
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Result<Self, BoardParseError> {
        if cells.len() != 9 {
            return Err(BoardParseError::new(format!(
                "expected 9 cells, found {}",
                cells.len()
            )));
        }
        let mut board = Board::new();
        for (pos, cell) in Position::ALL.iter().zip(cells) {
            let cell = cell.as_ref().trim();
            let square = if cell.is_empty() {
                Square::Empty
            } else {
                Square::Occupied(
                    Mark::from_symbol(cell)
                        .ok_or_else(|| BoardParseError::new(format!("unexpected cell '{}'", cell)))?,
                )
            };
            board.set(*pos, square);
        }
        Ok(board)
    }

    /// Formats the board as a human-readable string, numbering empty squares 1-9.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.squares[pos] {
                    Square::Empty => (pos + 1).to_string(),
                    Square::Occupied(mark) => mark.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

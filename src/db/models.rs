//! Database models and domain types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use std::str::FromStr;
use tracing::{instrument, warn};

use crate::db::{DbError, schema};
use crate::games::tictactoe::{Board, Difficulty, Mark};
use crate::local::{COMPUTER_MARK, GameMode, HUMAN_MARK, MatchResult, SavedMatch};

/// A finished game as stored in `game_results`.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::game_results)]
pub struct GameRecord {
    id: i32,
    mode: String,
    winner: String,
    difficulty: Option<String>,
    moves_count: i32,
    played_at: NaiveDateTime,
}

impl GameRecord {
    /// Parses the stored winner column back into a [`MatchResult`].
    #[instrument(skip(self), fields(winner = %self.winner))]
    pub fn parse_result(&self) -> Result<MatchResult, DbError> {
        result_from_db(&self.winner)
    }

    /// Parses the stored mode column.
    pub fn parse_mode(&self) -> Result<GameMode, DbError> {
        GameMode::from_str(&self.mode)
            .map_err(|e| DbError::corrupt(format!("Invalid mode '{}': {}", self.mode, e)))
    }
}

/// Insertable row for recording a finished game.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::game_results)]
pub struct NewGameRecord {
    mode: String,
    winner: String,
    difficulty: Option<String>,
    moves_count: i32,
}

impl NewGameRecord {
    /// Builds a record from a finished local game.
    ///
    /// The difficulty is only kept for games against the computer.
    pub fn from_result(
        mode: GameMode,
        result: MatchResult,
        difficulty: Difficulty,
        moves: usize,
    ) -> Self {
        let difficulty = match mode {
            GameMode::VsComputer => Some(difficulty.to_string()),
            GameMode::TwoPlayers => None,
        };
        Self::new(
            mode.to_string(),
            result_to_db(result).to_string(),
            difficulty,
            i32::try_from(moves).unwrap_or(i32::MAX),
        )
    }
}

/// Converts a result to the string stored in the `winner` column.
pub(crate) fn result_to_db(result: MatchResult) -> &'static str {
    match result {
        MatchResult::Win(Mark::X) => "x",
        MatchResult::Win(Mark::O) => "o",
        MatchResult::Tie => "tie",
    }
}

/// Parses a `winner` column value.
///
/// # Errors
///
/// Returns [`DbError`] if the value is not `x`, `o` or `tie`.
pub(crate) fn result_from_db(s: &str) -> Result<MatchResult, DbError> {
    match s {
        "x" => Ok(MatchResult::Win(Mark::X)),
        "o" => Ok(MatchResult::Win(Mark::O)),
        "tie" => Ok(MatchResult::Tie),
        other => Err(DbError::corrupt(format!("Invalid winner: {}", other))),
    }
}

/// Win and tie counts for one game mode.
///
/// In vs-computer mode X is the human and O the computer; in two-player
/// mode X is player 1 and O player 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, new)]
pub struct Scoreboard {
    mode: GameMode,
    x_wins: i64,
    o_wins: i64,
    ties: i64,
}

impl Scoreboard {
    /// An all-zero scoreboard.
    pub fn empty(mode: GameMode) -> Self {
        Self::new(mode, 0, 0, 0)
    }

    /// Tallies stored winner values. Unknown values are skipped with a warning.
    #[instrument(skip(winners))]
    pub fn tally<'a>(mode: GameMode, winners: impl IntoIterator<Item = &'a str>) -> Self {
        let mut board = Self::empty(mode);
        for winner in winners {
            match result_from_db(winner) {
                Ok(result) => board.add(result),
                Err(e) => warn!(error = %e, "Skipping unknown winner value"),
            }
        }
        board
    }

    /// Counts one more finished game.
    pub fn add(&mut self, result: MatchResult) {
        match result {
            MatchResult::Win(Mark::X) => self.x_wins += 1,
            MatchResult::Win(Mark::O) => self.o_wins += 1,
            MatchResult::Tie => self.ties += 1,
        }
    }

    /// Wins by the human in vs-computer mode.
    pub fn human_wins(&self) -> i64 {
        self.wins_of(HUMAN_MARK)
    }

    /// Wins by the computer in vs-computer mode.
    pub fn computer_wins(&self) -> i64 {
        self.wins_of(COMPUTER_MARK)
    }

    /// Wins by `mark`.
    pub fn wins_of(&self, mark: Mark) -> i64 {
        match mark {
            Mark::X => self.x_wins,
            Mark::O => self.o_wins,
        }
    }

    /// Games counted.
    pub fn total(&self) -> i64 {
        self.x_wins + self.o_wins + self.ties
    }
}

/// The saved unfinished game row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::saved_games)]
pub struct SavedGameRow {
    id: i32,
    mode: String,
    board: String,
    to_move: String,
    difficulty: String,
    saved_at: NaiveDateTime,
}

impl SavedGameRow {
    /// Decodes the row into a [`SavedMatch`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any column fails to parse.
    #[instrument(skip(self), fields(board = %self.board))]
    pub fn to_saved_match(&self) -> Result<SavedMatch, DbError> {
        let mode = GameMode::from_str(&self.mode)
            .map_err(|e| DbError::corrupt(format!("Invalid mode '{}': {}", self.mode, e)))?;
        let board = Board::from_compact(&self.board)
            .map_err(|e| DbError::corrupt(format!("Invalid saved board: {}", e)))?;
        let to_move = Mark::from_symbol(&self.to_move)
            .ok_or_else(|| DbError::corrupt(format!("Invalid mark '{}'", self.to_move)))?;
        let difficulty = Difficulty::from_str(&self.difficulty).map_err(|e| {
            DbError::corrupt(format!("Invalid difficulty '{}': {}", self.difficulty, e))
        })?;
        Ok(SavedMatch {
            mode,
            board,
            to_move,
            difficulty,
        })
    }
}

/// Insertable saved game; the id is always 1.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::saved_games)]
pub struct NewSavedGame {
    id: i32,
    mode: String,
    board: String,
    to_move: String,
    difficulty: String,
}

impl From<&SavedMatch> for NewSavedGame {
    fn from(saved: &SavedMatch) -> Self {
        Self {
            id: 1,
            mode: saved.mode.to_string(),
            board: saved.board.to_compact(),
            to_move: saved.to_move.symbol().to_string(),
            difficulty: saved.difficulty.to_string(),
        }
    }
}

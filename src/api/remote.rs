//! Local mirror of a game hosted on the server.
//!
//! The server is authoritative. The mirror only pre-checks local clicks so
//! obviously invalid moves never leave the machine, and overwrites its board
//! with whatever the server reports.

use super::client::ApiError;
use super::models::{
    CreateGameResponse, GameStateResponse, JoinGameResponse, MoveResponse, RemoteResult,
    RemoteStatus,
};
use crate::games::tictactoe::{Board, Mark, MoveError, Position};
use tracing::{debug, info, instrument};

/// How a finished online game ended for us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOutcome {
    /// We completed a line.
    Won,
    /// The opponent completed a line.
    Lost,
    /// Full board, no line.
    Draw,
}

impl RemoteOutcome {
    /// End-of-game message.
    pub fn message(self) -> &'static str {
        match self {
            Self::Won => "You won!",
            Self::Lost => "You lost",
            Self::Draw => "It's a draw!",
        }
    }
}

/// Our view of an online game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteGame {
    game_id: String,
    my_mark: Mark,
    board: Board,
    turn: Mark,
    status: RemoteStatus,
    result: RemoteResult,
}

impl RemoteGame {
    /// Starts a mirror for `game_id` where we hold `my_mark`.
    pub fn new(game_id: String, my_mark: Mark, status: RemoteStatus) -> Self {
        Self {
            game_id,
            my_mark,
            board: Board::new(),
            turn: Mark::X,
            status,
            result: RemoteResult::Pending,
        }
    }

    /// Mirror for a game we just created.
    pub fn from_created(created: &CreateGameResponse) -> Self {
        Self::new(
            created.game_id.clone(),
            created.player_symbol,
            RemoteStatus::Waiting,
        )
    }

    /// Mirror for a game we just joined.
    pub fn from_joined(joined: &JoinGameResponse) -> Self {
        Self::new(
            joined.game_id.clone(),
            joined.player_symbol,
            joined.new_status,
        )
    }

    /// Game id.
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// First eight characters of the game id, for display.
    pub fn short_id(&self) -> &str {
        let end = self
            .game_id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.game_id.len());
        &self.game_id[..end]
    }

    /// Our mark.
    pub fn my_mark(&self) -> Mark {
        self.my_mark
    }

    /// Last known board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mark on turn.
    pub fn turn(&self) -> Mark {
        self.turn
    }

    /// Last known status.
    pub fn status(&self) -> RemoteStatus {
        self.status
    }

    /// Returns true once the server reports the game decided.
    pub fn is_finished(&self) -> bool {
        self.status == RemoteStatus::Finished || self.result.is_final()
    }

    /// Returns true when both players are seated and it is our move.
    pub fn is_my_turn(&self) -> bool {
        self.status == RemoteStatus::InProgress && self.turn == self.my_mark
    }

    /// Checks a local click before sending it.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::GameOver`] once finished,
    /// [`MoveError::WrongPlayer`] when it is not our turn and
    /// [`MoveError::SquareOccupied`] for a taken square.
    #[instrument(skip(self), fields(game_id = %self.game_id))]
    pub fn check_move(&self, pos: Position) -> Result<(), MoveError> {
        if self.is_finished() {
            return Err(MoveError::GameOver);
        }
        if !self.is_my_turn() {
            return Err(MoveError::WrongPlayer(self.my_mark));
        }
        if !self.board.is_empty(pos) {
            return Err(MoveError::SquareOccupied(pos));
        }
        Ok(())
    }

    /// Overwrites the mirror with a polled state.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Protocol`] if the board is malformed; the mirror
    /// is left untouched in that case.
    #[instrument(skip(self, state), fields(game_id = %self.game_id, status = %state.status))]
    pub fn apply_state(&mut self, state: &GameStateResponse) -> Result<(), ApiError> {
        let board = parse_board(&state.board)?;
        self.board = board;
        self.turn = state.current_turn;
        self.status = state.status;
        self.result = state.result;
        debug!(board = %self.board.to_compact(), turn = %self.turn, "Applied server state");
        Ok(())
    }

    /// Overwrites the mirror with the response to our move.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Protocol`] if the board is malformed.
    #[instrument(skip(self, response), fields(game_id = %self.game_id))]
    pub fn apply_move_response(&mut self, response: &MoveResponse) -> Result<(), ApiError> {
        let board = parse_board(&response.board)?;
        self.board = board;
        self.turn = response.next_turn;
        self.result = response.final_result;
        if self.result.is_final() {
            self.status = RemoteStatus::Finished;
            info!(result = %self.result, "Online game finished");
        }
        Ok(())
    }

    /// Our outcome, once finished.
    pub fn outcome(&self) -> Option<RemoteOutcome> {
        match self.result {
            RemoteResult::Pending => None,
            RemoteResult::Draw => Some(RemoteOutcome::Draw),
            result if result.winner() == Some(self.my_mark) => Some(RemoteOutcome::Won),
            _ => Some(RemoteOutcome::Lost),
        }
    }

    /// One-line status for the UI.
    pub fn status_line(&self) -> String {
        let header = format!("Game {} | You are {}", self.short_id(), self.my_mark);
        let detail = if let Some(outcome) = self.outcome() {
            outcome.message().to_string()
        } else if self.status == RemoteStatus::Waiting {
            "Waiting for an opponent".to_string()
        } else if self.is_my_turn() {
            format!("Your turn ({})", self.my_mark)
        } else {
            format!("Opponent's turn ({})", self.turn)
        };
        format!("{} | {}", header, detail)
    }
}

fn parse_board(cells: &[String]) -> Result<Board, ApiError> {
    Board::from_cells(cells).map_err(|e| ApiError::Protocol {
        message: format!("Bad board from server: {}", e),
    })
}

//! Online game screen state.

use crossterm::event::KeyCode;
use tracing::{debug, info, instrument, warn};

use super::app::Action;
use super::input::{self, Command};
use super::ui::Screen;
use crate::api::{GameApiClient, RemoteEvent, RemoteGame};
use crate::games::tictactoe::{MoveError, Position};

const ONLINE_HELP: &str = "arrows/1-9 select · enter play · q quit";

/// Remote mirror plus cursor and the last transient error.
pub struct OnlineApp {
    client: GameApiClient,
    player_id: String,
    game: RemoteGame,
    cursor: Position,
    notice: Option<String>,
}

impl OnlineApp {
    /// Creates the screen for `game`, played as `player_id`.
    pub fn new(client: GameApiClient, player_id: String, game: RemoteGame) -> Self {
        Self {
            client,
            player_id,
            game,
            cursor: Position::Center,
            notice: None,
        }
    }

    /// The remote mirror.
    pub fn game(&self) -> &RemoteGame {
        &self.game
    }

    /// Pending transient message, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Handles one key press, sending a move when one is chosen.
    #[instrument(skip(self), fields(game_id = %self.game.game_id()))]
    pub async fn handle_key(&mut self, key: KeyCode) -> Action {
        match input::command_for(key) {
            Command::Cursor(key) => self.cursor = input::move_cursor(self.cursor, key),
            Command::PlayCursor => self.play(self.cursor).await,
            Command::PlayAt(pos) => {
                self.cursor = pos;
                self.play(pos).await;
            }
            Command::Quit => return Action::Quit,
            Command::NewGame
            | Command::CycleDifficulty
            | Command::ResetScores
            | Command::Ignore => {}
        }
        Action::Continue
    }

    async fn play(&mut self, pos: Position) {
        if let Err(e) = self.game.check_move(pos) {
            debug!(error = %e, "Move refused locally");
            self.notice = Some(
                match e {
                    MoveError::GameOver => "The game is over",
                    MoveError::SquareOccupied(_) => "That square is taken",
                    _ => "Not your turn",
                }
                .to_string(),
            );
            return;
        }

        match self
            .client
            .make_move(self.game.game_id(), &self.player_id, pos)
            .await
        {
            Ok(response) => match self.game.apply_move_response(&response) {
                Ok(()) => self.notice = None,
                Err(e) => self.notice = Some(e.user_message()),
            },
            Err(e) => {
                warn!(error = %e, "Move failed");
                self.notice = Some(format!("Error: {}", e.user_message()));
            }
        }
    }

    /// Applies an update from the poller.
    pub fn handle_event(&mut self, event: RemoteEvent) {
        match event {
            RemoteEvent::State(state) => {
                if let Err(e) = self.game.apply_state(&state) {
                    self.notice = Some(e.user_message());
                } else {
                    self.notice = None;
                }
            }
            RemoteEvent::Finished(state) => {
                if let Err(e) = self.game.apply_state(&state) {
                    self.notice = Some(e.user_message());
                }
                info!(outcome = ?self.game.outcome(), "Online game finished");
            }
            RemoteEvent::PollFailed(message) => {
                self.notice = Some(format!("Error: {}", message));
            }
        }
    }

    /// Builds the frame contents.
    pub fn screen(&self) -> Screen<'_> {
        let mut info = vec![format!("Game {} · you are {}", self.game.short_id(), self.game.my_mark())];
        if let Some(notice) = &self.notice {
            info.push(notice.clone());
        }
        Screen {
            title: "Triqui · Online",
            board: self.game.board(),
            cursor: self.cursor,
            status: self.game.status_line(),
            info,
            help: ONLINE_HELP,
        }
    }
}

//! Local game screen state and key handling.
//!
//! Kept free of terminal I/O so it can be driven from tests: the event loop
//! feeds it keys and clock ticks, then renders [`LocalApp::screen`].

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info, instrument, warn};

use super::input::{self, Command};
use super::ui::Screen;
use crate::db::{DbError, GameRepository, NewGameRecord, Scoreboard};
use crate::games::tictactoe::{Difficulty, Position};
use crate::local::{COMPUTER_MARK, GameMode, LocalMatch};

const LOCAL_HELP: &str = "arrows/1-9 select · enter play · n new · d difficulty · r reset · q quit";

/// What the event loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep running.
    Continue,
    /// Difficulty changed; persist it and keep running.
    DifficultyChanged(Difficulty),
    /// Leave the screen.
    Quit,
}

/// Local match plus cursor, scoreboard and the pending computer move.
pub struct LocalApp<R: Rng = StdRng> {
    local: LocalMatch<R>,
    repo: GameRepository,
    cursor: Position,
    scores: Scoreboard,
    notice: Option<String>,
    computer_delay: Duration,
    computer_due: Option<Instant>,
}

impl<R: Rng> LocalApp<R> {
    /// Wraps `local`, loading the scoreboard for its mode.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the scoreboard cannot be read.
    #[instrument(skip(local, repo), fields(mode = %local.mode()))]
    pub fn new(
        local: LocalMatch<R>,
        repo: GameRepository,
        computer_delay: Duration,
        now: Instant,
    ) -> Result<Self, DbError> {
        let scores = repo.scoreboard(local.mode())?;
        let mut app = Self {
            local,
            repo,
            cursor: Position::Center,
            scores,
            notice: None,
            computer_delay,
            computer_due: None,
        };
        app.schedule_computer(now);
        Ok(app)
    }

    /// The local match.
    pub fn local(&self) -> &LocalMatch<R> {
        &self.local
    }

    /// The scoreboard for the current mode.
    pub fn scores(&self) -> &Scoreboard {
        &self.scores
    }

    /// Highlighted square.
    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Pending transient message, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// When the computer will move, if it is waiting to.
    pub fn computer_due(&self) -> Option<Instant> {
        self.computer_due
    }

    /// Handles one key press.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if recording a result, resetting scores or saving
    /// on quit fails.
    #[instrument(skip(self, now))]
    pub fn handle_key(&mut self, key: KeyCode, now: Instant) -> Result<Action, DbError> {
        match input::command_for(key) {
            Command::Cursor(key) => {
                self.cursor = input::move_cursor(self.cursor, key);
            }
            Command::PlayCursor => self.play(self.cursor, now)?,
            Command::PlayAt(pos) => {
                self.cursor = pos;
                self.play(pos, now)?;
            }
            Command::NewGame => self.new_game(now)?,
            Command::CycleDifficulty => {
                let next = self.local.difficulty().next();
                self.local.set_difficulty(next);
                self.notice = Some(format!("Difficulty: {}", next.label()));
                return Ok(Action::DifficultyChanged(next));
            }
            Command::ResetScores => {
                self.repo.reset_scores(Some(self.local.mode()))?;
                self.scores = Scoreboard::empty(self.local.mode());
                self.notice = Some("Scores reset".to_string());
            }
            Command::Quit => {
                self.save_or_clear()?;
                return Ok(Action::Quit);
            }
            Command::Ignore => {}
        }
        Ok(Action::Continue)
    }

    /// Plays the computer's move once its delay has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if recording a finished game fails.
    pub fn tick(&mut self, now: Instant) -> Result<(), DbError> {
        let Some(due) = self.computer_due else {
            return Ok(());
        };
        if now < due {
            return Ok(());
        }
        self.computer_due = None;

        match self.local.play_computer() {
            Ok((selection, _)) => {
                debug!(position = %selection.position, tier = ?selection.tier, "Computer played");
                self.notice = None;
                self.finish_if_over()?;
            }
            Err(e) => warn!(error = %e, "Computer could not move"),
        }
        Ok(())
    }

    fn play(&mut self, pos: Position, now: Instant) -> Result<(), DbError> {
        if self.local.game().is_over() {
            self.notice = Some("Game over. Press n for a new game".to_string());
            return Ok(());
        }
        match self.local.play_human(pos) {
            Ok(_) => {
                self.notice = None;
                self.finish_if_over()?;
                self.schedule_computer(now);
            }
            Err(e) => {
                debug!(error = %e, "Move rejected");
                self.notice = Some(e.to_string());
            }
        }
        Ok(())
    }

    #[instrument(skip(self, now))]
    fn new_game(&mut self, now: Instant) -> Result<(), DbError> {
        let first = self.local.new_game();
        self.repo.clear_saved_game()?;
        self.notice = Some(match (self.local.mode(), first) {
            (GameMode::VsComputer, COMPUTER_MARK) => "New game. The computer starts".to_string(),
            (GameMode::VsComputer, _) => "New game. You start".to_string(),
            (GameMode::TwoPlayers, mark) => format!("New game. {} starts", mark),
        });
        self.computer_due = None;
        self.schedule_computer(now);
        Ok(())
    }

    fn schedule_computer(&mut self, now: Instant) {
        if self.local.is_computer_turn() && self.computer_due.is_none() {
            self.computer_due = Some(now + self.computer_delay);
        }
    }

    fn finish_if_over(&mut self) -> Result<(), DbError> {
        let Some(result) = self.local.take_result() else {
            return Ok(());
        };
        let record = NewGameRecord::from_result(
            self.local.mode(),
            result,
            self.local.difficulty(),
            self.local.game().move_count(),
        );
        self.repo.record_result(record)?;
        self.repo.clear_saved_game()?;
        self.scores.add(result);
        info!(?result, "Local game finished");
        Ok(())
    }

    fn save_or_clear(&self) -> Result<(), DbError> {
        match self.local.snapshot() {
            Some(saved) if saved.board.move_count() > 0 => self.repo.save_game(&saved),
            _ => self.repo.clear_saved_game().map(|_| ()),
        }
    }

    /// Builds the frame contents.
    pub fn screen(&self) -> Screen<'_> {
        let mode = self.local.mode();
        let mut info = vec![match mode {
            GameMode::VsComputer => format!(
                "You {} | Computer {} | Ties {}",
                self.scores.human_wins(),
                self.scores.computer_wins(),
                self.scores.ties()
            ),
            GameMode::TwoPlayers => format!(
                "Player 1 (X) {} | Player 2 (O) {} | Ties {}",
                self.scores.x_wins(),
                self.scores.o_wins(),
                self.scores.ties()
            ),
        }];
        if mode == GameMode::VsComputer {
            info.push(format!("Difficulty: {}", self.local.difficulty().label()));
        }
        if let Some(notice) = &self.notice {
            info.push(notice.clone());
        }

        Screen {
            title: match mode {
                GameMode::VsComputer => "Triqui · vs Computer",
                GameMode::TwoPlayers => "Triqui · Two Players",
            },
            board: self.local.game().board(),
            cursor: self.cursor,
            status: self.local.status_line(),
            info,
            help: LOCAL_HELP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::Mark;
    use crate::local::{HUMAN_MARK, MatchResult};
    use rand::SeedableRng;

    fn app(mode: GameMode, opener: Mark) -> (LocalApp, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let repo = GameRepository::open(dir.path().join("t.db").to_string_lossy()).unwrap();
        let mut local = LocalMatch::with_rng(mode, Difficulty::Expert, StdRng::seed_from_u64(1));
        while local.game().to_move() != opener {
            local.new_game();
        }
        let app = LocalApp::new(local, repo, Duration::from_millis(500), Instant::now()).unwrap();
        (app, dir)
    }

    #[test]
    fn test_computer_waits_for_delay() {
        let (mut app, _dir) = app(GameMode::VsComputer, HUMAN_MARK);
        let t0 = Instant::now();
        app.handle_key(KeyCode::Char('1'), t0).unwrap();
        assert_eq!(app.local().game().move_count(), 1);
        assert!(app.computer_due().is_some());

        app.tick(t0 + Duration::from_millis(100)).unwrap();
        assert_eq!(app.local().game().move_count(), 1);

        app.tick(t0 + Duration::from_millis(600)).unwrap();
        assert_eq!(app.local().game().move_count(), 2);
        assert!(app.computer_due().is_none());
    }

    #[test]
    fn test_keys_ignored_on_computer_turn() {
        let (mut app, _dir) = app(GameMode::VsComputer, COMPUTER_MARK);
        assert!(app.computer_due().is_some());
        app.handle_key(KeyCode::Char('5'), Instant::now()).unwrap();
        assert_eq!(app.local().game().move_count(), 0);
        assert!(app.notice().is_some());
    }

    #[test]
    fn test_two_player_win_is_recorded_once() {
        let (mut app, _dir) = app(GameMode::TwoPlayers, Mark::X);
        let now = Instant::now();
        for key in ['1', '4', '2', '5', '3'] {
            app.handle_key(KeyCode::Char(key), now).unwrap();
        }
        assert_eq!(app.local().result(), Some(MatchResult::Win(Mark::X)));
        assert_eq!(app.scores().x_wins(), &1);

        app.handle_key(KeyCode::Char('9'), now).unwrap();
        assert_eq!(app.scores().total(), 1);
        assert_eq!(app.repo.scoreboard(GameMode::TwoPlayers).unwrap().total(), 1);
    }

    #[test]
    fn test_quit_saves_unfinished_game() {
        let (mut app, _dir) = app(GameMode::TwoPlayers, Mark::O);
        let now = Instant::now();
        app.handle_key(KeyCode::Char('5'), now).unwrap();
        assert_eq!(app.handle_key(KeyCode::Char('q'), now).unwrap(), Action::Quit);
        let saved = app.repo.load_saved_game().unwrap().unwrap();
        assert_eq!(saved.to_move, Mark::X);
        assert_eq!(saved.board.move_count(), 1);
    }

    #[test]
    fn test_difficulty_cycle_and_reset() {
        let (mut app, _dir) = app(GameMode::VsComputer, HUMAN_MARK);
        let action = app.handle_key(KeyCode::Char('d'), Instant::now()).unwrap();
        assert_eq!(action, Action::DifficultyChanged(Difficulty::Easy));
        assert_eq!(app.local().difficulty(), Difficulty::Easy);

        app.handle_key(KeyCode::Char('r'), Instant::now()).unwrap();
        assert_eq!(app.scores().total(), 0);
        assert_eq!(app.notice(), Some("Scores reset"));
    }

    #[test]
    fn test_cursor_enter_plays() {
        let (mut app, _dir) = app(GameMode::TwoPlayers, Mark::X);
        let now = Instant::now();
        app.handle_key(KeyCode::Up, now).unwrap();
        app.handle_key(KeyCode::Enter, now).unwrap();
        assert_eq!(app.cursor(), Position::TopCenter);
        assert!(!app.local().game().board().is_empty(Position::TopCenter));
    }
}

//! Local play: two humans at one keyboard, or a human against the computer.

use crate::games::tictactoe::{
    Board, ComputerOpponent, Difficulty, Game, GameStatus, Mark, MoveError, Position, Selection,
};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Mark held by the human when playing the computer.
pub const HUMAN_MARK: Mark = Mark::X;

/// Mark held by the computer.
pub const COMPUTER_MARK: Mark = Mark::O;

/// Who sits across the board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameMode {
    /// Human (X) against the computer (O).
    #[default]
    VsComputer,
    /// Two humans sharing the board.
    TwoPlayers,
}

impl GameMode {
    /// Returns the display label for this mode.
    pub fn label(self) -> &'static str {
        match self {
            Self::VsComputer => "vs Computer",
            Self::TwoPlayers => "Two Players",
        }
    }
}

/// How a finished local game ended, from the scoreboard's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchResult {
    /// The mark that completed a line.
    Win(Mark),
    /// Board filled with no line.
    Tie,
}

impl MatchResult {
    /// Reads the result off a terminal status; `None` while in progress.
    pub fn from_status(status: GameStatus) -> Option<Self> {
        match status {
            GameStatus::InProgress => None,
            GameStatus::Won(mark) => Some(Self::Win(mark)),
            GameStatus::Draw => Some(Self::Tie),
        }
    }

    /// Short message for the status line.
    pub fn message(self, mode: GameMode) -> String {
        match (mode, self) {
            (GameMode::VsComputer, Self::Win(HUMAN_MARK)) => "You win!".to_string(),
            (GameMode::VsComputer, Self::Win(_)) => "The computer wins!".to_string(),
            (GameMode::TwoPlayers, Self::Win(Mark::X)) => "Player 1 (X) wins!".to_string(),
            (GameMode::TwoPlayers, Self::Win(Mark::O)) => "Player 2 (O) wins!".to_string(),
            (_, Self::Tie) => "It's a tie!".to_string(),
        }
    }
}

/// Snapshot of an unfinished local game, for persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMatch {
    /// Game mode.
    pub mode: GameMode,
    /// Board at the time of saving.
    pub board: Board,
    /// Mark on turn.
    pub to_move: Mark,
    /// Computer difficulty in effect.
    pub difficulty: Difficulty,
}

/// A local match: one game at a time, replayed with a coin-flipped opener.
#[derive(Debug, Clone)]
pub struct LocalMatch<R = StdRng> {
    mode: GameMode,
    game: Game,
    computer: ComputerOpponent,
    rng: R,
    recorded: bool,
}

impl LocalMatch<StdRng> {
    /// Creates a match seeded from OS entropy, with a coin-flipped opener.
    #[instrument]
    pub fn new(mode: GameMode, difficulty: Difficulty) -> Self {
        Self::with_rng(mode, difficulty, StdRng::from_entropy())
    }
}

impl<R: Rng> LocalMatch<R> {
    /// Creates a match driven by the given random source.
    #[instrument(skip(rng))]
    pub fn with_rng(mode: GameMode, difficulty: Difficulty, mut rng: R) -> Self {
        let first = coin_flip(&mut rng);
        info!(%first, "New local match");
        Self {
            mode,
            game: Game::new(first),
            computer: ComputerOpponent::new(COMPUTER_MARK, difficulty),
            rng,
            recorded: false,
        }
    }

    /// Resumes a saved game.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] if the saved board is inconsistent or finished.
    #[instrument(skip(rng), fields(mode = %saved.mode, board = %saved.board.to_compact()))]
    pub fn resume(saved: SavedMatch, rng: R) -> Result<Self, MoveError> {
        let game = Game::restore(saved.board, saved.to_move)?;
        info!("Resumed saved match");
        Ok(Self {
            mode: saved.mode,
            game,
            computer: ComputerOpponent::new(COMPUTER_MARK, saved.difficulty),
            rng,
            recorded: false,
        })
    }

    /// The game mode.
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// The current game.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// The current computer difficulty.
    pub fn difficulty(&self) -> Difficulty {
        self.computer.difficulty()
    }

    /// Changes the computer difficulty from the next computer move on.
    #[instrument(skip(self))]
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.computer.set_difficulty(difficulty);
    }

    /// True when the computer holds the turn in an unfinished game.
    pub fn is_computer_turn(&self) -> bool {
        self.mode == GameMode::VsComputer
            && !self.game.is_over()
            && self.game.to_move() == self.computer.mark()
    }

    /// Plays a human move at `pos` for whichever mark is on turn.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::ComputerTurn`] while the computer is to move,
    /// plus any rule violation from [`Game::place`].
    #[instrument(skip(self))]
    pub fn play_human(&mut self, pos: Position) -> Result<GameStatus, MoveError> {
        if self.is_computer_turn() {
            return Err(MoveError::ComputerTurn);
        }
        self.game.place(pos)
    }

    /// Lets the computer choose and play its move.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::HumanTurn`] if the computer is not on turn and
    /// [`MoveError::GameOver`] if no square is left.
    #[instrument(skip(self))]
    pub fn play_computer(&mut self) -> Result<(Selection, GameStatus), MoveError> {
        if self.game.is_over() {
            return Err(MoveError::GameOver);
        }
        if !self.is_computer_turn() {
            return Err(MoveError::HumanTurn);
        }
        let selection = self
            .computer
            .select(self.game.board(), &mut self.rng)
            .ok_or(MoveError::GameOver)?;
        let status = self.game.place(selection.position)?;
        debug!(position = %selection.position, tier = ?selection.tier, "Computer moved");
        Ok((selection, status))
    }

    /// Result of the finished game, handed out once so it is recorded once.
    pub fn take_result(&mut self) -> Option<MatchResult> {
        if self.recorded {
            return None;
        }
        let result = MatchResult::from_status(self.game.status())?;
        self.recorded = true;
        Some(result)
    }

    /// Result of the current game without consuming it.
    pub fn result(&self) -> Option<MatchResult> {
        MatchResult::from_status(self.game.status())
    }

    /// Starts a new game with a coin-flipped opener.
    #[instrument(skip(self))]
    pub fn new_game(&mut self) -> Mark {
        let first = coin_flip(&mut self.rng);
        self.game.reset(first);
        self.recorded = false;
        info!(%first, "New game");
        first
    }

    /// Snapshot for persistence; `None` once the game is over.
    pub fn snapshot(&self) -> Option<SavedMatch> {
        (!self.game.is_over()).then(|| SavedMatch {
            mode: self.mode,
            board: *self.game.board(),
            to_move: self.game.to_move(),
            difficulty: self.computer.difficulty(),
        })
    }

    /// Status line for the player(s).
    pub fn status_line(&self) -> String {
        if let Some(result) = self.result() {
            return result.message(self.mode);
        }
        match (self.mode, self.game.to_move()) {
            (GameMode::VsComputer, HUMAN_MARK) => format!("Your turn ({})", HUMAN_MARK),
            (GameMode::VsComputer, mark) => format!("Computer's turn ({})", mark),
            (GameMode::TwoPlayers, Mark::X) => "Turn: Player 1 (X)".to_string(),
            (GameMode::TwoPlayers, Mark::O) => "Turn: Player 2 (O)".to_string(),
        }
    }
}

/// Picks the opening mark with a fair coin.
fn coin_flip<R: Rng + ?Sized>(rng: &mut R) -> Mark {
    if rng.gen_bool(0.5) { Mark::X } else { Mark::O }
}

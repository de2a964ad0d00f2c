//! Computer opponent with tiered difficulty.
//!
//! Move selection is a fixed-priority procedure. Each tier scans the board
//! in row-major order and the first square satisfying the tier is played:
//!
//! | Difficulty | Tiers, highest priority first                         |
//! |------------|-------------------------------------------------------|
//! | Easy       | random empty square                                   |
//! | Harder     | win, random                                           |
//! | Expert     | win, block, center, first free corner, random         |

use super::position::Position;
use super::rules;
use super::types::{Board, Mark};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Computer-opponent strategy tier.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    /// Random empty square.
    Easy,
    /// Takes a win when one is available, otherwise random.
    Harder,
    /// Wins, blocks, then prefers center and corners.
    #[default]
    Expert,
}

impl Difficulty {
    /// Returns the display label for this level.
    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Harder => "Harder",
            Self::Expert => "Expert",
        }
    }

    /// Cycles Easy → Harder → Expert → Easy.
    pub fn next(self) -> Self {
        match self {
            Self::Easy => Self::Harder,
            Self::Harder => Self::Expert,
            Self::Expert => Self::Easy,
        }
    }
}

/// Which priority tier produced a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Completes a line for the computer.
    Win,
    /// Occupies the square the opponent needs to complete a line.
    Block,
    /// Takes the center square.
    Center,
    /// Takes a free corner.
    Corner,
    /// Uniform choice among empty squares.
    Random,
}

/// A chosen square and the tier that chose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    /// Square to play.
    pub position: Position,
    /// Tier that produced the square.
    pub tier: Tier,
}

/// The computer player: a mark and a difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputerOpponent {
    mark: Mark,
    difficulty: Difficulty,
}

impl ComputerOpponent {
    /// Creates a computer opponent playing `mark`.
    pub fn new(mark: Mark, difficulty: Difficulty) -> Self {
        Self { mark, difficulty }
    }

    /// The mark the computer plays.
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// The current difficulty.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Changes the difficulty; applies from the next selection.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Picks the square to play, or `None` if the board is full.
    #[instrument(skip(self, board, rng), fields(mark = %self.mark, difficulty = %self.difficulty, board = %board.to_compact()))]
    pub fn select<R: Rng + ?Sized>(&self, board: &Board, rng: &mut R) -> Option<Selection> {
        let me = self.mark;
        let selection = match self.difficulty {
            Difficulty::Easy => random_move(board, rng).map(|p| (p, Tier::Random)),
            Difficulty::Harder => winning_move(board, me)
                .map(|p| (p, Tier::Win))
                .or_else(|| random_move(board, rng).map(|p| (p, Tier::Random))),
            Difficulty::Expert => winning_move(board, me)
                .map(|p| (p, Tier::Win))
                .or_else(|| blocking_move(board, me).map(|p| (p, Tier::Block)))
                .or_else(|| {
                    board
                        .is_empty(Position::Center)
                        .then_some((Position::Center, Tier::Center))
                })
                .or_else(|| first_free_corner(board).map(|p| (p, Tier::Corner)))
                .or_else(|| random_move(board, rng).map(|p| (p, Tier::Random))),
        }
        .map(|(position, tier)| Selection { position, tier });

        debug!(?selection, "Computer selected move");
        selection
    }

    /// Convenience wrapper returning only the square.
    pub fn pick_move<R: Rng + ?Sized>(&self, board: &Board, rng: &mut R) -> Option<Position> {
        self.select(board, rng).map(|s| s.position)
    }
}

/// First empty square (row-major) where `mark` would complete a line.
#[instrument(level = "trace", skip(board))]
pub fn winning_move(board: &Board, mark: Mark) -> Option<Position> {
    board
        .empty_positions()
        .into_iter()
        .find(|&pos| rules::is_winner(&board.with_mark(pos, mark), mark))
}

/// First empty square (row-major) where the opponent of `mark` would
/// complete a line.
#[instrument(level = "trace", skip(board))]
pub fn blocking_move(board: &Board, mark: Mark) -> Option<Position> {
    winning_move(board, mark.opponent())
}

/// First empty corner in row-major order.
pub fn first_free_corner(board: &Board) -> Option<Position> {
    Position::CORNERS
        .iter()
        .copied()
        .find(|&pos| board.is_empty(pos))
}

/// Uniformly random empty square.
pub fn random_move<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<Position> {
    board.empty_positions().choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_expert_opens_center() {
        let ai = ComputerOpponent::new(Mark::O, Difficulty::Expert);
        let sel = ai.select(&Board::new(), &mut rng()).unwrap();
        assert_eq!(sel.position, Position::Center);
        assert_eq!(sel.tier, Tier::Center);
    }

    #[test]
    fn test_expert_prefers_win_over_block() {
        // O can win on the middle row, X threatens the top row.
        let board = Board::from_compact("XX OO X  ").unwrap();
        let ai = ComputerOpponent::new(Mark::O, Difficulty::Expert);
        let sel = ai.select(&board, &mut rng()).unwrap();
        assert_eq!(sel.position, Position::MiddleRight);
        assert_eq!(sel.tier, Tier::Win);
    }

    #[test]
    fn test_expert_blocks() {
        let board = Board::from_compact("XX  O    ").unwrap();
        let ai = ComputerOpponent::new(Mark::O, Difficulty::Expert);
        let sel = ai.select(&board, &mut rng()).unwrap();
        assert_eq!(sel.position, Position::TopRight);
        assert_eq!(sel.tier, Tier::Block);
    }

    #[test]
    fn test_expert_takes_corner_when_center_taken() {
        let board = Board::from_compact("    X    ").unwrap();
        let ai = ComputerOpponent::new(Mark::O, Difficulty::Expert);
        let sel = ai.select(&board, &mut rng()).unwrap();
        assert_eq!(sel.position, Position::TopLeft);
        assert_eq!(sel.tier, Tier::Corner);
    }

    #[test]
    fn test_expert_falls_back_to_random_edge() {
        // Center and corners gone, no threats on either side.
        let board = Board::from_compact("XOX O OXO").unwrap();
        assert!(rules::check_winner(&board).is_none());
        let ai = ComputerOpponent::new(Mark::X, Difficulty::Expert);
        let sel = ai.select(&board, &mut rng()).unwrap();
        assert_eq!(sel.tier, Tier::Random);
        assert!(board.is_empty(sel.position));
    }

    #[test]
    fn test_harder_takes_win_but_never_blocks() {
        let ai = ComputerOpponent::new(Mark::O, Difficulty::Harder);

        let winnable = Board::from_compact("X X OO  X").unwrap();
        let sel = ai.select(&winnable, &mut rng()).unwrap();
        assert_eq!(sel.position, Position::MiddleLeft);
        assert_eq!(sel.tier, Tier::Win);

        let threatened = Board::from_compact("XX  O    ").unwrap();
        let sel = ai.select(&threatened, &mut rng()).unwrap();
        assert_eq!(sel.tier, Tier::Random);
    }

    #[test]
    fn test_full_board_yields_nothing() {
        let board = Board::from_compact("XOXOXXOXO").unwrap();
        for difficulty in [Difficulty::Easy, Difficulty::Harder, Difficulty::Expert] {
            let ai = ComputerOpponent::new(Mark::O, difficulty);
            assert_eq!(ai.select(&board, &mut rng()), None);
        }
    }

    #[test]
    fn test_difficulty_cycle_and_parse() {
        assert_eq!(Difficulty::Easy.next(), Difficulty::Harder);
        assert_eq!(Difficulty::Expert.next(), Difficulty::Easy);
        assert_eq!("harder".parse::<Difficulty>().unwrap(), Difficulty::Harder);
        assert_eq!(Difficulty::Expert.to_string(), "expert");
        assert_eq!(Difficulty::default(), Difficulty::Expert);
    }
}

//! Property checks of the computer opponent over every reachable position.

mod common;

use common::{reachable_states, reference_has_line, reference_wins};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use triqui::{Board, ComputerOpponent, Difficulty, Mark, Position, Tier};

/// Unfinished positions, with the computer playing the mark to move.
fn open_positions() -> Vec<(Board, Mark)> {
    let mut states: Vec<_> = reachable_states()
        .into_iter()
        .filter(|(board, _)| {
            !reference_has_line(board, Mark::X)
                && !reference_has_line(board, Mark::O)
                && !board.empty_positions().is_empty()
        })
        .collect();
    states.sort_by_key(|(board, mark)| (board.to_compact(), mark.symbol()));
    states
}

#[test]
fn test_expert_priorities_hold_everywhere() {
    let mut rng = StdRng::seed_from_u64(11);
    for (board, me) in open_positions() {
        let ai = ComputerOpponent::new(me, Difficulty::Expert);
        let sel = ai.select(&board, &mut rng).expect("open board has a move");
        let wins = reference_wins(&board, me);
        let blocks = reference_wins(&board, me.opponent());
        let ctx = board.to_compact();

        if let Some(&first_win) = wins.first() {
            assert_eq!(sel.position, first_win, "win on {:?}", ctx);
            assert_eq!(sel.tier, Tier::Win);
        } else if let Some(&first_block) = blocks.first() {
            assert_eq!(sel.position, first_block, "block on {:?}", ctx);
            assert_eq!(sel.tier, Tier::Block);
        } else if board.is_empty(Position::Center) {
            assert_eq!(sel.position, Position::Center, "center on {:?}", ctx);
        } else if let Some(&corner) = Position::CORNERS.iter().find(|&&c| board.is_empty(c)) {
            assert_eq!(sel.position, corner, "corner on {:?}", ctx);
            assert_eq!(sel.tier, Tier::Corner);
        } else {
            assert_eq!(sel.tier, Tier::Random);
            assert!(board.is_empty(sel.position));
        }
    }
}

#[test]
fn test_expert_opens_in_center() {
    let ai = ComputerOpponent::new(Mark::O, Difficulty::Expert);
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(ai.pick_move(&Board::new(), &mut rng), Some(Position::Center));
}

#[test]
fn test_harder_always_takes_a_win() {
    let mut rng = StdRng::seed_from_u64(12);
    for (board, me) in open_positions() {
        let ai = ComputerOpponent::new(me, Difficulty::Harder);
        let pos = ai.pick_move(&board, &mut rng).expect("open board has a move");
        assert!(board.is_empty(pos));
        let wins = reference_wins(&board, me);
        if let Some(&first_win) = wins.first() {
            assert_eq!(pos, first_win, "board {:?}", board.to_compact());
        }
    }
}

#[test]
fn test_easy_picks_only_empty_squares() {
    let mut rng = StdRng::seed_from_u64(13);
    for (board, me) in open_positions() {
        let ai = ComputerOpponent::new(me, Difficulty::Easy);
        let pos = ai.pick_move(&board, &mut rng).expect("open board has a move");
        assert!(board.is_empty(pos), "board {:?}", board.to_compact());
    }
}

#[test]
fn test_easy_reaches_every_empty_square() {
    let mut rng = StdRng::seed_from_u64(14);
    for compact in ["         ", "X   O    ", "XX  O    ", "XOX O  X "] {
        let board = Board::from_compact(compact).expect("valid board");
        let ai = ComputerOpponent::new(Mark::O, Difficulty::Easy);
        let picked: HashSet<Position> = (0..500)
            .filter_map(|_| ai.pick_move(&board, &mut rng))
            .collect();
        let empty: HashSet<Position> = board.empty_positions().into_iter().collect();
        assert_eq!(picked, empty, "board {:?}", compact);
    }
}

#[test]
fn test_easy_ignores_obvious_win_sometimes() {
    // O wins at TopRight; a uniform pick misses it most of the time.
    let board = Board::from_compact("OO XX    ").expect("valid board");
    let ai = ComputerOpponent::new(Mark::O, Difficulty::Easy);
    let mut rng = StdRng::seed_from_u64(15);
    let misses = (0..200)
        .filter(|_| ai.pick_move(&board, &mut rng) != Some(Position::TopRight))
        .count();
    assert!(misses > 100);
}

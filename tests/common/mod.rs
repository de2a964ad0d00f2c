//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use triqui::{Board, Mark, Position};

/// Magic-square weights in row-major order. Three squares lie on a line
/// exactly when their weights sum to 15.
const MAGIC: [u32; 9] = [2, 7, 6, 9, 5, 1, 4, 3, 8];

/// Independent winner check via the magic square.
pub fn reference_has_line(board: &Board, mark: Mark) -> bool {
    let weights: Vec<u32> = Position::ALL
        .iter()
        .filter(|&&p| board.get(p).mark() == Some(mark))
        .map(|p| MAGIC[p.to_index()])
        .collect();
    for i in 0..weights.len() {
        for j in i + 1..weights.len() {
            for k in j + 1..weights.len() {
                if weights[i] + weights[j] + weights[k] == 15 {
                    return true;
                }
            }
        }
    }
    false
}

/// Every board reachable from empty by alternating placement, starting
/// with either mark, paired with the mark to move. Play stops at a line.
pub fn reachable_states() -> HashSet<(Board, Mark)> {
    let mut seen = HashSet::new();
    for first in [Mark::X, Mark::O] {
        visit(Board::new(), first, &mut seen);
    }
    seen
}

fn visit(board: Board, to_move: Mark, seen: &mut HashSet<(Board, Mark)>) {
    if !seen.insert((board, to_move)) {
        return;
    }
    if reference_has_line(&board, Mark::X) || reference_has_line(&board, Mark::O) {
        return;
    }
    for pos in board.empty_positions() {
        visit(board.with_mark(pos, to_move), to_move.opponent(), seen);
    }
}

/// Squares where `mark` would complete a line, by the reference check.
pub fn reference_wins(board: &Board, mark: Mark) -> Vec<Position> {
    board
        .empty_positions()
        .into_iter()
        .filter(|&p| reference_has_line(&board.with_mark(p, mark), mark))
        .collect()
}

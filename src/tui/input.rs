//! Keyboard mapping shared by the local and online screens.

use crate::games::tictactoe::Position;
use crossterm::event::KeyCode;

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move the highlighted square.
    Cursor(KeyCode),
    /// Play at the highlighted square.
    PlayCursor,
    /// Play at a square picked by digit.
    PlayAt(Position),
    /// Start a new game.
    NewGame,
    /// Cycle the computer difficulty.
    CycleDifficulty,
    /// Clear the scoreboard.
    ResetScores,
    /// Leave the screen.
    Quit,
    /// Unbound key.
    Ignore,
}

/// Maps a key to a [`Command`].
pub fn command_for(key: KeyCode) -> Command {
    match key {
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => Command::Cursor(key),
        KeyCode::Enter | KeyCode::Char(' ') => Command::PlayCursor,
        KeyCode::Char(c @ '1'..='9') => {
            Position::from_digit(c).map_or(Command::Ignore, Command::PlayAt)
        }
        KeyCode::Char('n') | KeyCode::Char('N') => Command::NewGame,
        KeyCode::Char('d') | KeyCode::Char('D') => Command::CycleDifficulty,
        KeyCode::Char('r') | KeyCode::Char('R') => Command::ResetScores,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Command::Quit,
        _ => Command::Ignore,
    }
}

/// Moves cursor based on arrow keys. Edges do not wrap.
pub fn move_cursor(cursor: Position, key: KeyCode) -> Position {
    let (row, col) = (cursor.row(), cursor.col());
    let target = match key {
        KeyCode::Up => row.checked_sub(1).map(|r| (r, col)),
        KeyCode::Down => Some((row + 1, col)),
        KeyCode::Left => col.checked_sub(1).map(|c| (row, c)),
        KeyCode::Right => Some((row, col + 1)),
        _ => None,
    };
    target
        .and_then(|(r, c)| Position::from_row_col(r, c))
        .unwrap_or(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_stops_at_edges() {
        assert_eq!(move_cursor(Position::TopLeft, KeyCode::Up), Position::TopLeft);
        assert_eq!(move_cursor(Position::TopLeft, KeyCode::Right), Position::TopCenter);
        assert_eq!(move_cursor(Position::Center, KeyCode::Down), Position::BottomCenter);
        assert_eq!(move_cursor(Position::BottomRight, KeyCode::Right), Position::BottomRight);
        assert_eq!(move_cursor(Position::MiddleRight, KeyCode::Left), Position::Center);
    }

    #[test]
    fn test_key_commands() {
        assert_eq!(command_for(KeyCode::Char('5')), Command::PlayAt(Position::Center));
        assert_eq!(command_for(KeyCode::Char('0')), Command::Ignore);
        assert_eq!(command_for(KeyCode::Enter), Command::PlayCursor);
        assert_eq!(command_for(KeyCode::Esc), Command::Quit);
        assert_eq!(command_for(KeyCode::Char('d')), Command::CycleDifficulty);
    }
}

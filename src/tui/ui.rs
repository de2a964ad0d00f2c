//! Stateless UI rendering for tic-tac-toe.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::games::tictactoe::{Board, Mark, Position, Square};

/// Everything one frame shows.
#[derive(Debug, Clone)]
pub struct Screen<'a> {
    /// Title line.
    pub title: &'a str,
    /// Board to draw.
    pub board: &'a Board,
    /// Highlighted square.
    pub cursor: Position,
    /// Turn or result line.
    pub status: String,
    /// Extra lines under the status (scores, errors).
    pub info: Vec<String>,
    /// Key help.
    pub help: &'a str,
}

/// Renders a full screen.
pub fn draw(frame: &mut Frame, screen: &Screen<'_>) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                              // Title
            Constraint::Min(11),                                // Board
            Constraint::Length(3),                              // Status
            Constraint::Length(screen.info.len() as u16 + 2),   // Info
            Constraint::Length(1),                              // Help
        ])
        .split(area);

    let title = Paragraph::new(screen.title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    draw_board(frame, chunks[1], screen.board, screen.cursor);

    let status = Paragraph::new(screen.status.as_str())
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, chunks[2]);

    let info: Vec<Line> = screen.info.iter().map(|l| Line::from(l.as_str())).collect();
    let info = Paragraph::new(info)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(info, chunks[3]);

    let help = Paragraph::new(screen.help)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[4]);
}

fn draw_board(frame: &mut Frame, area: Rect, board: &Board, cursor: Position) {
    let board_area = center_rect(area, 40, 11);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(board_area);

    for row in 0..3 {
        draw_row(frame, rows[row * 2], board, cursor, row);
        if row < 2 {
            draw_separator(frame, rows[row * 2 + 1]);
        }
    }
}

fn draw_row(frame: &mut Frame, area: Rect, board: &Board, cursor: Position, row: usize) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Length(12),
        ])
        .split(area);

    for col in 0..3 {
        if let Some(pos) = Position::from_row_col(row, col) {
            draw_cell(frame, cols[col * 2], board, cursor, pos);
        }
        if col < 2 {
            draw_separator_vertical(frame, cols[col * 2 + 1]);
        }
    }
}

fn draw_cell(frame: &mut Frame, area: Rect, board: &Board, cursor: Position, pos: Position) {
    let label;
    let (symbol, base_style) = match board.get(pos) {
        Square::Empty => {
            label = format!(" {} ", pos.to_index() + 1);
            (label.as_str(), Style::default().fg(Color::DarkGray))
        }
        Square::Occupied(Mark::X) => (
            " X ",
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
        Square::Occupied(Mark::O) => (
            " O ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };

    let style = if pos == cursor {
        base_style.bg(Color::White).fg(Color::Black)
    } else {
        base_style
    };

    // Pad vertically so the mark sits in the middle of the 3-line cell.
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(symbol.to_string(), style)),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_separator(frame: &mut Frame, area: Rect) {
    let sep = Paragraph::new("────────────┼────────────┼────────────")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, area);
}

fn draw_separator_vertical(frame: &mut Frame, area: Rect) {
    let sep = Paragraph::new(vec![Line::from("│"), Line::from("│"), Line::from("│")])
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, area);
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vert[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};

    fn rendered(screen: &Screen<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 30)).unwrap();
        terminal.draw(|f| draw(f, screen)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_draw_shows_marks_status_and_info() {
        let board = Board::from_compact("X   O    ").unwrap();
        let screen = Screen {
            title: "Triqui",
            board: &board,
            cursor: Position::BottomRight,
            status: "Your turn (X)".to_string(),
            info: vec!["You 1 | Computer 0 | Ties 2".to_string()],
            help: "q quit",
        };
        let text = rendered(&screen);
        assert!(text.contains("Triqui"));
        assert!(text.contains("Your turn (X)"));
        assert!(text.contains("You 1 | Computer 0 | Ties 2"));
        assert!(text.contains(" X "));
        assert!(text.contains(" O "));
        assert!(text.contains(" 9 "));
    }
}

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use kickr::history::SessionRecord;

/// Rows loaded for the history screen plus the scroll position.
#[derive(Debug, Default)]
pub struct HistoryView {
    pub records: Vec<SessionRecord>,
    pub scroll_offset: usize,
}

impl HistoryView {
    pub fn new(records: Vec<SessionRecord>) -> Self {
        Self {
            records,
            scroll_offset: 0,
        }
    }

    pub fn scroll_up(&mut self, by: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(by);
    }

    pub fn scroll_down(&mut self, by: usize) {
        let max = self.records.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + by).min(max);
    }
}

/// Pure presenter for a single history row
pub fn present_row(record: &SessionRecord) -> Row<'static> {
    let kicks_color = if record.total_kicks == 0 {
        Color::Red
    } else if record.average_kick_time < 2.0 {
        Color::Green
    } else {
        Color::Yellow
    };

    let best = if record.total_kicks == 0 {
        "—".to_string()
    } else {
        format!("{:.2}", record.best_kick_time)
    };

    Row::new(vec![
        Cell::from(record.played_at.format("%Y-%m-%d %H:%M").to_string()),
        Cell::from(record.posture.to_string()),
        Cell::from(record.difficulty.to_string()),
        Cell::from(format!("{}s", record.duration)),
        Cell::from(record.total_kicks.to_string())
            .style(Style::default().fg(kicks_color).add_modifier(Modifier::BOLD)),
        Cell::from(format!("{:.2}", record.average_kick_time)),
        Cell::from(best),
    ])
}

/// Render the session history screen
pub fn render_history(view: &mut HistoryView, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Table
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let title = Paragraph::new(format!("Session History ({} sessions)", view.records.len()))
        .block(Block::default().borders(Borders::ALL).title("History"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if view.records.is_empty() {
        let no_data = Paragraph::new("No sessions recorded yet. Finish a session to start your history.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[1]);
    } else {
        let table_height = chunks[1].height.saturating_sub(3) as usize; // borders + header
        let max_scroll = view.records.len().saturating_sub(table_height);
        if view.scroll_offset > max_scroll {
            view.scroll_offset = max_scroll;
        }

        let header = Row::new(vec![
            Cell::from("Played"),
            Cell::from("Posture"),
            Cell::from("Level"),
            Cell::from("Length"),
            Cell::from("Kicks"),
            Cell::from("Avg (s)"),
            Cell::from("Best (s)"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let visible_rows: Vec<Row> = view
            .records
            .iter()
            .skip(view.scroll_offset)
            .take(table_height)
            .map(present_row)
            .collect();

        let widths = [
            Constraint::Length(17), // Played
            Constraint::Length(9),  // Posture
            Constraint::Length(6),  // Level
            Constraint::Length(7),  // Length
            Constraint::Length(6),  // Kicks
            Constraint::Length(8),  // Avg
            Constraint::Min(8),     // Best
        ];

        let table = Table::new(visible_rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Sessions"))
            .column_spacing(2);

        f.render_widget(table, chunks[1]);
    }

    let instructions = Paragraph::new("(↑/↓) scroll  (PgUp/PgDn) page  (b) back  (r) retry  (esc) quit")
        .alignment(Alignment::Center)
        .wrap(ratatui::widgets::Wrap { trim: true });
    f.render_widget(instructions, chunks[2]);
}

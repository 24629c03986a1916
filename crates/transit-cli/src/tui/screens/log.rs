use super::Screen;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Session progress notes, oldest first, stamped with local arrival time
pub struct LogScreen {
    lines: Vec<(String, String)>,
    scroll_offset: u16,
}

impl LogScreen {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            scroll_offset: 0,
        }
    }

    pub fn push(&mut self, stamp: String, message: impl Into<String>) {
        self.lines.push((stamp, message.into()));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll_offset = 0;
    }
}

impl Screen for LogScreen {
    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
            }
            KeyCode::Char('c') => self.clear(),
            KeyCode::Home => {
                self.scroll_offset = 0;
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .lines
            .iter()
            .map(|(stamp, message)| {
                Line::from(vec![
                    Span::styled(format!("[{}] ", stamp), Style::default().fg(Color::DarkGray)),
                    Span::raw(message.as_str()),
                ])
            })
            .collect();

        let log = Paragraph::new(lines)
            .scroll((self.scroll_offset, 0))
            .block(Block::default().borders(Borders::ALL).title("Log (c: clear)"));
        frame.render_widget(log, area);
    }

    fn title(&self) -> &str {
        "Log"
    }
}

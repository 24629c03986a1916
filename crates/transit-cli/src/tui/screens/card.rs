use super::Screen;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use transit_card::CardReadResult;

use crate::formatters;

/// State of the card screen
#[derive(Debug, Clone)]
enum CardState {
    Waiting,
    Loading,
    Loaded(Box<CardReadResult>),
}

/// Balance, identity and transaction table of the last card read
pub struct CardScreen {
    state: CardState,
    scroll_offset: usize,
}

impl CardScreen {
    pub fn new() -> Self {
        Self {
            state: CardState::Waiting,
            scroll_offset: 0,
        }
    }

    /// Set the screen to loading state
    pub fn set_loading(&mut self) {
        self.state = CardState::Loading;
        self.scroll_offset = 0;
    }

    /// Set the session result (from background thread)
    pub fn set_result(&mut self, result: CardReadResult) {
        self.state = CardState::Loaded(Box::new(result));
    }

    /// Clear card data
    pub fn clear(&mut self) {
        self.state = CardState::Waiting;
        self.scroll_offset = 0;
    }

    fn max_scroll(&self) -> usize {
        match &self.state {
            CardState::Loaded(result) => result.transactions.len().saturating_sub(1),
            _ => 0,
        }
    }

    fn render_summary(&self, frame: &mut Frame, area: Rect, result: &CardReadResult) {
        let label = |text: &'static str| Span::styled(text, Style::default().add_modifier(Modifier::BOLD));

        let application = result.profile.map(|p| p.label).unwrap_or("-");
        let (card_number, issued, valid_until) = match result.identity {
            Some(ref identity) => (
                identity.card_number.as_str(),
                identity.issue_date.as_str(),
                identity.expiry_date.as_str(),
            ),
            None => ("unavailable", "-", "-"),
        };

        let lines = vec![
            Line::from(vec![label("Application:  "), Span::raw(application)]),
            Line::from(vec![
                label("Balance:      "),
                Span::styled(
                    formatters::format_balance(result.balance),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![label("Card number:  "), Span::raw(card_number)]),
            Line::from(vec![
                label("Issued:       "),
                Span::raw(issued),
                Span::raw("    "),
                label("Valid until: "),
                Span::raw(valid_until),
            ]),
        ];

        let summary = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Card"));
        frame.render_widget(summary, area);
    }

    fn render_transactions(&self, frame: &mut Frame, area: Rect, result: &CardReadResult) {
        let title = match result.ledger_sfi {
            Some(sfi) => format!("Transactions ({} from SFI {})", result.transactions.len(), sfi),
            None => "Transactions (none found)".to_string(),
        };

        let header = Row::new(vec!["No.", "Time", "Amount", "Type", "Station/Gate"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = result
            .transactions
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .map(|(i, record)| {
                let amount_color = if record.kind == transit_common::TransactionKind::TopUp {
                    Color::Green
                } else {
                    Color::Reset
                };
                Row::new(vec![
                    Cell::from(format!("{:02}", i + 1)),
                    Cell::from(record.timestamp.clone()),
                    Cell::from(record.amount.to_string()).style(Style::default().fg(amount_color)),
                    Cell::from(record.kind.label().into_owned()),
                    Cell::from(record.station.clone()),
                ])
            });

        let table = Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Length(20),
                Constraint::Length(10),
                Constraint::Length(12),
                Constraint::Min(12),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));

        frame.render_widget(table, area);
    }
}

impl Screen for CardScreen {
    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_offset = (self.scroll_offset + 1).min(self.max_scroll());
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
            }
            KeyCode::PageDown => {
                self.scroll_offset = (self.scroll_offset + 10).min(self.max_scroll());
            }
            KeyCode::Home => {
                self.scroll_offset = 0;
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(ratatui::layout::Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        // Help text
        let help = Paragraph::new("↑/↓ or j/k: Scroll | r: Read again | Tab: Switch screen | q: Quit")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Controls"));
        frame.render_widget(help, chunks[0]);

        let result = match &self.state {
            CardState::Waiting => {
                let waiting = Paragraph::new("Waiting for card...")
                    .style(Style::default().fg(Color::Yellow))
                    .block(Block::default().borders(Borders::ALL).title("Status"));
                frame.render_widget(waiting, chunks[1]);
                return;
            }
            CardState::Loading => {
                let loading = Paragraph::new("Reading card data...")
                    .style(Style::default().fg(Color::Cyan))
                    .block(Block::default().borders(Borders::ALL).title("Status"));
                frame.render_widget(loading, chunks[1]);
                return;
            }
            CardState::Loaded(result) if !result.success => {
                let error_widget = Paragraph::new(result.message.as_str())
                    .style(Style::default().fg(Color::Red))
                    .block(Block::default().borders(Borders::ALL).title("Error"));
                frame.render_widget(error_widget, chunks[1]);
                return;
            }
            CardState::Loaded(result) => result,
        };

        let content = Layout::default()
            .direction(ratatui::layout::Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0)])
            .split(chunks[1]);

        self.render_summary(frame, content[0], result);
        self.render_transactions(frame, content[1], result);
    }

    fn title(&self) -> &str {
        "Card"
    }
}

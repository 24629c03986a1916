mod card;
mod log;

pub use card::CardScreen;
pub use log::LogScreen;

use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

/// Trait for all TUI screens
pub trait Screen {
    /// Handle a key event
    fn handle_key(&mut self, key: KeyEvent);

    /// Render the screen
    fn render(&self, frame: &mut Frame, area: Rect);

    /// Get the screen title
    fn title(&self) -> &str;
}

use std::io::{self, Stdout};
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use crossterm::{
    event::KeyCode,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info, warn};
use transit_card::ReaderConfig;

use super::{
    card_worker::{CardCommand, CardEvent, CardWorker},
    events::{is_quit_key, is_reread_key, EventHandler, TuiEvent},
    screens::{CardScreen, LogScreen, Screen},
    ui,
};

const SCREEN_COUNT: usize = 2;

/// Main TUI application
pub struct App {
    /// Current screen index
    selected_screen: usize,
    card_screen: CardScreen,
    log_screen: LogScreen,
    /// Whether a card is present
    card_present: bool,
    /// Error message if reader unavailable
    reader_error: Option<String>,
    /// Receiver for card events from background thread
    card_event_rx: Receiver<CardEvent>,
    /// Sender for commands to background thread
    card_command_tx: Sender<CardCommand>,
}

fn now_stamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

impl App {
    pub fn new(reader_name: Option<String>, config: ReaderConfig) -> Self {
        // Spawn background worker for card operations
        let (card_event_rx, card_command_tx) = CardWorker::spawn(reader_name, config);

        Self {
            selected_screen: 0,
            card_screen: CardScreen::new(),
            log_screen: LogScreen::new(),
            card_present: false,
            reader_error: None,
            card_event_rx,
            card_command_tx,
        }
    }

    /// Process card events from the background worker
    fn process_card_events(&mut self) {
        // Process all available events (non-blocking)
        while let Ok(event) = self.card_event_rx.try_recv() {
            debug!("Card event: {:?}", event);

            match event {
                CardEvent::CardDetected { reader_name } => {
                    self.card_present = true;
                    self.reader_error = None;
                    self.log_screen.push(now_stamp(), format!("Card detected on {}", reader_name));
                }
                CardEvent::CardRemoved => {
                    self.card_present = false;
                    self.card_screen.clear();
                    self.log_screen.push(now_stamp(), "Card removed");
                }
                CardEvent::ReadingStarted => {
                    self.card_screen.set_loading();
                }
                CardEvent::DataReady { result } => {
                    let stamp = now_stamp();
                    for line in &result.logs {
                        self.log_screen.push(stamp.clone(), line.as_str());
                    }
                    self.card_screen.set_result(result);
                }
                CardEvent::ReaderUnavailable { error } => {
                    warn!(error = %error, "Reader unavailable");
                    self.reader_error = Some(format!("Card reader unavailable: {}", error));
                }
                CardEvent::ReaderAvailable => {
                    self.reader_error = None;
                    self.log_screen.push(now_stamp(), "Card reader available");
                }
            }
        }
    }

    /// Handle switching to the next screen
    fn next_screen(&mut self) {
        self.selected_screen = (self.selected_screen + 1) % SCREEN_COUNT;
    }

    /// Handle switching to the previous screen
    fn prev_screen(&mut self) {
        self.selected_screen = (self.selected_screen + SCREEN_COUNT - 1) % SCREEN_COUNT;
    }

    /// Handle a key event
    fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
        if is_reread_key(&key) {
            let _ = self.card_command_tx.send(CardCommand::Reread);
            return;
        }

        match key.code {
            KeyCode::Tab => self.next_screen(),
            KeyCode::BackTab => self.prev_screen(),
            KeyCode::Char('1') => self.selected_screen = 0,
            KeyCode::Char('2') => self.selected_screen = 1,
            _ => match self.selected_screen {
                0 => self.card_screen.handle_key(key),
                _ => self.log_screen.handle_key(key),
            },
        }
    }

    /// Render the application
    fn render(&self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
        terminal.draw(|frame| {
            let screens: [&dyn Screen; SCREEN_COUNT] = [&self.card_screen, &self.log_screen];
            ui::render(
                frame,
                &screens,
                self.selected_screen,
                self.card_present,
                self.reader_error.as_deref(),
            );
        })?;
        Ok(())
    }

    /// Run the main event loop
    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
        let event_handler = EventHandler::new(Duration::from_millis(100));

        loop {
            match event_handler.next()? {
                TuiEvent::Key(key) => {
                    if is_quit_key(&key) {
                        info!("Quit requested");
                        let _ = self.card_command_tx.send(CardCommand::Stop);
                        return Ok(());
                    }
                    self.handle_key(key);
                }
                TuiEvent::Tick => self.process_card_events(),
            }

            self.render(terminal)?;
        }
    }
}

/// Initialize the terminal for TUI mode
fn init_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore the terminal to normal mode
fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Main entry point for the TUI
pub fn run_tui(reader_name: Option<String>, config: ReaderConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting TUI");

    // Set up panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = init_terminal()?;
    let mut app = App::new(reader_name, config);

    let result = app.run(&mut terminal);

    // Always restore terminal, even on error
    let restore_result = restore_terminal(terminal);

    // Restore original panic hook
    let _ = std::panic::take_hook();

    restore_result?;

    if let Err(e) = result {
        warn!(error = %e, "TUI error");
        return Err(Box::new(e));
    }

    info!("TUI stopped");
    Ok(())
}

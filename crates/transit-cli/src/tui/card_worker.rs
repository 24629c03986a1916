use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use transit_card::{CardReadResult, CardReader, ReaderConfig, TransitCard};

/// Messages sent from the card worker to the UI
#[derive(Debug, Clone)]
pub enum CardEvent {
    /// Card was detected
    CardDetected { reader_name: String },
    /// Card was removed
    CardRemoved,
    /// Card data reading started
    ReadingStarted,
    /// A read session finished (successfully or not)
    DataReady { result: CardReadResult },
    /// Reader is unavailable
    ReaderUnavailable { error: String },
    /// Reader became available
    ReaderAvailable,
}

/// Commands sent from the UI to the card worker
#[derive(Debug)]
pub enum CardCommand {
    /// Read the card on the reader again
    Reread,
    /// Stop the worker thread
    Stop,
}

/// Background worker for card operations
pub struct CardWorker {
    event_tx: Sender<CardEvent>,
    command_rx: Receiver<CardCommand>,
    reader_name: Option<String>,
    config: ReaderConfig,
}

impl CardWorker {
    /// Spawn a new card worker thread
    pub fn spawn(reader_name: Option<String>, config: ReaderConfig) -> (Receiver<CardEvent>, Sender<CardCommand>) {
        let (event_tx, event_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();

        thread::spawn(move || {
            let worker = CardWorker {
                event_tx,
                command_rx,
                reader_name,
                config,
            };
            worker.run();
        });

        (event_rx, command_tx)
    }

    fn run(self) {
        info!("Card worker thread started");

        let mut reader: Option<CardReader> = None;
        let mut card_present = false;
        // Forces the first context attempt without waiting
        let mut last_reader_check: Option<Instant> = None;

        loop {
            // Check for commands (non-blocking)
            match self.command_rx.try_recv() {
                Ok(CardCommand::Stop) => {
                    info!("Card worker stopping");
                    break;
                }
                Ok(CardCommand::Reread) => {
                    debug!("Re-read requested");
                    card_present = false;
                }
                Err(_) => {}
            }

            // Try to get reader if we don't have one (check every 2 seconds)
            let due = last_reader_check.map_or(true, |t| t.elapsed() > Duration::from_secs(2));
            if reader.is_none() && due {
                match CardReader::new() {
                    Ok(r) => {
                        info!("Card reader initialized");
                        reader = Some(r);
                        let _ = self.event_tx.send(CardEvent::ReaderAvailable);
                    }
                    Err(e) => {
                        debug!("Card reader unavailable: {}", e);
                        let _ = self.event_tx.send(CardEvent::ReaderUnavailable {
                            error: format!("{}", e),
                        });
                    }
                }
                last_reader_check = Some(Instant::now());
            }

            // Check for card if we have a reader; the connection is released
            // after every poll
            if let Some(ref r) = reader {
                let polled = r.with_card(self.reader_name.as_deref(), |card, reader_name| {
                    if card_present {
                        return;
                    }

                    info!(reader = %reader_name, "Card detected");
                    card_present = true;
                    let _ = self.event_tx.send(CardEvent::CardDetected {
                        reader_name: reader_name.to_string(),
                    });
                    let _ = self.event_tx.send(CardEvent::ReadingStarted);

                    let mut transit_card = TransitCard::with_config(card, self.config.clone());
                    let result = transit_card.read_card_info();
                    let _ = self.event_tx.send(CardEvent::DataReady { result });
                });

                match polled {
                    Ok(()) => {}
                    Err(pcsc::Error::NoService) | Err(pcsc::Error::ServiceStopped) => {
                        warn!("PC/SC service went away");
                        reader = None;
                        card_present = false;
                        let _ = self.event_tx.send(CardEvent::CardRemoved);
                    }
                    Err(_) => {
                        if card_present {
                            info!("Card removed");
                            card_present = false;
                            let _ = self.event_tx.send(CardEvent::CardRemoved);
                        }
                    }
                }
            }

            // Sleep briefly to avoid busy loop
            thread::sleep(Duration::from_millis(250));
        }

        info!("Card worker thread stopped");
    }
}

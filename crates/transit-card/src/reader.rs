//! PC/SC card reader management

use pcsc::{Card, Context, Disposition, Protocols, Scope, ShareMode};
use tracing::{debug, warn};

use crate::config::ReaderConfig;
use crate::protocol::TransitCard;
use crate::session::CardReadResult;

/// Card reader wrapper for managing PC/SC connections
pub struct CardReader {
    context: Context,
}

impl CardReader {
    /// Create a new CardReader by establishing a PC/SC context
    pub fn new() -> Result<Self, pcsc::Error> {
        let context = Context::establish(Scope::User)?;
        Ok(Self { context })
    }

    /// List all available card readers
    pub fn list_readers(&self) -> Result<Vec<String>, pcsc::Error> {
        let mut readers_buf = [0; 2048];
        let readers = self.context.list_readers(&mut readers_buf)?;

        Ok(readers
            .map(|r| r.to_string_lossy().into_owned())
            .collect())
    }

    /// Connect to the first available reader
    pub fn connect_first(&self) -> Result<(Card, String), pcsc::Error> {
        let mut readers_buf = [0; 2048];
        let mut readers = self.context.list_readers(&mut readers_buf)?;

        if let Some(reader) = readers.next() {
            let reader_name = reader.to_string_lossy().into_owned();
            let card = self.context.connect(reader, ShareMode::Shared, Protocols::ANY)?;
            Ok((card, reader_name))
        } else {
            Err(pcsc::Error::NoReadersAvailable)
        }
    }

    /// Connect to a reader by its exact name
    pub fn connect_named(&self, name: &str) -> Result<Card, pcsc::Error> {
        let mut readers_buf = [0; 2048];
        let mut readers = self.context.list_readers(&mut readers_buf)?;

        let reader = readers
            .find(|r| r.to_string_lossy() == name)
            .ok_or(pcsc::Error::UnknownReader)?;
        self.context.connect(reader, ShareMode::Shared, Protocols::ANY)
    }

    /// Connect to the named reader (or the first one), run `f`, then disconnect
    ///
    /// The card is released on every path once connected. A failed disconnect
    /// is logged and otherwise ignored.
    pub fn with_card<R>(
        &self,
        reader_name: Option<&str>,
        f: impl FnOnce(&Card, &str) -> R,
    ) -> Result<R, pcsc::Error> {
        let (card, name) = match reader_name {
            Some(name) => (self.connect_named(name)?, name.to_string()),
            None => self.connect_first()?,
        };
        debug!(reader = %name, "Card connected");

        let output = f(&card, &name);

        match card.disconnect(Disposition::LeaveCard) {
            Ok(()) => debug!(reader = %name, "Card disconnected"),
            Err((_card, e)) => warn!(reader = %name, error = %e, "Failed to disconnect card"),
        }

        Ok(output)
    }

    /// Run a full read session on the named reader (or the first one)
    ///
    /// Only connection failures are returned as errors; everything after that
    /// is reported in the [`CardReadResult`].
    pub fn read_card(
        &self,
        reader_name: Option<&str>,
        config: &ReaderConfig,
    ) -> Result<(CardReadResult, String), pcsc::Error> {
        self.with_card(reader_name, |card, name| {
            let mut transit_card = TransitCard::with_config(card, config.clone());
            (transit_card.read_card_info(), name.to_string())
        })
    }
}

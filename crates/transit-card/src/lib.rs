//! Transit Card - Stored-value transit card reading
//!
//! This crate talks to transit cards through PC/SC readers: it selects the
//! transit application, reads the purse balance, locates and decodes the
//! transaction ledger, and reads the card identity record.

pub mod apdu;
pub mod config;
pub mod error;
pub mod ledger;
pub mod protocol;
pub mod reader;
pub mod session;

pub use apdu::{ApduResponse, Transport};
pub use config::ReaderConfig;
pub use error::{ConfigError, ReadError};
pub use ledger::LedgerScan;
pub use protocol::{ApplicationProfile, TransitCard, PROFILES};
pub use reader::CardReader;
pub use session::{CardReadResult, SessionStage};

/// Re-export commonly used types
pub use pcsc::{Card, Context, Error as PcscError};
pub use transit_common::{Amount, IdentityRecord, TransactionKind, TransactionRecord};

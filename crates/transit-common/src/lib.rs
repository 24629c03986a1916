//! Transit Common - Record layouts and decoding for transit stored-value cards
//!
//! Everything in this crate is pure: it turns bytes (or hex strings) read from
//! a card into structured values and never talks to a reader.

pub mod amount;
pub mod identity;
pub mod transaction;

pub use amount::Amount;
pub use identity::{parse_identity_record, IdentityError, IdentityRecord};
pub use transaction::{parse_transaction_record, TransactionKind, TransactionRecord, UNKNOWN_DATETIME};


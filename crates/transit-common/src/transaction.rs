//! Transaction ledger records
//!
//! A ledger slot holds at least 23 bytes with the following fixed layout:
//!
//! | Offset  | Field                                   |
//! |---------|-----------------------------------------|
//! | 0..5    | not decoded                             |
//! | 5..9    | amount in cents, big-endian             |
//! | 9       | transaction type code                   |
//! | 10..16  | station / gate identifier (opaque)      |
//! | 16..20  | date, BCD `YYYYMMDD`                    |
//! | 20..23  | time, BCD `HHMMSS`                      |

use std::borrow::Cow;
use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};

use crate::Amount;

/// Shortest slot that can be decoded
pub const MIN_RECORD_LEN: usize = 23;

/// Timestamp used when the BCD date/time is not a valid calendar instant
pub const UNKNOWN_DATETIME: &str = "unknown date/time";

/// Output format of [`TransactionRecord::timestamp`]
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const RAW_DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Transaction category from the type code byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Subway,
    TopUp,
    Bus,
    Purchase,
    Unknown(u8),
}

impl TransactionKind {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x09 => TransactionKind::Subway,
            0x02 => TransactionKind::TopUp,
            0x06 => TransactionKind::Bus,
            0x05 => TransactionKind::Purchase,
            other => TransactionKind::Unknown(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            TransactionKind::Subway => 0x09,
            TransactionKind::TopUp => 0x02,
            TransactionKind::Bus => 0x06,
            TransactionKind::Purchase => 0x05,
            TransactionKind::Unknown(code) => *code,
        }
    }

    /// Human-readable label, `unknown(XX)` for codes outside the table
    pub fn label(&self) -> Cow<'static, str> {
        match self {
            TransactionKind::Subway => Cow::Borrowed("subway"),
            TransactionKind::TopUp => Cow::Borrowed("top-up"),
            TransactionKind::Bus => Cow::Borrowed("bus"),
            TransactionKind::Purchase => Cow::Borrowed("purchase"),
            TransactionKind::Unknown(code) => Cow::Owned(format!("unknown({:02X})", code)),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for TransactionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One decoded ledger slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub amount: Amount,
    /// `YYYY-MM-DD HH:MM:SS`, or [`UNKNOWN_DATETIME`]
    pub timestamp: String,
    pub kind: TransactionKind,
    /// Uppercase hex of bytes 10..16
    pub station: String,
    /// The input string exactly as it was given to the parser
    pub raw: String,
}

impl TransactionRecord {
    /// The timestamp as a calendar value, `None` for the sentinel
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, DATETIME_FORMAT).ok()
    }

    pub fn has_valid_timestamp(&self) -> bool {
        self.timestamp != UNKNOWN_DATETIME
    }
}

/// Decode one ledger slot given as hex (whitespace is ignored)
///
/// Returns `None` when the input is not hex or decodes to fewer than
/// [`MIN_RECORD_LEN`] bytes. A bad date/time does not reject the record; the
/// timestamp falls back to [`UNKNOWN_DATETIME`].
pub fn parse_transaction_record(record_hex: &str) -> Option<TransactionRecord> {
    let compact: String = record_hex.split_whitespace().collect();
    let data = hex::decode(compact).ok()?;

    if data.len() < MIN_RECORD_LEN {
        return None;
    }

    let amount = Amount::from_be_slice(&data[5..9])?;
    let kind = TransactionKind::from_code(data[9]);
    let station = hex::encode_upper(&data[10..16]);
    let timestamp = decode_timestamp(&data[16..20], &data[20..23]);

    Some(TransactionRecord {
        amount,
        timestamp,
        kind,
        station,
        raw: record_hex.to_string(),
    })
}

/// Render date and time bytes as hex digits and read them as `YYYYMMDDHHMMSS`
fn decode_timestamp(date: &[u8], time: &[u8]) -> String {
    let digits = format!("{}{}", hex::encode_upper(date), hex::encode_upper(time));

    match NaiveDateTime::parse_from_str(&digits, RAW_DATETIME_FORMAT) {
        Ok(datetime) if is_calendar_instant(&datetime) => datetime.format(DATETIME_FORMAT).to_string(),
        _ => UNKNOWN_DATETIME.to_string(),
    }
}

// chrono accepts year 0 and a leap second of 60; neither is a date a card writes.
fn is_calendar_instant(datetime: &NaiveDateTime) -> bool {
    datetime.year() >= 1 && datetime.nanosecond() < 1_000_000_000
}

//! Field formatters for human-readable output

use clap::ValueEnum;
use transit_common::{Amount, TransactionRecord};

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatMode {
    /// Decoded fields plus the raw hex of every record
    Raw,
    /// Human-readable formatted output
    Human,
    /// The full read result as JSON
    Json,
}

impl FormatMode {
    pub fn description(&self) -> &'static str {
        match self {
            FormatMode::Raw => "Raw",
            FormatMode::Human => "Human-Readable",
            FormatMode::Json => "JSON",
        }
    }
}

pub fn format_balance(balance: Option<Amount>) -> String {
    match balance {
        Some(amount) => format!("{} CNY", amount),
        None => "unavailable".to_string(),
    }
}

/// Table header matching [`format_transaction_row`]
pub fn transaction_header() -> String {
    format!("{:<4} {:<19} {:>10}  {:<12} {}", "No.", "Time", "Amount", "Type", "Station/Gate")
}

/// One transaction table row; `index` is 1-based
pub fn format_transaction_row(index: usize, record: &TransactionRecord) -> String {
    format!(
        "{:<4} {:<19} {:>10}  {:<12} {}",
        format!("{:02}", index),
        record.timestamp,
        record.amount.to_string(),
        record.kind.label(),
        record.station
    )
}

/// Group a hex string into space-separated byte pairs
pub fn spaced_hex(hex: &str) -> String {
    hex.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

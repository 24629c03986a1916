//! Transaction ledger enumeration
//!
//! The ledger's SFI differs between issuers, so it is found by probing a
//! prioritized list of candidate SFIs. Within a location, slots are read from
//! record 1 upward until the card signals there is nothing more: a non-9000
//! status, an empty response, an all-zero slot, or a transport fault. The
//! first location that yields at least one decodable record wins and later
//! candidates are never read, even if they hold data too.

use tracing::{debug, info, warn};
use transit_common::{parse_transaction_record, TransactionRecord};

use crate::apdu::{commands, ApduResponse, Transport};
use crate::config::ReaderConfig;

/// Records found by a ledger scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerScan {
    /// SFI the records were read from, `None` if every candidate came up empty
    pub sfi: Option<u8>,
    /// Newest first
    pub records: Vec<TransactionRecord>,
}

/// One raw slot as returned by READ RECORD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSlot {
    pub record_number: u8,
    pub data: Vec<u8>,
}

impl RawSlot {
    /// Uppercase hex in space-separated byte pairs, e.g. `00 01 A0`
    pub fn spaced_hex(&self) -> String {
        self.data
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Whether a READ RECORD response holds ledger data
pub fn is_ledger_slot(response: &ApduResponse) -> bool {
    response.is_success() && !response.data.is_empty() && response.data.iter().any(|&b| b != 0)
}

/// Read slots `1..=limit` at one SFI, stopping at the first empty slot
pub fn scan_location<T: Transport + ?Sized>(transport: &T, sfi: u8, limit: u8) -> Vec<RawSlot> {
    let mut slots = Vec::new();

    for record_number in 1..=limit {
        match commands::read_record(record_number, sfi).send(transport) {
            Ok(response) if is_ledger_slot(&response) => {
                slots.push(RawSlot {
                    record_number,
                    data: response.data,
                });
            }
            Ok(response) => {
                debug!(sfi, record_number, sw = %response.status_string(), "No more records at SFI");
                break;
            }
            Err(e) => {
                warn!(sfi, record_number, error = %e, "Failed to read record");
                break;
            }
        }
    }

    slots
}

/// Decode the records stored at one SFI
///
/// Slots too short to decode are skipped without ending the scan.
pub fn read_location<T: Transport + ?Sized>(transport: &T, sfi: u8, limit: u8) -> Vec<TransactionRecord> {
    scan_location(transport, sfi, limit)
        .into_iter()
        .filter_map(|slot| {
            let record = parse_transaction_record(&slot.spaced_hex());
            if record.is_none() {
                debug!(sfi, record_number = slot.record_number, len = slot.data.len(), "Skipping undecodable record");
            }
            record
        })
        .collect()
}

/// Probe the configured candidate SFIs and return the first non-empty ledger
pub fn read_ledger<T: Transport + ?Sized>(transport: &T, config: &ReaderConfig) -> LedgerScan {
    let limit = config.record_limit();

    for &sfi in &config.candidate_sfis {
        let mut records = read_location(transport, sfi, limit);
        if records.is_empty() {
            debug!(sfi, "No ledger records at SFI");
            continue;
        }

        info!(sfi, count = records.len(), "Read ledger records");
        sort_newest_first(&mut records);
        return LedgerScan {
            sfi: Some(sfi),
            records,
        };
    }

    LedgerScan::default()
}

/// Order by timestamp string, newest first
///
/// `YYYY-MM-DD HH:MM:SS` sorts lexicographically in time order. The
/// unknown-date sentinel sorts by its literal text, which places it ahead of
/// every dated record.
pub fn sort_newest_first(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

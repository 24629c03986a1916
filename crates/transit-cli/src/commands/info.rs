use std::process::ExitCode;

use transit_card::{CardReader, ReaderConfig};

use crate::formatters::FormatMode;

use super::card_info::CardInfoData;
use super::info_formatter::format_card_info;

pub fn cmd_info(reader_name: Option<&str>, config: &ReaderConfig, format_mode: FormatMode) -> ExitCode {
    // Step 1: Connect to card reader
    let reader = match CardReader::new() {
        Ok(r) => r,
        Err(err) => {
            eprintln!("Failed to establish PC/SC context: {}", err);
            return ExitCode::FAILURE;
        }
    };

    // Step 2: Run the read session; the card is released when it returns
    let (result, reader_name) = match reader.read_card(reader_name, config) {
        Ok(read) => read,
        Err(err) => {
            eprintln!("Failed to connect to card: {}", err);
            eprintln!("Please ensure a card is present on the reader");
            return ExitCode::FAILURE;
        }
    };

    let success = result.success;
    let card_info = CardInfoData { reader_name, result };

    // Format and output
    if let Err(err) = format_card_info(&card_info, format_mode) {
        eprintln!("Failed to format card data: {}", err);
        return ExitCode::FAILURE;
    }

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

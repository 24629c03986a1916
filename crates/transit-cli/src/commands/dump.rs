use std::process::ExitCode;

use transit_card::apdu::commands;
use transit_card::ledger::scan_location;
use transit_card::{CardReader, ReaderConfig, TransitCard};
use transit_common::parse_transaction_record;

use crate::formatters::spaced_hex;

pub fn cmd_dump(reader_name: Option<&str>, config: &ReaderConfig) -> ExitCode {
    println!("Transit Ledger Dump - All Candidate SFIs\n");

    // Connect to card reader
    let reader = match CardReader::new() {
        Ok(r) => r,
        Err(err) => {
            eprintln!("Failed to establish PC/SC context: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let dumped = reader.with_card(reader_name, |card, name| {
        println!("Reader: {}", name);
        println!("Card connected successfully\n");

        let mut transit_card = TransitCard::with_config(card, config.clone());
        match transit_card.select_application() {
            Ok(profile) => println!("Application: {}\n", profile.label),
            Err(err) => {
                eprintln!("{}", err);
                return false;
            }
        }

        let limit = config.record_limit();
        for &sfi in &config.candidate_sfis {
            let slots = scan_location(card, sfi, limit);
            println!("SFI {} ({} records):", sfi, slots.len());

            for slot in slots {
                let record_hex = slot.spaced_hex();
                let decoded = match parse_transaction_record(&record_hex) {
                    Some(record) => format!("{} {} {}", record.timestamp, record.amount, record.kind),
                    None => "undecodable".to_string(),
                };
                println!("  {:02}: {}", slot.record_number, record_hex);
                println!("      {}", decoded);
            }
            println!();
        }

        println!("Identity record:");
        match commands::read_identity().send(card) {
            Ok(response) => println!(
                "  SW={} {}",
                response.status_string(),
                spaced_hex(&hex::encode_upper(&response.data))
            ),
            Err(err) => println!("  {}", err),
        }

        true
    });

    match dumped {
        Ok(true) => {
            println!("\n=== Dump Complete ===");
            ExitCode::SUCCESS
        }
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Failed to connect to card: {}", err);
            eprintln!("Please ensure a card is present on the reader");
            ExitCode::FAILURE
        }
    }
}

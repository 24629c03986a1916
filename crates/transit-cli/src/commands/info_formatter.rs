//! Formatter for card information output

use crate::formatters::{self, FormatMode};

use super::card_info::CardInfoData;

/// Format and output card information
pub fn format_card_info(info: &CardInfoData, format_mode: FormatMode) -> Result<(), serde_json::Error> {
    if format_mode == FormatMode::Json {
        println!("{}", serde_json::to_string_pretty(info)?);
        return Ok(());
    }

    println!("Transit Card Reader - {} Mode\n", format_mode.description());

    // Reader info
    println!("Reader: {}", info.reader_name);

    if !info.result.success {
        println!("\n{}\n", info.result.message);
        print_log(info);
        return Ok(());
    }

    // Application
    print_application(info, format_mode);

    // Balance and identity
    print_summary(info);

    // Transactions
    print_transactions(info, format_mode);

    // Progress notes
    print_log(info);

    println!("\n=== {} ===", info.result.message);
    Ok(())
}

fn print_application(info: &CardInfoData, format_mode: FormatMode) {
    if let Some(profile) = info.result.profile {
        println!("Application: {}", profile.label);
        if format_mode == FormatMode::Raw {
            println!("  AID: {}", hex::encode_upper(profile.aid));
        }
    }
    println!();
}

fn print_summary(info: &CardInfoData) {
    println!("=== Card ===\n");
    println!("Balance:      {}", formatters::format_balance(info.result.balance));

    match info.result.identity {
        Some(ref identity) => {
            println!("Card number:  {}", identity.card_number);
            println!("Issued:       {}", identity.issue_date);
            println!("Valid until:  {}", identity.expiry_date);
        }
        None => println!("Card number:  unavailable"),
    }
    println!();
}

fn print_transactions(info: &CardInfoData, format_mode: FormatMode) {
    let transactions = &info.result.transactions;

    match info.result.ledger_sfi {
        Some(sfi) => println!("=== Transactions ({} from SFI {}) ===\n", transactions.len(), sfi),
        None => {
            println!("=== Transactions ===\n");
            println!("No transaction records found\n");
            return;
        }
    }

    println!("{}", formatters::transaction_header());
    for (i, record) in transactions.iter().enumerate() {
        println!("{}", formatters::format_transaction_row(i + 1, record));
        if format_mode == FormatMode::Raw {
            println!("     {}", record.raw);
        }
    }
    println!();
}

fn print_log(info: &CardInfoData) {
    println!("=== Log ===\n");
    for line in &info.result.logs {
        println!("  {}", line);
    }
}

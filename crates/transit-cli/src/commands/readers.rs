use std::process::ExitCode;

use transit_card::CardReader;

pub fn cmd_readers() -> ExitCode {
    let reader = match CardReader::new() {
        Ok(r) => r,
        Err(err) => {
            eprintln!("Failed to establish PC/SC context: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match reader.list_readers() {
        Ok(readers) if readers.is_empty() => {
            println!("No card readers found");
            ExitCode::FAILURE
        }
        Ok(readers) => {
            println!("Found {} reader(s):", readers.len());
            for (i, name) in readers.iter().enumerate() {
                println!("  {}. {}", i + 1, name);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Failed to list readers: {}", err);
            ExitCode::FAILURE
        }
    }
}

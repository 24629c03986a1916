use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod formatters;
mod tui;

use formatters::FormatMode;

#[derive(Parser)]
#[command(name = "transit-reader")]
#[command(about = "Transit Card Reader - Read balance, trips and card details over NFC")]
#[command(version)]
struct Args {
    /// Log level used when RUST_LOG is not set [default: info, off for tui]
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List connected card readers
    Readers,
    /// Read balance, transactions and card details
    Info {
        #[command(flatten)]
        session: SessionArgs,
        /// Output format mode
        #[arg(short, long, value_enum, default_value_t = FormatMode::Human)]
        format: FormatMode,
    },
    /// Print raw ledger slots from every candidate SFI
    Dump {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Interactive terminal UI
    Tui {
        #[command(flatten)]
        session: SessionArgs,
    },
}

#[derive(clap::Args)]
struct SessionArgs {
    /// Reader name (defaults to the first reader)
    #[arg(short, long)]
    reader: Option<String>,
    /// Highest ledger record number to read per SFI (1-20)
    #[arg(long)]
    max_records: Option<u8>,
    /// TOML file with reader settings
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Log lines on stderr would tear the TUI's alternate screen
    let default_level = match (&args.log_level, &args.command) {
        (Some(level), _) => level.as_str(),
        (None, Command::Tui { .. }) => "off",
        (None, _) => "info",
    };

    // Set RUST_LOG=debug to see every APDU exchange
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Readers => commands::readers::cmd_readers(),
        Command::Info { session, format } => match commands::load_config(session.config.as_deref(), session.max_records) {
            Ok(config) => commands::info::cmd_info(session.reader.as_deref(), &config, format),
            Err(err) => config_error(err),
        },
        Command::Dump { session } => match commands::load_config(session.config.as_deref(), session.max_records) {
            Ok(config) => commands::dump::cmd_dump(session.reader.as_deref(), &config),
            Err(err) => config_error(err),
        },
        Command::Tui { session } => match commands::load_config(session.config.as_deref(), session.max_records) {
            Ok(config) => match tui::run_tui(session.reader, config) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("TUI error: {}", err);
                    ExitCode::FAILURE
                }
            },
            Err(err) => config_error(err),
        },
    }
}

fn config_error(err: transit_card::ConfigError) -> ExitCode {
    eprintln!("{}", err);
    ExitCode::FAILURE
}

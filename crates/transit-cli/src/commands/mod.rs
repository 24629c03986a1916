pub mod card_info;
pub mod dump;
pub mod info;
pub mod info_formatter;
pub mod readers;

use std::path::Path;

use transit_card::{ConfigError, ReaderConfig};

/// Reader settings from an optional TOML file, with command-line overrides
pub(crate) fn load_config(path: Option<&Path>, max_records: Option<u8>) -> Result<ReaderConfig, ConfigError> {
    let config = match path {
        Some(path) => ReaderConfig::load(path)?,
        None => ReaderConfig::default(),
    };

    Ok(match max_records {
        Some(max_records) => config.with_max_records(max_records),
        None => config,
    })
}

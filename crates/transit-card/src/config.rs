//! Reader configuration

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_MAX_RECORDS: u8 = 10;
pub const MAX_RECORDS_LIMIT: u8 = 20;

/// Ledger locations to probe, most specific first
pub const DEFAULT_CANDIDATE_SFIS: [u8; 6] = [24, 21, 18, 15, 3, 2];

/// Knobs for a read session, loadable from TOML
///
/// ```toml
/// max_records = 20
/// candidate_sfis = [24, 21, 18]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    /// Highest record slot read per location
    pub max_records: u8,
    pub candidate_sfis: Vec<u8>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            candidate_sfis: DEFAULT_CANDIDATE_SFIS.to_vec(),
        }
    }
}

impl ReaderConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_records(mut self, max_records: u8) -> Self {
        self.max_records = max_records;
        self
    }

    /// `max_records` clamped to `1..=20`
    pub fn record_limit(&self) -> u8 {
        self.max_records.clamp(1, MAX_RECORDS_LIMIT)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidate_sfis.is_empty() {
            return Err(ConfigError::NoCandidates);
        }
        // P2 carries the SFI in its top five bits; 0 and 31 are reserved
        match self.candidate_sfis.iter().find(|sfi| !(1..=30).contains(*sfi)) {
            Some(&sfi) => Err(ConfigError::InvalidSfi(sfi)),
            None => Ok(()),
        }
    }
}

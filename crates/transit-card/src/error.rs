use std::path::PathBuf;

use thiserror::Error;
use transit_common::IdentityError;

pub type Result<T> = std::result::Result<T, ReadError>;

/// Why a single read stage produced no value
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("transport error: {0}")]
    Transport(#[from] pcsc::Error),
    #[error("{command} rejected by card: SW={status}")]
    Status { command: &'static str, status: String },
    #[error("{command} response too short: {actual} bytes, need {expected}")]
    ShortResponse {
        command: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{command} returned no data")]
    EmptyResponse { command: &'static str },
    #[error("malformed identity record: {0}")]
    Identity(#[from] IdentityError),
    #[error("no supported application on card")]
    NoApplication,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("SFI {0} out of range, must be 1..=30")]
    InvalidSfi(u8),
    #[error("no candidate SFIs configured")]
    NoCandidates,
}

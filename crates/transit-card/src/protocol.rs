//! Transit card application protocol

use serde::{Serialize, Serializer};
use tracing::{info, warn};
use transit_common::{parse_identity_record, Amount, IdentityRecord};

use crate::apdu::{commands, ApduResponse, Transport};
use crate::config::ReaderConfig;
use crate::error::{ReadError, Result};
use crate::ledger::{self, LedgerScan};

/// Known transit Application Identifiers (AIDs)
pub mod aids {
    /// MOHURD interoperable transit application
    pub const MOHURD: &[u8] = &[0xA0, 0x00, 0x00, 0x06, 0x32, 0x01, 0x01, 0x05];

    /// China T-Union transit application
    pub const T_UNION: &[u8] = &[0xA0, 0x00, 0x00, 0x06, 0x32, 0x01, 0x01, 0x06];
}

/// An application identifier with a display label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApplicationProfile {
    #[serde(serialize_with = "serialize_hex")]
    pub aid: &'static [u8],
    pub label: &'static str,
}

/// Applications in selection order
pub const PROFILES: [ApplicationProfile; 2] = [
    ApplicationProfile {
        aid: aids::MOHURD,
        label: "MOHURD (primary)",
    },
    ApplicationProfile {
        aid: aids::T_UNION,
        label: "T-Union (fallback)",
    },
];

fn serialize_hex<S: Serializer>(bytes: &&'static [u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode_upper(bytes))
}

/// Transit card interface over one connection
pub struct TransitCard<'a, T: Transport + ?Sized> {
    transport: &'a T,
    config: ReaderConfig,
    profile: Option<ApplicationProfile>,
}

impl<'a, T: Transport + ?Sized> TransitCard<'a, T> {
    /// Create a new transit card interface with the default configuration
    pub fn new(transport: &'a T) -> Self {
        Self::with_config(transport, ReaderConfig::default())
    }

    pub fn with_config(transport: &'a T, config: ReaderConfig) -> Self {
        Self {
            transport,
            config,
            profile: None,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// The application accepted by the last successful selection
    pub fn active_profile(&self) -> Option<ApplicationProfile> {
        self.profile
    }

    /// Select an application by AID
    pub fn select(&mut self, profile: ApplicationProfile) -> std::result::Result<ApduResponse, pcsc::Error> {
        let response = commands::select(profile.aid).send(self.transport)?;

        if response.is_success() {
            self.profile = Some(profile);
        }

        Ok(response)
    }

    /// Select the first supported application, trying [`PROFILES`] in order
    pub fn select_application(&mut self) -> Result<ApplicationProfile> {
        self.select_from(&PROFILES)
    }

    /// Select the first profile the card accepts
    ///
    /// A transport fault counts as a rejection of that profile only; the
    /// remaining profiles are still tried.
    pub fn select_from(&mut self, profiles: &[ApplicationProfile]) -> Result<ApplicationProfile> {
        for &profile in profiles {
            match self.select(profile) {
                Ok(response) if response.is_success() => {
                    info!(application = profile.label, "Selected application");
                    return Ok(profile);
                }
                Ok(response) => {
                    info!(application = profile.label, sw = %response.status_string(), "Application rejected");
                }
                Err(e) => {
                    warn!(application = profile.label, error = %e, "Failed to select application");
                }
            }
        }

        warn!("No supported application on card");
        Err(ReadError::NoApplication)
    }

    /// Read the stored-value balance
    pub fn read_balance(&self) -> Result<Amount> {
        const COMMAND: &str = "GET BALANCE";

        let response = commands::query_balance().send(self.transport)?;
        if !response.is_success() {
            return Err(ReadError::Status {
                command: COMMAND,
                status: response.status_string(),
            });
        }

        Amount::from_be_slice(&response.data).ok_or(ReadError::ShortResponse {
            command: COMMAND,
            expected: 4,
            actual: response.data.len(),
        })
    }

    /// Read and decode the card identity record
    pub fn read_identity(&self) -> Result<IdentityRecord> {
        const COMMAND: &str = "READ BINARY";

        let response = commands::read_identity().send(self.transport)?;
        if !response.is_success() {
            return Err(ReadError::Status {
                command: COMMAND,
                status: response.status_string(),
            });
        }
        if response.data.is_empty() {
            return Err(ReadError::EmptyResponse { command: COMMAND });
        }

        Ok(parse_identity_record(&response.data)?)
    }

    /// Find and decode the transaction ledger, newest first
    pub fn read_transactions(&self) -> LedgerScan {
        ledger::read_ledger(self.transport, &self.config)
    }
}

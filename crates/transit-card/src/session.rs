//! One complete card read: select, balance, ledger, identity

use serde::Serialize;
use tracing::{debug, info, warn};
use transit_common::{Amount, IdentityRecord, TransactionRecord};

use crate::apdu::Transport;
use crate::protocol::{ApplicationProfile, TransitCard};

/// Stages of a read session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStage {
    Idle,
    Selecting,
    SelectionFailed,
    Selected,
    BalanceRead,
    LedgerRead,
    IdentityRead,
    Done,
}

/// Everything a read session learned about the card
#[derive(Debug, Clone, Serialize)]
pub struct CardReadResult {
    /// True once an application was selected, whatever later stages did
    pub success: bool,
    pub message: String,
    /// Last stage reached, `Done` or `SelectionFailed`
    pub stage: SessionStage,
    pub profile: Option<ApplicationProfile>,
    pub balance: Option<Amount>,
    /// Newest first
    pub transactions: Vec<TransactionRecord>,
    /// SFI the transactions were read from
    pub ledger_sfi: Option<u8>,
    pub identity: Option<IdentityRecord>,
    /// Human-readable progress notes in order
    pub logs: Vec<String>,
}

impl Default for CardReadResult {
    fn default() -> Self {
        Self {
            success: false,
            message: String::new(),
            stage: SessionStage::Idle,
            profile: None,
            balance: None,
            transactions: Vec::new(),
            ledger_sfi: None,
            identity: None,
            logs: Vec::new(),
        }
    }
}

impl CardReadResult {
    fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.logs.push(message);
    }

    fn enter(&mut self, stage: SessionStage) {
        debug!(from = ?self.stage, to = ?stage, "Session stage");
        self.stage = stage;
    }
}

impl<'a, T: Transport + ?Sized> TransitCard<'a, T> {
    /// Run a full read session
    ///
    /// Never fails: a card without a supported application yields
    /// `success == false` and no further commands are sent. Balance, ledger
    /// and identity are each attempted regardless of the others' outcome.
    pub fn read_card_info(&mut self) -> CardReadResult {
        let mut result = CardReadResult::default();

        result.enter(SessionStage::Selecting);
        let profile = match self.select_application() {
            Ok(profile) => profile,
            Err(e) => {
                result.enter(SessionStage::SelectionFailed);
                result.message = "Unrecognised card: no supported application".to_string();
                result.log(format!("Card not recognised ({})", e));
                return result;
            }
        };
        result.enter(SessionStage::Selected);
        result.success = true;
        result.profile = Some(profile);
        result.log(format!("Card recognised ({})", profile.label));

        result.enter(SessionStage::BalanceRead);
        match self.read_balance() {
            Ok(balance) => {
                result.balance = Some(balance);
                result.log(format!("Balance: {}", balance));
            }
            Err(e) => {
                warn!(error = %e, "Failed to read balance");
                result.log(format!("Balance read failed: {}", e));
            }
        }

        result.enter(SessionStage::LedgerRead);
        let scan = self.read_transactions();
        result.ledger_sfi = scan.sfi;
        result.transactions = scan.records;
        match result.ledger_sfi {
            Some(sfi) => {
                let count = result.transactions.len();
                result.log(format!("Read {} transaction records (SFI {})", count, sfi));
            }
            None => result.log("No transaction records found"),
        }

        result.enter(SessionStage::IdentityRead);
        match self.read_identity() {
            Ok(identity) => {
                result.log(format!("Card number: {}", identity.card_number));
                result.log(format!("Issued: {}", identity.issue_date));
                result.log(format!("Valid until: {}", identity.expiry_date));
                result.identity = Some(identity);
            }
            Err(e) => {
                warn!(error = %e, "Failed to read card identity");
                result.log(format!("Card number read failed: {}", e));
            }
        }

        result.enter(SessionStage::Done);
        result.message = "Card read complete".to_string();
        result
    }
}

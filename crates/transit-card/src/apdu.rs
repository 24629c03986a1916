//! APDU (Application Protocol Data Unit) command handling

use pcsc::{Card, MAX_BUFFER_SIZE};
use tracing::debug;

/// APDU response containing data and status word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    /// Response data (without status word)
    pub data: Vec<u8>,
    /// Status word SW1
    pub sw1: u8,
    /// Status word SW2
    pub sw2: u8,
}

impl ApduResponse {
    /// Split a raw response into data and the trailing status word
    pub fn from_raw(rapdu: &[u8]) -> Result<Self, pcsc::Error> {
        if rapdu.len() < 2 {
            return Err(pcsc::Error::InsufficientBuffer);
        }

        let (data, sw) = rapdu.split_at(rapdu.len() - 2);
        Ok(Self {
            data: data.to_vec(),
            sw1: sw[0],
            sw2: sw[1],
        })
    }

    /// Check if the response indicates success (9000)
    pub fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }

    /// Get the full status word as a 16-bit value
    pub fn status_word(&self) -> u16 {
        ((self.sw1 as u16) << 8) | (self.sw2 as u16)
    }

    /// Get status word as hex string (e.g., "9000")
    pub fn status_string(&self) -> String {
        format!("{:02X}{:02X}", self.sw1, self.sw2)
    }
}

/// Anything that can exchange a command APDU for a response APDU
///
/// Channel-level failures (reader gone, card removed, timeout) are reported
/// as `pcsc::Error`; a card-reported failure is a successful exchange with a
/// non-9000 status word.
pub trait Transport {
    fn send_apdu(&self, apdu: &[u8]) -> Result<ApduResponse, pcsc::Error>;
}

impl Transport for Card {
    fn send_apdu(&self, apdu: &[u8]) -> Result<ApduResponse, pcsc::Error> {
        send_apdu(self, apdu)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send_apdu(&self, apdu: &[u8]) -> Result<ApduResponse, pcsc::Error> {
        (**self).send_apdu(apdu)
    }
}

/// Send an APDU command to the card and return the response
pub fn send_apdu(card: &Card, apdu: &[u8]) -> Result<ApduResponse, pcsc::Error> {
    let mut rapdu_buf = [0; MAX_BUFFER_SIZE];
    let rapdu = card.transmit(apdu, &mut rapdu_buf)?;
    ApduResponse::from_raw(rapdu)
}

/// Largest payload a one-byte Lc can describe
pub const MAX_SHORT_DATA: usize = 255;

/// APDU command builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduCommand {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: Vec<u8>,
    le: Option<u8>,
}

impl ApduCommand {
    /// Create a new APDU command
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    /// Set command data
    ///
    /// Short APDUs only: Lc is one byte, so the payload must not exceed 255 bytes.
    pub fn data(mut self, data: Vec<u8>) -> Self {
        debug_assert!(data.len() <= MAX_SHORT_DATA, "short APDU payload over 255 bytes");
        self.data = data;
        self
    }

    /// Set expected response length
    pub fn le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// Build the APDU command bytes
    pub fn build(&self) -> Vec<u8> {
        let mut apdu = vec![self.cla, self.ins, self.p1, self.p2];

        if !self.data.is_empty() {
            debug_assert!(self.data.len() <= MAX_SHORT_DATA);
            apdu.push(self.data.len() as u8);
            apdu.extend_from_slice(&self.data);
        }

        if let Some(le) = self.le {
            apdu.push(le);
        }

        apdu
    }

    /// Send this command over a transport
    pub fn send<T: Transport + ?Sized>(&self, transport: &T) -> Result<ApduResponse, pcsc::Error> {
        let apdu_bytes = self.build();
        let response = transport.send_apdu(&apdu_bytes)?;

        debug!(
            apdu = %hex::encode_upper(&apdu_bytes),
            sw = %response.status_string(),
            len = response.data.len(),
            "APDU exchange"
        );

        Ok(response)
    }
}

/// Commands understood by the supported transit applications
pub mod commands {
    use super::ApduCommand;

    /// SELECT command (by name/AID), no Le
    pub fn select(aid: &[u8]) -> ApduCommand {
        ApduCommand::new(0x00, 0xA4, 0x04, 0x00).data(aid.to_vec())
    }

    /// READ BINARY of the card identity file (short EF 0x15)
    pub fn read_identity() -> ApduCommand {
        ApduCommand::new(0x00, 0xB0, 0x95, 0x00).le(0x00)
    }

    /// GET BALANCE of the electronic purse
    pub fn query_balance() -> ApduCommand {
        ApduCommand::new(0x80, 0x5C, 0x00, 0x02).le(0x04)
    }

    /// READ RECORD command
    pub fn read_record(record_number: u8, sfi: u8) -> ApduCommand {
        let p2 = (sfi << 3) | 0x04;
        ApduCommand::new(0x00, 0xB2, record_number, p2).le(0x00)
    }
}

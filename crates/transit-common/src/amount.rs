//! Fixed-point currency amounts with two implied decimal digits

use std::fmt;

use serde::{Serialize, Serializer};

/// A monetary amount stored as an integer number of cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    cents: u32,
}

impl Amount {
    pub const fn from_cents(cents: u32) -> Self {
        Self { cents }
    }

    /// Decode a big-endian unsigned cent count, as stored on the card
    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self::from_cents(u32::from_be_bytes(bytes))
    }

    /// Decode the first four bytes of `data`, if there are that many
    pub fn from_be_slice(data: &[u8]) -> Option<Self> {
        let bytes: [u8; 4] = data.get(..4)?.try_into().ok()?;
        Some(Self::from_be_bytes(bytes))
    }

    pub fn cents(&self) -> u32 {
        self.cents
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.cents) / 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_be_bytes() {
        let amount = Amount::from_be_bytes([0x00, 0x00, 0x27, 0x10]);
        assert_eq!(amount.cents(), 10_000);
        assert_eq!(amount.to_string(), "100.00");
    }

    #[test]
    fn test_display_keeps_two_decimals() {
        assert_eq!(Amount::from_cents(0).to_string(), "0.00");
        assert_eq!(Amount::from_cents(5).to_string(), "0.05");
        assert_eq!(Amount::from_cents(1234).to_string(), "12.34");
        assert_eq!(Amount::from_cents(u32::MAX).to_string(), "42949672.95");
    }

    #[test]
    fn test_from_be_slice_uses_first_four_bytes() {
        let amount = Amount::from_be_slice(&[0x00, 0x00, 0x01, 0x00, 0xFF, 0xFF]);
        assert_eq!(amount, Some(Amount::from_cents(256)));
        assert_eq!(Amount::from_be_slice(&[0x00, 0x01, 0x02]), None);
    }

    #[test]
    fn test_matches_integer_division() {
        for raw in [0u32, 1, 99, 100, 101, 9_999, 123_456_789] {
            let amount = Amount::from_be_bytes(raw.to_be_bytes());
            assert_eq!(format!("{:.2}", raw as f64 / 100.0), amount.to_string());
        }
    }
}

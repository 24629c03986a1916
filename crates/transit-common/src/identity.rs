//! Card identity record (card number and validity window)

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;

/// Bytes needed to cover the expiry date field
pub const MIN_IDENTITY_LEN: usize = 28;

const CARD_NUMBER: std::ops::Range<usize> = 20..40;
const ISSUE_DATE: std::ops::Range<usize> = 40..48;
const EXPIRY_DATE: std::ops::Range<usize> = 48..56;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity record too short: {len} bytes, need 28")]
    TooShort { len: usize },
    #[error("invalid {field} date: {raw}")]
    InvalidDate { field: &'static str, raw: String },
}

/// Decoded identity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityRecord {
    /// 20 hex characters, verbatim
    pub card_number: String,
    /// `YYYY/MM/DD`
    pub issue_date: String,
    /// `YYYY/MM/DD`
    pub expiry_date: String,
}

/// Decode the identity record returned by READ BINARY
///
/// The response is rendered as uppercase hex and sliced by character offset.
/// Dates that are not valid calendar dates reject the whole record.
pub fn parse_identity_record(data: &[u8]) -> Result<IdentityRecord, IdentityError> {
    if data.len() < MIN_IDENTITY_LEN {
        return Err(IdentityError::TooShort { len: data.len() });
    }

    let hex = hex::encode_upper(data);

    Ok(IdentityRecord {
        card_number: hex[CARD_NUMBER].to_string(),
        issue_date: format_card_date("issue", &hex[ISSUE_DATE])?,
        expiry_date: format_card_date("expiry", &hex[EXPIRY_DATE])?,
    })
}

/// `YYYYMMDD` to `YYYY/MM/DD`
///
/// Year 0 parses in chrono but is not a calendar year.
fn format_card_date(field: &'static str, raw: &str) -> Result<String, IdentityError> {
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .ok()
        .filter(|date| date.year() >= 1)
        .map(|date| date.format("%Y/%m/%d").to_string())
        .ok_or_else(|| IdentityError::InvalidDate {
            field,
            raw: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_bytes(card: &str, issue: &str, expiry: &str) -> Vec<u8> {
        let hex = format!("{}{}{}{}", "00".repeat(10), card, issue, expiry);
        hex::decode(hex).unwrap()
    }

    #[test]
    fn test_parse_identity() {
        let data = identity_bytes("31040000123456789012", "20230115", "20330115");
        let identity = parse_identity_record(&data).unwrap();

        assert_eq!(identity.card_number, "31040000123456789012");
        assert_eq!(identity.issue_date, "2023/01/15");
        assert_eq!(identity.expiry_date, "2033/01/15");
    }

    #[test]
    fn test_card_number_keeps_hex_letters() {
        let data = identity_bytes("ABCDEF0000000000FFFF", "20200101", "20300101");
        let identity = parse_identity_record(&data).unwrap();
        assert_eq!(identity.card_number, "ABCDEF0000000000FFFF");
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut data = identity_bytes("00000000000000000001", "20230115", "20330115");
        data.extend_from_slice(&[0xFF; 8]);
        assert!(parse_identity_record(&data).is_ok());
    }

    #[test]
    fn test_too_short() {
        let data = identity_bytes("00000000000000000001", "20230115", "20330115");
        let err = parse_identity_record(&data[..MIN_IDENTITY_LEN - 1]).unwrap_err();
        assert_eq!(err, IdentityError::TooShort { len: MIN_IDENTITY_LEN - 1 });
        assert!(matches!(parse_identity_record(&[]), Err(IdentityError::TooShort { len: 0 })));
    }

    #[test]
    fn test_invalid_issue_date() {
        let data = identity_bytes("00000000000000000001", "20231315", "20330115");
        let err = parse_identity_record(&data).unwrap_err();
        assert_eq!(
            err,
            IdentityError::InvalidDate {
                field: "issue",
                raw: "20231315".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_expiry_date() {
        let data = identity_bytes("00000000000000000001", "20230115", "FFFFFFFF");
        assert!(matches!(
            parse_identity_record(&data),
            Err(IdentityError::InvalidDate { field: "expiry", .. })
        ));
    }

    #[test]
    fn test_year_zero_date_rejected() {
        let data = identity_bytes("31040000000012345678", "00000115", "20330115");
        assert_eq!(
            parse_identity_record(&data).unwrap_err(),
            IdentityError::InvalidDate {
                field: "issue",
                raw: "00000115".to_string()
            }
        );

        let data = identity_bytes("31040000000012345678", "20230115", "00000115");
        assert!(matches!(
            parse_identity_record(&data),
            Err(IdentityError::InvalidDate { field: "expiry", .. })
        ));
    }
}

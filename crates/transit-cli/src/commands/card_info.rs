//! Data structures for card information

use serde::Serialize;
use transit_card::CardReadResult;

/// Complete card information collected during reading
#[derive(Debug, Clone, Serialize)]
pub struct CardInfoData {
    pub reader_name: String,
    #[serde(flatten)]
    pub result: CardReadResult,
}

//! Solution Records

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::uuids::TypedUuid;

/// Solution UUID
pub type SolutionUuid = TypedUuid<SolutionRecord>;

/// A purchasable course or consulting package.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionRecord {
    pub uuid: SolutionUuid,
    pub title: String,
    pub description: Option<String>,

    /// Canonical price in major currency units.
    pub price: Decimal,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

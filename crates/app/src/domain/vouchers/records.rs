//! Voucher Records

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{domain::solutions::records::SolutionUuid, uuids::TypedUuid};

/// Voucher UUID
pub type VoucherUuid = TypedUuid<VoucherRecord>;

/// How a voucher reduces the cart amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discount {
    /// Percentage off, in the range `0..=100`.
    Percentage(Decimal),

    /// Fixed amount off, in major currency units.
    Fixed(Decimal),
}

impl Discount {
    #[must_use]
    pub const fn type_as_str(&self) -> &'static str {
        match self {
            Self::Percentage(_) => "percentage",
            Self::Fixed(_) => "fixed",
        }
    }

    #[must_use]
    pub const fn value(&self) -> Decimal {
        match self {
            Self::Percentage(value) | Self::Fixed(value) => *value,
        }
    }

    /// Rebuild a discount from its stored type tag and value.
    #[must_use]
    pub fn from_parts(kind: &str, value: Decimal) -> Option<Self> {
        match kind {
            "percentage" => Some(Self::Percentage(value)),
            "fixed" => Some(Self::Fixed(value)),
            _ => None,
        }
    }
}

/// Voucher Record
#[derive(Debug, Clone, PartialEq)]
pub struct VoucherRecord {
    pub uuid: VoucherUuid,

    /// Upper-cased redemption code.
    pub code: String,

    pub discount: Discount,
    pub expires_at: Timestamp,

    /// Maximum redemptions; `0` means unlimited.
    pub usage_limit: u32,

    pub usage_count: u32,
    pub once_per_user: bool,

    /// Solutions the voucher applies to; empty means all.
    pub applicable_solutions: Vec<SolutionUuid>,

    /// Lower-cased emails allowed to redeem; empty means everyone.
    pub applicable_emails: Vec<String>,

    pub min_cart_amount: Decimal,
    pub new_users_only: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl VoucherRecord {
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.usage_limit > 0 && self.usage_count >= self.usage_limit
    }
}

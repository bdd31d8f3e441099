//! Order Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::{domain::solutions::records::SolutionUuid, uuids::TypedUuid};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment status: {0}")]
pub struct UnknownPaymentStatus(pub String);

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownPaymentStatus(other.to_string())),
        }
    }
}

/// Contact details of the person paying for a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buyer {
    pub first_name: String,
    pub last_name: String,

    /// Lower-cased.
    pub email: String,

    pub phone: Option<String>,
    pub organization: Option<String>,
}

impl Buyer {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A registration for a paid solution.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub buyer: Buyer,
    pub solution: SolutionUuid,

    /// Catalog price at the time of ordering.
    pub base_amount: Decimal,

    /// Amount charged after any voucher.
    pub final_amount: Decimal,

    pub voucher_code: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub payment_method: Option<String>,
    pub paid_at: Option<Timestamp>,

    /// Raw verification payload returned by the gateway.
    pub gateway_payload: Option<Value>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_parses_its_own_labels() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>(), Ok(status));
        }

        assert!("refunded".parse::<PaymentStatus>().is_err());
    }
}

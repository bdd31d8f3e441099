//! Orders Data

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::{
    orders::records::{Buyer, OrderUuid, PaymentStatus},
    solutions::records::SolutionUuid,
};

/// New Order Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub buyer: Buyer,
    pub solution: SolutionUuid,
    pub base_amount: Decimal,
    pub final_amount: Decimal,
    pub voucher_code: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub paid_at: Option<Timestamp>,
}

/// Details stamped on an order when its payment is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmation {
    pub payment_method: String,
    pub paid_at: Timestamp,
    pub gateway_payload: Value,
}

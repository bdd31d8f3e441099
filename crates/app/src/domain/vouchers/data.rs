//! Vouchers Data

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::domain::{
    solutions::records::SolutionUuid,
    vouchers::records::{Discount, VoucherRecord, VoucherUuid},
};

/// New Voucher Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewVoucher {
    pub uuid: VoucherUuid,
    pub code: String,
    pub discount: Discount,
    pub expires_at: Timestamp,
    pub usage_limit: u32,
    pub once_per_user: bool,
    pub applicable_solutions: Vec<SolutionUuid>,
    pub applicable_emails: Vec<String>,
    pub min_cart_amount: Decimal,
    pub new_users_only: bool,
}

/// Cart context a voucher is evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub email: String,
    pub solution: SolutionUuid,
    pub amount: Decimal,
}

/// A voucher that passed every eligibility check, with the price it yields.
#[derive(Debug, Clone, PartialEq)]
pub struct VoucherQuote {
    pub voucher: VoucherRecord,
    pub original_amount: Decimal,
    pub discounted_amount: Decimal,
}

/// Canonical form of a voucher code.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

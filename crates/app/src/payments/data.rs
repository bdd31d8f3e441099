//! Payments Data

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    domain::{
        orders::records::{Buyer, OrderRecord, OrderUuid},
        solutions::records::{SolutionRecord, SolutionUuid},
        vouchers::records::VoucherRecord,
    },
    payments::effects::SideEffects,
};

/// A price check before checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest {
    pub email: String,
    pub solution: SolutionUuid,
    pub voucher_code: Option<String>,
}

/// The canonical price of a solution for one buyer.
#[derive(Debug, Clone, PartialEq)]
pub struct Pricing {
    pub solution: SolutionRecord,
    pub original_amount: Decimal,
    pub final_amount: Decimal,
    pub voucher: Option<VoucherRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatePayment {
    pub buyer: Buyer,
    pub solution: SolutionUuid,
    pub voucher_code: Option<String>,
    pub callback_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Initiation {
    /// The buyer continues at the gateway.
    Redirect {
        order: OrderUuid,
        authorization_url: String,
        reference: String,
    },

    /// Nothing to pay; the registration is already complete.
    Completed {
        order: Box<OrderRecord>,
        effects: SideEffects,
    },
}

/// A payment confirmed by this verification.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedPayment {
    pub order: OrderRecord,
    pub solution_title: String,
    pub paid_at: Timestamp,
    pub effects: SideEffects,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Completed(Box<CompletedPayment>),

    /// Someone else confirmed this reference; nothing was done.
    AlreadyProcessed { order: Option<Box<OrderRecord>> },

    /// The gateway reports the transaction did not succeed.
    Failed {
        status: String,
        order: Option<Box<OrderRecord>>,
    },
}

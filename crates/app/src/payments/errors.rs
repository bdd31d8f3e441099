//! Payments service errors.

use thiserror::Error;

use crate::{
    domain::{
        ledger::LedgerServiceError,
        orders::OrdersServiceError,
        solutions::SolutionsServiceError,
        vouchers::{VouchersServiceError, evaluator::VoucherRejection},
    },
    payments::gateway::GatewayError,
};

#[derive(Debug, Error)]
pub enum PaymentsServiceError {
    #[error("missing required field: {0}")]
    MissingRequiredData(&'static str),

    #[error("solution not found")]
    SolutionNotFound,

    #[error("order not found")]
    OrderNotFound,

    #[error(transparent)]
    Voucher(VoucherRejection),

    #[error("payment initiation failed")]
    InitiationFailed(#[source] GatewayError),

    #[error("payment verification unavailable")]
    VerificationUnavailable(#[source] GatewayError),

    /// The gateway answered with a client error, usually an unknown reference.
    #[error("payment reference rejected by gateway: {0}")]
    ReferenceRejected(String),

    #[error("solutions error")]
    Solutions(#[source] SolutionsServiceError),

    #[error("vouchers error")]
    Vouchers(#[source] VouchersServiceError),

    #[error("orders error")]
    Orders(#[source] OrdersServiceError),

    #[error("ledger error")]
    Ledger(#[from] LedgerServiceError),
}

impl From<SolutionsServiceError> for PaymentsServiceError {
    fn from(error: SolutionsServiceError) -> Self {
        match error {
            SolutionsServiceError::NotFound => Self::SolutionNotFound,
            other => Self::Solutions(other),
        }
    }
}

impl From<VouchersServiceError> for PaymentsServiceError {
    fn from(error: VouchersServiceError) -> Self {
        match error {
            VouchersServiceError::Rejected(rejection) => Self::Voucher(rejection),
            VouchersServiceError::NotFound => Self::Voucher(VoucherRejection::NotFound),
            other => Self::Vouchers(other),
        }
    }
}

impl From<OrdersServiceError> for PaymentsServiceError {
    fn from(error: OrdersServiceError) -> Self {
        match error {
            OrdersServiceError::VoucherExhausted => {
                Self::Voucher(VoucherRejection::UsageLimitReached)
            }
            other => Self::Orders(other),
        }
    }
}

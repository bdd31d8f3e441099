//! Payments
//!
//! Pricing, checkout initiation and idempotent confirmation of gateway
//! transactions.

pub mod data;
pub mod effects;
pub mod errors;
pub mod gateway;
pub mod service;

pub use errors::PaymentsServiceError;
pub use service::*;

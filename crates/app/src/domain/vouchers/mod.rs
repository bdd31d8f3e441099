//! Vouchers

pub mod data;
pub mod errors;
pub mod evaluator;
pub mod records;
mod repository;
pub mod service;

pub use errors::VouchersServiceError;
pub use service::*;

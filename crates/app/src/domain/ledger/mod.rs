//! Payment Ledger
//!
//! References whose successful verification has already been processed.
//! A live entry means "do not process again"; expired entries are swept.

pub mod errors;
mod repository;
pub mod service;
pub mod sweeper;

pub use errors::LedgerServiceError;
pub use service::*;

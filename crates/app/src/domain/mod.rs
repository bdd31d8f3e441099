//! Agora Domain Concerns

pub mod events;
pub mod ledger;
pub mod notifications;
pub mod orders;
pub mod solutions;
pub mod users;
pub mod vouchers;

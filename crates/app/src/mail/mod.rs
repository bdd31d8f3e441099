//! Outbound email

mod mailer;
mod retry;
pub mod templates;

pub use mailer::*;
pub use retry::*;

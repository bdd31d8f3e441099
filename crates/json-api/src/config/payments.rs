//! Payments Config

use std::time::Duration;

use clap::Args;
use jiff::SignedDuration;

use agora_app::{mail::RetryPolicy, payments::PaymentSettings};

/// Payment confirmation settings.
#[derive(Debug, Args)]
pub struct PaymentsConfig {
    /// Minutes a processed payment reference is remembered
    #[arg(long, env = "LEDGER_TTL_MINUTES", default_value_t = 30_i64)]
    pub ledger_ttl_minutes: i64,

    /// Attempts per outbound email
    #[arg(long, env = "EMAIL_RETRY_ATTEMPTS", default_value_t = 3_u32)]
    pub email_retry_attempts: u32,

    /// Seconds between email attempts
    #[arg(long, env = "EMAIL_RETRY_DELAY_SECONDS", default_value_t = 2_u64)]
    pub email_retry_delay_seconds: u64,
}

impl PaymentsConfig {
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.email_retry_attempts,
            delay: Duration::from_secs(self.email_retry_delay_seconds),
        }
    }

    #[must_use]
    pub fn settings(&self) -> PaymentSettings {
        PaymentSettings {
            ledger_ttl: SignedDuration::from_mins(self.ledger_ttl_minutes),
            email_retry: self.retry_policy(),
        }
    }
}

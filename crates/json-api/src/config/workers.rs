//! Background Task Config

use std::time::Duration;

use clap::Args;
use jiff::SignedDuration;

use agora_app::{mail::RetryPolicy, reminders::ReminderSettings};

/// Reminder scheduler and ledger sweeper settings.
#[derive(Debug, Args)]
pub struct WorkersConfig {
    /// Seconds between reminder scans
    #[arg(long, env = "REMINDER_INTERVAL_SECONDS", default_value_t = 600_u64)]
    pub reminder_interval_seconds: u64,

    /// How far ahead reminder scans look, in hours
    #[arg(long, env = "REMINDER_HORIZON_HOURS", default_value_t = 25_i64)]
    pub reminder_horizon_hours: i64,

    /// Seconds between expired ledger sweeps
    #[arg(long, env = "LEDGER_SWEEP_INTERVAL_SECONDS", default_value_t = 300_u64)]
    pub ledger_sweep_interval_seconds: u64,
}

impl WorkersConfig {
    #[must_use]
    pub fn reminder_settings(&self, retry: RetryPolicy) -> ReminderSettings {
        ReminderSettings {
            interval: Duration::from_secs(self.reminder_interval_seconds),
            horizon: SignedDuration::from_hours(self.reminder_horizon_hours),
            retry,
        }
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.ledger_sweep_interval_seconds)
    }
}

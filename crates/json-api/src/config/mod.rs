//! Server configuration module

use clap::Parser;

use crate::config::{
    db::DatabaseConfig, gateway::GatewayConfig, mail::MailConfig, observability::LoggingConfig,
    payments::PaymentsConfig, server::ServerRuntimeConfig, workers::WorkersConfig,
};

pub(crate) mod db;
pub(crate) mod gateway;
pub(crate) mod mail;
pub(crate) mod observability;
pub(crate) mod payments;
pub(crate) mod server;
pub(crate) mod workers;

/// Agora JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "agora-json", about = "Agora JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Payment gateway settings.
    #[command(flatten)]
    pub gateway: GatewayConfig,

    /// Outbound email settings.
    #[command(flatten)]
    pub mail: MailConfig,

    /// Payment confirmation settings.
    #[command(flatten)]
    pub payments: PaymentsConfig,

    /// Background task settings.
    #[command(flatten)]
    pub workers: WorkersConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;

    use super::*;

    const REQUIRED: [&str; 5] = [
        "agora-json",
        "--database-url",
        "postgres://localhost/agora",
        "--paystack-secret-key",
        "sk_test_123",
    ];

    #[test]
    fn defaults_cover_everything_but_secrets() -> TestResult {
        let config = ServerConfig::try_parse_from(REQUIRED)?;

        assert_eq!(config.socket_addr(), "0.0.0.0:8698");
        assert_eq!(config.gateway.paystack_base_url, "https://api.paystack.co");
        assert_eq!(config.payments.settings().ledger_ttl.as_mins(), 30);
        assert_eq!(config.payments.settings().email_retry.max_attempts, 3);
        assert_eq!(
            config.workers.reminder_settings(config.payments.retry_policy()).interval,
            Duration::from_secs(600)
        );
        assert_eq!(config.workers.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.database.pool().max_connections, 10);
        assert_eq!(config.server.shutdown_grace(), Duration::from_secs(30));

        Ok(())
    }

    #[test]
    fn missing_gateway_secret_is_rejected() {
        let parsed = ServerConfig::try_parse_from([
            "agora-json",
            "--database-url",
            "postgres://localhost/agora",
        ]);

        assert!(parsed.is_err(), "the gateway secret has no default");
    }

    #[test]
    fn flags_override_defaults() -> TestResult {
        let config = ServerConfig::try_parse_from(
            REQUIRED
                .into_iter()
                .chain(["--ledger-ttl-minutes", "5", "--reminder-horizon-hours", "48"]),
        )?;

        assert_eq!(config.payments.settings().ledger_ttl.as_mins(), 5);
        assert_eq!(
            config
                .workers
                .reminder_settings(config.payments.retry_policy())
                .horizon
                .as_hours(),
            48
        );

        Ok(())
    }
}

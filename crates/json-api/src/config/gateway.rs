//! Payment Gateway Config

use std::time::Duration;

use clap::Args;

use agora_app::payments::gateway::PaystackConfig;

/// Paystack settings.
#[derive(Args)]
pub struct GatewayConfig {
    /// Paystack API base URL
    #[arg(long, env = "PAYSTACK_BASE_URL", default_value = "https://api.paystack.co")]
    pub paystack_base_url: String,

    /// Paystack secret key
    #[arg(long, env = "PAYSTACK_SECRET_KEY", hide_env_values = true)]
    pub paystack_secret_key: String,

    /// Gateway request timeout in seconds
    #[arg(long, env = "PAYSTACK_TIMEOUT_SECONDS", default_value_t = 30_u64)]
    pub paystack_timeout_seconds: u64,
}

impl GatewayConfig {
    #[must_use]
    pub fn paystack(&self) -> PaystackConfig {
        PaystackConfig {
            base_url: self.paystack_base_url.clone(),
            secret_key: self.paystack_secret_key.clone(),
            timeout: Duration::from_secs(self.paystack_timeout_seconds),
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("paystack_base_url", &self.paystack_base_url)
            .field("paystack_secret_key", &"[redacted]")
            .field("paystack_timeout_seconds", &self.paystack_timeout_seconds)
            .finish()
    }
}

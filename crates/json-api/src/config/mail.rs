//! Mail Config

use clap::Args;

use agora_app::mail::SmtpSettings;

/// SMTP relay settings.
#[derive(Args)]
pub struct MailConfig {
    /// SMTP host
    #[arg(long, env = "SMTP_HOST", default_value = "localhost")]
    pub smtp_host: String,

    /// SMTP port
    #[arg(long, env = "SMTP_PORT", default_value_t = 587_u16)]
    pub smtp_port: u16,

    /// SMTP username
    #[arg(long, env = "SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    /// SMTP password
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Connect with TLS
    #[arg(long, env = "SMTP_TLS", default_value_t = true, action = clap::ArgAction::Set)]
    pub smtp_tls: bool,

    /// Sender address
    #[arg(long, env = "MAIL_FROM_EMAIL", default_value = "no-reply@agora.local")]
    pub mail_from_email: String,

    /// Sender display name
    #[arg(long, env = "MAIL_FROM_NAME", default_value = "Agora")]
    pub mail_from_name: String,
}

impl MailConfig {
    #[must_use]
    pub fn smtp(&self) -> SmtpSettings {
        SmtpSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            tls: self.smtp_tls,
            from_email: self.mail_from_email.clone(),
            from_name: self.mail_from_name.clone(),
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.smtp().fmt(f)
    }
}

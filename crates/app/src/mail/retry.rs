//! Bounded retry around a [`Mailer`].

use std::time::Duration;

use tracing::{error, warn};

use crate::mail::{EmailMessage, Mailer};

/// How many times to try a send, and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Outcome of a retried send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered { attempts: u32 },
    Failed { attempts: u32, error: String },
}

impl Delivery {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Send `message`, retrying transport failures with a fixed delay.
///
/// Address and build errors fail on the first attempt.
///
/// Never returns an error; exhaustion is reported through [`Delivery::Failed`].
pub async fn send_with_retry(
    mailer: &dyn Mailer,
    message: EmailMessage,
    policy: RetryPolicy,
) -> Delivery {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match mailer.send(message.clone()).await {
            Ok(()) => return Delivery::Delivered { attempts: attempt },
            Err(send_error) if attempt >= max_attempts || !send_error.is_transient() => {
                error!(
                    to = %message.to,
                    subject = %message.subject,
                    attempts = attempt,
                    error = %send_error,
                    "giving up on email delivery"
                );

                return Delivery::Failed {
                    attempts: attempt,
                    error: send_error.to_string(),
                };
            }
            Err(send_error) => {
                warn!(attempt, error = %send_error, "email send failed, retrying");

                tokio::time::sleep(policy.delay).await;

                attempt += 1;
            }
        }
    }
}

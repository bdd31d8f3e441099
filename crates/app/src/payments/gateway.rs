//! Payment gateway adapter.
//!
//! [`PaystackClient`] speaks the Paystack transaction API: amounts travel in
//! minor units and every response is wrapped in a `{status, message, data}`
//! envelope.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use reqwest::{Client, Url};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::domain::orders::records::OrderUuid;

/// Default gateway request timeout.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Status string the gateway reports for a settled transaction.
pub const SUCCESS_STATUS: &str = "success";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway unreachable: {0}")]
    Http(String),

    #[error("payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected payment gateway response: {0}")]
    InvalidResponse(String),

    #[error("amount {0} cannot be expressed in minor units")]
    AmountOutOfRange(Decimal),
}

/// Convert a major-unit amount to minor units, rounding midpoints away from zero.
pub fn to_minor_units(amount: Decimal) -> Result<u64, GatewayError> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(GatewayError::AmountOutOfRange(amount))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeTransaction {
    pub email: String,
    pub amount_minor: u64,
    pub callback_url: String,
    pub order: OrderUuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// What the gateway knows about a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedTransaction {
    pub status: String,
    pub reference: String,
    pub amount_minor: u64,
    pub channel: Option<String>,
    pub paid_at: Option<Timestamp>,

    /// Order id carried in the transaction metadata.
    pub order: Option<OrderUuid>,

    /// The transaction exactly as the gateway returned it.
    pub raw: Value,
}

impl VerifiedTransaction {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a transaction and obtain the URL the buyer pays at.
    async fn initialize(
        &self,
        transaction: InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayError>;

    /// Ask the gateway for the current state of a transaction.
    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError>;
}

#[derive(Clone)]
pub struct PaystackConfig {
    pub base_url: String,
    pub secret_key: String,
    pub timeout: Duration,
}

impl fmt::Debug for PaystackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaystackConfig")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[redacted]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,

    #[serde(default)]
    message: String,

    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    status: String,
    reference: String,
    amount: u64,

    #[serde(default)]
    channel: Option<String>,

    #[serde(default)]
    paid_at: Option<String>,

    #[serde(default)]
    metadata: Value,
}

#[derive(Debug, Clone)]
pub struct PaystackClient {
    client: Client,
    base_url: Url,
    secret_key: String,
}

impl PaystackClient {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidResponse`] for an unusable base URL and
    /// [`GatewayError::Http`] when the HTTP client cannot be constructed.
    pub fn new(config: &PaystackConfig) -> Result<Self, GatewayError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|error| GatewayError::InvalidResponse(format!("base url: {error}")))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| GatewayError::Http(error.to_string()))?;

        Ok(Self {
            client,
            base_url,
            secret_key: config.secret_key.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();

        let Ok(mut path) = url.path_segments_mut() else {
            return Err(GatewayError::InvalidResponse(
                "base url cannot have a path".to_string(),
            ));
        };

        path.pop_if_empty().extend(segments);
        drop(path);

        Ok(url)
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<(T, Value), GatewayError> {
        let status = response.status();

        let body: Value = response
            .json()
            .await
            .map_err(|error| GatewayError::InvalidResponse(error.to_string()))?;

        let envelope: Envelope<Value> = serde_json::from_value(body)
            .map_err(|error| GatewayError::InvalidResponse(error.to_string()))?;

        if !status.is_success() || !envelope.status {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: envelope.message,
            });
        }

        let raw = envelope
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("missing data".to_string()))?;

        let data = serde_json::from_value(raw.clone())
            .map_err(|error| GatewayError::InvalidResponse(error.to_string()))?;

        Ok((data, raw))
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    #[tracing::instrument(
        name = "payments.gateway.initialize",
        skip(self, transaction),
        fields(order_uuid = %transaction.order, amount_minor = transaction.amount_minor),
        err
    )]
    async fn initialize(
        &self,
        transaction: InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayError> {
        let body = json!({
            "email": transaction.email,
            "amount": transaction.amount_minor,
            "callback_url": transaction.callback_url,
            "metadata": { "registrationId": transaction.order.to_string() },
        });

        let response = self
            .client
            .post(self.endpoint(&["transaction", "initialize"])?)
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|error| GatewayError::Http(error.to_string()))?;

        let (initialized, _): (InitializedTransaction, Value) =
            Self::read_envelope(response).await?;

        debug!(reference = %initialized.reference, "initialized transaction");

        Ok(initialized)
    }

    #[tracing::instrument(name = "payments.gateway.verify", skip(self), err)]
    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError> {
        let response = self
            .client
            .get(self.endpoint(&["transaction", "verify", reference])?)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|error| GatewayError::Http(error.to_string()))?;

        let (data, raw): (TransactionData, Value) = Self::read_envelope(response).await?;

        let paid_at = match data.paid_at.as_deref() {
            Some(paid_at) => Some(paid_at.parse::<Timestamp>().map_err(|error| {
                GatewayError::InvalidResponse(format!("paid_at {paid_at:?}: {error}"))
            })?),
            None => None,
        };

        let order = data
            .metadata
            .get("registrationId")
            .and_then(Value::as_str)
            .and_then(|id| id.parse::<OrderUuid>().ok());

        Ok(VerifiedTransaction {
            status: data.status,
            reference: data.reference,
            amount_minor: data.amount,
            channel: data.channel,
            paid_at,
            order,
            raw,
        })
    }
}

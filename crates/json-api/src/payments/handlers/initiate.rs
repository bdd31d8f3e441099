//! Initiate Payment Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_app::{
    domain::orders::records::Buyer,
    payments::data::{InitiatePayment, Initiation},
};

use crate::{
    extensions::*, observability::record_payment_initiated, orders::get::OrderResponse,
    payments::errors::into_status_error, state::State,
};

/// Initiate Payment Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitiatePaymentRequest {
    pub first_name: String,

    pub last_name: String,

    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub organization: Option<String>,

    pub solution_id: Uuid,

    #[serde(default)]
    pub voucher_code: Option<String>,

    /// Where the gateway sends the buyer after paying
    pub callback_url: String,
}

impl From<InitiatePaymentRequest> for InitiatePayment {
    fn from(request: InitiatePaymentRequest) -> Self {
        InitiatePayment {
            buyer: Buyer {
                first_name: request.first_name,
                last_name: request.last_name,
                email: request.email,
                phone: request.phone,
                organization: request.organization,
            },
            solution: request.solution_id.into(),
            voucher_code: request.voucher_code,
            callback_url: request.callback_url,
        }
    }
}

/// Either a gateway redirect or, when nothing is owed, the finished registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitiatePaymentResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<OrderResponse>,
}

/// Initiate Payment Handler
#[endpoint(
    tags("payments"),
    summary = "Initiate Payment",
    responses(
        (status_code = StatusCode::OK, description = "Continue at the gateway"),
        (status_code = StatusCode::CREATED, description = "Free registration completed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Missing buyer details"),
        (status_code = StatusCode::NOT_FOUND, description = "Solution not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Voucher cannot be applied"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Payment gateway unavailable"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<InitiatePaymentRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<InitiatePaymentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let initiation = state
        .app
        .payments
        .initiate(json.into_inner().into(), Timestamp::now())
        .await
        .map_err(into_status_error)?;

    match initiation {
        Initiation::Redirect {
            order,
            authorization_url,
            reference,
        } => {
            record_payment_initiated("redirect");

            Ok(Json(InitiatePaymentResponse {
                authorization_url: Some(authorization_url),
                reference: Some(reference),
                order_id: Some(order.into()),
                registration: None,
            }))
        }
        Initiation::Completed { order, .. } => {
            record_payment_initiated("free");

            res.status_code(StatusCode::CREATED);

            Ok(Json(InitiatePaymentResponse {
                authorization_url: None,
                reference: None,
                order_id: Some(order.uuid.into()),
                registration: Some((*order).into()),
            }))
        }
    }
}

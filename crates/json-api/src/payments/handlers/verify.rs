//! Verify Payment Handler

use std::sync::Arc;

use jiff::Timestamp;
use rust_decimal::Decimal;
use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use agora_app::{domain::orders::records::OrderRecord, payments::data::Verification};

use crate::{
    extensions::*, observability::record_payment_verified, payments::errors::into_status_error,
    state::State,
};

const COMPLETED: &str = "completed";
const ALREADY_PROCESSED: &str = "already_processed";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyPaymentResponse {
    /// `completed` for this call, `already_processed` for a repeat
    pub status: String,

    pub reference: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[salvo(schema(value_type = Option<String>))]
    pub amount: Option<Decimal>,

    /// Title of the purchased solution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_solution: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
}

impl VerifyPaymentResponse {
    fn from_order(status: &str, reference: String, order: Option<OrderRecord>) -> Self {
        let Some(order) = order else {
            return Self {
                status: status.to_string(),
                reference,
                order_id: None,
                amount: None,
                selected_solution: None,
                email: None,
                payment_date: None,
            };
        };

        Self {
            status: status.to_string(),
            reference,
            order_id: Some(order.uuid.into()),
            amount: Some(order.final_amount),
            selected_solution: None,
            email: Some(order.buyer.email),
            payment_date: order.paid_at.map(|paid_at| paid_at.to_string()),
        }
    }
}

/// Verify Payment Handler
///
/// Confirms a gateway transaction. Repeating the call for the same reference
/// is harmless.
#[endpoint(
    tags("payments"),
    summary = "Verify Payment",
    responses(
        (status_code = StatusCode::OK, description = "Payment confirmed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Missing reference"),
        (status_code = StatusCode::PAYMENT_REQUIRED, description = "Gateway reports the payment did not succeed"),
        (status_code = StatusCode::NOT_FOUND, description = "No order matches this reference"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Payment gateway unavailable"),
    ),
)]
pub(crate) async fn handler(
    reference: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<VerifyPaymentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let Some(reference) = reference
        .into_inner()
        .map(|reference| reference.trim().to_string())
        .filter(|reference| !reference.is_empty())
    else {
        return Err(StatusError::bad_request().brief("missing required field: reference"));
    };

    let verification = match state.app.payments.verify(&reference, Timestamp::now()).await {
        Ok(verification) => verification,
        Err(error) => {
            record_payment_verified("error");

            return Err(into_status_error(error));
        }
    };

    match verification {
        Verification::Completed(payment) => {
            record_payment_verified(COMPLETED);

            let payment = *payment;
            let mut response =
                VerifyPaymentResponse::from_order(COMPLETED, reference, Some(payment.order));

            response.selected_solution = Some(payment.solution_title);
            response.payment_date = Some(payment.paid_at.to_string());

            Ok(Json(response))
        }
        Verification::AlreadyProcessed { order } => {
            record_payment_verified(ALREADY_PROCESSED);

            let order = order.map(|order| *order);
            let solution = order.as_ref().map(|order| order.solution);
            let mut response =
                VerifyPaymentResponse::from_order(ALREADY_PROCESSED, reference, order);

            if let Some(solution) = solution {
                match state.app.solutions.get_solution(solution).await {
                    Ok(solution) => response.selected_solution = Some(solution.title),
                    Err(error) => warn!(%error, "could not resolve solution for processed payment"),
                }
            }

            Ok(Json(response))
        }
        Verification::Failed { status, .. } => {
            record_payment_verified("failed");

            Err(StatusError::payment_required().brief(format!("payment {status}")))
        }
    }
}

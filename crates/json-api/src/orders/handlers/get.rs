//! Get Order Handler

use std::{string::ToString, sync::Arc};

use rust_decimal::Decimal;
use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_app::domain::orders::records::OrderRecord;

use crate::{extensions::*, orders::errors::into_status_error, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderResponse {
    pub id: Uuid,

    pub first_name: String,

    pub last_name: String,

    pub email: String,

    pub phone: Option<String>,

    pub organization: Option<String>,

    pub solution_id: Uuid,

    /// Solution price at checkout
    #[salvo(schema(value_type = String))]
    pub base_amount: Decimal,

    /// Amount charged after any voucher
    #[salvo(schema(value_type = String))]
    pub final_amount: Decimal,

    pub voucher_code: Option<String>,

    /// `pending`, `completed` or `failed`
    pub payment_status: String,

    pub payment_reference: Option<String>,

    pub payment_method: Option<String>,

    pub paid_at: Option<String>,

    pub created_at: String,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        OrderResponse {
            id: order.uuid.into(),
            first_name: order.buyer.first_name,
            last_name: order.buyer.last_name,
            email: order.buyer.email,
            phone: order.buyer.phone,
            organization: order.buyer.organization,
            solution_id: order.solution.into(),
            base_amount: order.base_amount,
            final_amount: order.final_amount,
            voucher_code: order.voucher_code,
            payment_status: order.payment_status.to_string(),
            payment_reference: order.payment_reference,
            payment_method: order.payment_method,
            paid_at: order.paid_at.as_ref().map(ToString::to_string),
            created_at: order.created_at.to_string(),
        }
    }
}

/// Get Order Handler
#[endpoint(
    tags("orders"),
    summary = "Get Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order found"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    depot.admin_or_403()?;

    let state = depot.obtain_or_500::<Arc<State>>()?;

    let order = state
        .app
        .orders
        .get_order(order.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(order.into()))
}

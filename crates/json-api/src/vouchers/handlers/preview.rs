//! Voucher Preview Handler

use std::sync::Arc;

use jiff::Timestamp;
use rust_decimal::Decimal;
use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_app::payments::data::{PreviewRequest, Pricing};

use crate::{extensions::*, payments::errors::into_status_error, state::State};

/// Voucher Preview Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoucherPreviewRequest {
    #[serde(default)]
    pub voucher_code: Option<String>,

    pub solution_id: Uuid,

    pub email: String,
}

impl From<VoucherPreviewRequest> for PreviewRequest {
    fn from(request: VoucherPreviewRequest) -> Self {
        PreviewRequest {
            email: request.email,
            solution: request.solution_id.into(),
            voucher_code: request.voucher_code,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoucherPreviewResponse {
    #[salvo(schema(value_type = String))]
    pub original_amount: Decimal,

    /// What the buyer would pay right now
    #[salvo(schema(value_type = String))]
    pub discounted_amount: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,
}

impl From<Pricing> for VoucherPreviewResponse {
    fn from(pricing: Pricing) -> Self {
        VoucherPreviewResponse {
            original_amount: pricing.original_amount,
            discounted_amount: pricing.final_amount,
            voucher_code: pricing.voucher.map(|voucher| voucher.code),
        }
    }
}

/// Voucher Preview Handler
///
/// Prices a solution for a buyer exactly as checkout would, without
/// creating anything.
#[endpoint(
    tags("vouchers"),
    summary = "Preview Voucher",
    responses(
        (status_code = StatusCode::OK, description = "Price computed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Missing email or solution"),
        (status_code = StatusCode::NOT_FOUND, description = "Solution not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Voucher cannot be applied"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<VoucherPreviewRequest>,
    depot: &mut Depot,
) -> Result<Json<VoucherPreviewResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let pricing = state
        .app
        .payments
        .preview(json.into_inner().into(), Timestamp::now())
        .await
        .map_err(into_status_error)?;

    Ok(Json(pricing.into()))
}

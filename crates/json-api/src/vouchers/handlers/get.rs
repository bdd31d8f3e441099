//! Get Voucher Handler

use std::sync::Arc;

use rust_decimal::Decimal;
use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_app::domain::vouchers::records::VoucherRecord;

use crate::{extensions::*, state::State, vouchers::errors::into_status_error};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoucherResponse {
    pub id: Uuid,

    /// Upper-cased voucher code
    pub code: String,

    /// `percentage` or `fixed`
    pub discount_type: String,

    #[salvo(schema(value_type = String))]
    pub discount_value: Decimal,

    pub expires_at: String,

    /// Zero means unlimited
    pub usage_limit: u32,

    pub usage_count: u32,

    pub once_per_user: bool,

    pub applicable_solutions: Vec<Uuid>,

    pub applicable_emails: Vec<String>,

    #[salvo(schema(value_type = String))]
    pub min_cart_amount: Decimal,

    pub new_users_only: bool,

    pub created_at: String,
}

impl From<VoucherRecord> for VoucherResponse {
    fn from(voucher: VoucherRecord) -> Self {
        VoucherResponse {
            id: voucher.uuid.into(),
            code: voucher.code,
            discount_type: voucher.discount.type_as_str().to_string(),
            discount_value: voucher.discount.value(),
            expires_at: voucher.expires_at.to_string(),
            usage_limit: voucher.usage_limit,
            usage_count: voucher.usage_count,
            once_per_user: voucher.once_per_user,
            applicable_solutions: voucher
                .applicable_solutions
                .into_iter()
                .map(Into::into)
                .collect(),
            applicable_emails: voucher.applicable_emails,
            min_cart_amount: voucher.min_cart_amount,
            new_users_only: voucher.new_users_only,
            created_at: voucher.created_at.to_string(),
        }
    }
}

/// Get Voucher Handler
///
/// Looks a voucher up by code, ignoring case.
#[endpoint(
    tags("vouchers"),
    summary = "Get Voucher",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Voucher found"),
        (status_code = StatusCode::NOT_FOUND, description = "Voucher not found"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
    ),
)]
pub(crate) async fn handler(
    code: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<VoucherResponse>, StatusError> {
    depot.admin_or_403()?;

    let state = depot.obtain_or_500::<Arc<State>>()?;

    let voucher = state
        .app
        .vouchers
        .get_voucher(&code.into_inner())
        .await
        .map_err(into_status_error)?;

    Ok(Json(voucher.into()))
}

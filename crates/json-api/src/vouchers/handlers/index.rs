//! Voucher Index Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, state::State, vouchers::get::VoucherResponse};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct VouchersResponse {
    pub vouchers: Vec<VoucherResponse>,
}

/// Voucher Index Handler
#[endpoint(
    tags("vouchers"),
    summary = "List Vouchers",
    security(("bearer_auth" = []))
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<VouchersResponse>, StatusError> {
    depot.admin_or_403()?;

    let state = depot.obtain_or_500::<Arc<State>>()?;

    let vouchers = state
        .app
        .vouchers
        .list_vouchers()
        .await
        .or_500("failed to fetch vouchers")?;

    Ok(Json(VouchersResponse {
        vouchers: vouchers.into_iter().map(Into::into).collect(),
    }))
}

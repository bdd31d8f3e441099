//! Create Voucher Handler

use std::sync::Arc;

use jiff::Timestamp;
use rust_decimal::Decimal;
use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_app::domain::vouchers::{
    data::NewVoucher,
    records::{Discount, VoucherUuid},
};

use crate::{
    extensions::*,
    state::State,
    vouchers::{errors::into_status_error, get::VoucherResponse},
};

/// Create Voucher Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateVoucherRequest {
    pub code: String,

    /// `percentage` or `fixed`
    pub discount_type: String,

    #[salvo(schema(value_type = String))]
    pub discount_value: Decimal,

    /// RFC 3339 timestamp
    pub expires_at: String,

    #[serde(default)]
    pub usage_limit: u32,

    #[serde(default)]
    pub once_per_user: bool,

    #[serde(default)]
    pub applicable_solutions: Vec<Uuid>,

    #[serde(default)]
    pub applicable_emails: Vec<String>,

    #[serde(default)]
    #[salvo(schema(value_type = String))]
    pub min_cart_amount: Decimal,

    #[serde(default)]
    pub new_users_only: bool,
}

impl CreateVoucherRequest {
    fn into_new_voucher(self) -> Result<NewVoucher, StatusError> {
        let discount = Discount::from_parts(&self.discount_type, self.discount_value)
            .ok_or_else(|| {
                StatusError::bad_request().brief("discountType must be percentage or fixed")
            })?;

        let expires_at = self
            .expires_at
            .parse::<Timestamp>()
            .or_400("invalid expiresAt")?;

        Ok(NewVoucher {
            uuid: VoucherUuid::new(),
            code: self.code,
            discount,
            expires_at,
            usage_limit: self.usage_limit,
            once_per_user: self.once_per_user,
            applicable_solutions: self
                .applicable_solutions
                .into_iter()
                .map(Into::into)
                .collect(),
            applicable_emails: self.applicable_emails,
            min_cart_amount: self.min_cart_amount,
            new_users_only: self.new_users_only,
        })
    }
}

/// Create Voucher Handler
#[endpoint(
    tags("vouchers"),
    summary = "Create Voucher",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Voucher created"),
        (status_code = StatusCode::CONFLICT, description = "Voucher code already exists"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateVoucherRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<VoucherResponse>, StatusError> {
    depot.admin_or_403()?;

    let state = depot.obtain_or_500::<Arc<State>>()?;
    let voucher = json.into_inner().into_new_voucher()?;

    let voucher = state
        .app
        .vouchers
        .create_voucher(voucher)
        .await
        .map_err(into_status_error)?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(voucher.into()))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use agora_app::domain::vouchers::VouchersServiceError;

    use crate::test_helpers::{Mocks, admin_service};

    use super::{super::tests::make_voucher, *};

    fn make_service(mocks: Mocks) -> Service {
        admin_service(mocks, Router::with_path("vouchers").post(handler))
    }

    fn payload() -> Value {
        json!({
            "code": "save10",
            "discountType": "percentage",
            "discountValue": "10",
            "expiresAt": "2030-01-01T00:00:00Z",
            "usageLimit": 5,
            "applicableEmails": ["Buyer@Example.com"]
        })
    }

    #[tokio::test]
    async fn test_create_voucher_success() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .vouchers
            .expect_create_voucher()
            .once()
            .withf(|new| {
                new.code == "save10"
                    && new.discount == Discount::Percentage(dec!(10))
                    && new.usage_limit == 5
                    && new.applicable_emails == vec!["Buyer@Example.com".to_string()]
            })
            .return_once(|_| Ok(make_voucher("SAVE10", Discount::Percentage(dec!(10)))));

        let mut res = TestClient::post("http://example.com/vouchers")
            .json(&payload())
            .send(&make_service(mocks))
            .await;

        let body: VoucherResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(body.code, "SAVE10");

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_discount_type_returns_400() -> TestResult {
        let mut body = payload();
        body["discountType"] = json!("bogof");

        let res = TestClient::post("http://example.com/vouchers")
            .json(&body)
            .send(&make_service(Mocks::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_unparseable_expiry_returns_400() -> TestResult {
        let mut body = payload();
        body["expiresAt"] = json!("next tuesday");

        let res = TestClient::post("http://example.com/vouchers")
            .json(&body)
            .send(&make_service(Mocks::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_percentage_over_100_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .vouchers
            .expect_create_voucher()
            .once()
            .return_once(|_| Err(VouchersServiceError::InvalidDiscount));

        let mut body = payload();
        body["discountValue"] = json!("150");

        let res = TestClient::post("http://example.com/vouchers")
            .json(&body)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_code_returns_409() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .vouchers
            .expect_create_voucher()
            .once()
            .return_once(|_| Err(VouchersServiceError::AlreadyExists));

        let res = TestClient::post("http://example.com/vouchers")
            .json(&payload())
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}

//! Create Solution Handler

use std::sync::Arc;

use rust_decimal::Decimal;
use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use agora_app::domain::solutions::{data::NewSolution, records::SolutionUuid};

use crate::{
    extensions::*,
    solutions::{errors::into_status_error, get::SolutionResponse},
    state::State,
};

/// Create Solution Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSolutionRequest {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Price in naira; zero makes the solution free
    #[salvo(schema(value_type = String))]
    pub price: Decimal,
}

impl From<CreateSolutionRequest> for NewSolution {
    fn from(request: CreateSolutionRequest) -> Self {
        NewSolution {
            uuid: SolutionUuid::new(),
            title: request.title.trim().to_string(),
            description: request.description,
            price: request.price,
        }
    }
}

/// Create Solution Handler
#[endpoint(
    tags("solutions"),
    summary = "Create Solution",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Solution created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateSolutionRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<SolutionResponse>, StatusError> {
    depot.admin_or_403()?;

    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    if request.title.trim().is_empty() || request.price.is_sign_negative() {
        return Err(StatusError::bad_request().brief("Invalid solution payload"));
    }

    let solution = state
        .app
        .solutions
        .create_solution(request.into())
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/solutions/{}", solution.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(solution.into()))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, admin_service, user_service};

    use super::{super::tests::make_solution, *};

    #[tokio::test]
    async fn test_create_solution_success() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .solutions
            .expect_create_solution()
            .once()
            .withf(|new| new.title == "Growth Workshop" && new.price == dec!(15000))
            .return_once(|new| Ok(make_solution(new.uuid, new.price)));

        let mut res = TestClient::post("http://example.com/solutions")
            .json(&json!({ "title": " Growth Workshop ", "price": "15000" }))
            .send(&admin_service(mocks, Router::with_path("solutions").post(handler)))
            .await;

        let body: SolutionResponse = res.take_json().await?;
        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(location, Some(format!("/solutions/{}", body.id).as_str()));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_negative_price_returns_400() -> TestResult {
        let res = TestClient::post("http://example.com/solutions")
            .json(&json!({ "title": "Workshop", "price": "-1" }))
            .send(&admin_service(
                Mocks::default(),
                Router::with_path("solutions").post(handler),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_as_user_returns_403() -> TestResult {
        let res = TestClient::post("http://example.com/solutions")
            .json(&json!({ "title": "Workshop", "price": "100" }))
            .send(&user_service(
                Mocks::default(),
                Router::with_path("solutions").post(handler),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}

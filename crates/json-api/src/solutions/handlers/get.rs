//! Get Solution Handler

use std::sync::Arc;

use rust_decimal::Decimal;
use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_app::domain::solutions::records::SolutionRecord;

use crate::{extensions::*, solutions::errors::into_status_error, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SolutionResponse {
    /// The unique identifier of the solution
    pub id: Uuid,

    pub title: String,

    pub description: Option<String>,

    /// Price in naira
    #[salvo(schema(value_type = String))]
    pub price: Decimal,

    /// The date and time the solution was created
    pub created_at: String,
}

impl From<SolutionRecord> for SolutionResponse {
    fn from(solution: SolutionRecord) -> Self {
        SolutionResponse {
            id: solution.uuid.into(),
            title: solution.title,
            description: solution.description,
            price: solution.price,
            created_at: solution.created_at.to_string(),
        }
    }
}

/// Get Solution Handler
#[endpoint(
    tags("solutions"),
    summary = "Get Solution",
    responses(
        (status_code = StatusCode::OK, description = "Solution found"),
        (status_code = StatusCode::NOT_FOUND, description = "Solution not found"),
    ),
)]
pub(crate) async fn handler(
    solution: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<SolutionResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let solution = state
        .app
        .solutions
        .get_solution(solution.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(solution.into()))
}

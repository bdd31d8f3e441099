//! Solution Index Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, solutions::get::SolutionResponse, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SolutionsResponse {
    /// Live solutions, newest first
    pub solutions: Vec<SolutionResponse>,
}

/// Solution Index Handler
///
/// Returns every solution that has not been deleted.
#[endpoint(tags("solutions"), summary = "List Solutions")]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<SolutionsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let solutions = state
        .app
        .solutions
        .list_solutions()
        .await
        .or_500("failed to fetch solutions")?;

    Ok(Json(SolutionsResponse {
        solutions: solutions.into_iter().map(Into::into).collect(),
    }))
}

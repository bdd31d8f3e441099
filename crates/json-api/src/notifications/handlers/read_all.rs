//! Mark All Notifications Read Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MarkAllReadResponse {
    /// How many notifications changed
    pub updated: u64,
}

/// Mark All Notifications Read Handler
#[endpoint(
    tags("notifications"),
    summary = "Mark All Notifications Read",
    security(("bearer_auth" = []))
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<MarkAllReadResponse>, StatusError> {
    let recipient = depot.principal_or_401()?.recipient();
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let updated = state
        .app
        .notifications
        .mark_all_read(recipient)
        .await
        .or_500("failed to mark notifications read")?;

    Ok(Json(MarkAllReadResponse { updated }))
}

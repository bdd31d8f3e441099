//! Set Notification Read Flag Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    extensions::*,
    notifications::{errors::into_status_error, index::NotificationResponse},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetReadRequest {
    pub is_read: bool,
}

/// Set Notification Read Flag Handler
#[endpoint(
    tags("notifications"),
    summary = "Mark Notification Read or Unread",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Read flag updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Notification not found"),
    ),
)]
pub(crate) async fn handler(
    notification: PathParam<Uuid>,
    json: JsonBody<SetReadRequest>,
    depot: &mut Depot,
) -> Result<Json<NotificationResponse>, StatusError> {
    let recipient = depot.principal_or_401()?.recipient();
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let notification = state
        .app
        .notifications
        .set_read(
            notification.into_inner().into(),
            recipient,
            json.into_inner().is_read,
        )
        .await
        .map_err(into_status_error)?;

    Ok(Json(notification.into()))
}

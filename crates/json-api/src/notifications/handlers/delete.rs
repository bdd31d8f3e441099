//! Delete Notification Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{extensions::*, notifications::errors::into_status_error, state::State};

/// Delete Notification Handler
#[endpoint(
    tags("notifications"),
    summary = "Delete Notification",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Notification deleted"),
        (status_code = StatusCode::NOT_FOUND, description = "Notification not found"),
    ),
)]
pub(crate) async fn handler(
    notification: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let recipient = depot.principal_or_401()?.recipient();
    let state = depot.obtain_or_500::<Arc<State>>()?;

    state
        .app
        .notifications
        .delete_notification(notification.into_inner().into(), recipient)
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::NO_CONTENT)
}

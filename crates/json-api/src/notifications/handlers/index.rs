//! Notification Index Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use agora_app::domain::notifications::records::NotificationRecord;

use crate::{extensions::*, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotificationResponse {
    pub id: Uuid,

    pub title: String,

    pub message: String,

    /// `success`, `error`, `info` or `warning`
    #[serde(rename = "type")]
    pub kind: String,

    pub is_read: bool,

    /// Free-form context such as the order id or payment reference
    #[salvo(schema(value_type = Object))]
    pub related_data: Value,

    pub created_at: String,
}

impl From<NotificationRecord> for NotificationResponse {
    fn from(notification: NotificationRecord) -> Self {
        NotificationResponse {
            id: notification.uuid.into(),
            title: notification.title,
            message: notification.message,
            kind: notification.kind.as_str().to_string(),
            is_read: notification.is_read,
            related_data: notification.related_data,
            created_at: notification.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotificationsResponse {
    /// Newest first
    pub notifications: Vec<NotificationResponse>,

    pub unread: usize,
}

/// Notification Index Handler
#[endpoint(
    tags("notifications"),
    summary = "List Notifications",
    security(("bearer_auth" = []))
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<NotificationsResponse>, StatusError> {
    let recipient = depot.principal_or_401()?.recipient();
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let notifications = state
        .app
        .notifications
        .list_for(recipient)
        .await
        .or_500("failed to fetch notifications")?;

    let unread = notifications.iter().filter(|n| !n.is_read).count();

    Ok(Json(NotificationsResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
        unread,
    }))
}

//! Notifications Data

use serde_json::Value;

use crate::domain::notifications::records::{NotificationKind, NotificationUuid, Recipient};

/// New Notification Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub uuid: NotificationUuid,
    pub recipients: Vec<Recipient>,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub related_data: Value,
}

impl NewNotification {
    #[must_use]
    pub fn new(
        recipients: Vec<Recipient>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        related_data: Value,
    ) -> Self {
        Self {
            uuid: NotificationUuid::new(),
            recipients,
            title: title.into(),
            message: message.into(),
            kind,
            related_data,
        }
    }
}

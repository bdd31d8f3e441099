//! Notification Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde_json::Value;
use thiserror::Error;

use crate::{
    domain::users::records::UserUuid,
    uuids::TypedUuid,
};

/// Notification UUID
pub type NotificationUuid = TypedUuid<NotificationRecord>;

const ADMIN_RECIPIENT: &str = "admin";

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipient {
    /// The shared administrators' channel.
    Admin,

    User(UserUuid),
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str(ADMIN_RECIPIENT),
            Self::User(user) => fmt::Display::fmt(user, f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid notification recipient: {0}")]
pub struct InvalidRecipient(pub String);

impl FromStr for Recipient {
    type Err = InvalidRecipient;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == ADMIN_RECIPIENT {
            return Ok(Self::Admin);
        }

        value
            .parse::<UserUuid>()
            .map(Self::User)
            .map_err(|_ignored| InvalidRecipient(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown notification kind: {0}")]
pub struct UnknownNotificationKind(pub String);

impl FromStr for NotificationKind {
    type Err = UnknownNotificationKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            other => Err(UnknownNotificationKind(other.to_string())),
        }
    }
}

/// Notification Record
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    pub uuid: NotificationUuid,
    pub recipients: Vec<Recipient>,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub related_data: Value,
    pub created_at: Timestamp,
}

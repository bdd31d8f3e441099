//! Auth data models.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{notifications::records::Recipient, users::records::UserUuid};

const ADMIN_PRINCIPAL: &str = "admin";

/// Identity a bearer token resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Principal {
    Admin,
    User(UserUuid),
}

impl Principal {
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// The notification channel this principal reads from.
    #[must_use]
    pub const fn recipient(self) -> Recipient {
        match self {
            Self::Admin => Recipient::Admin,
            Self::User(user) => Recipient::User(user),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str(ADMIN_PRINCIPAL),
            Self::User(user) => fmt::Display::fmt(user, f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid principal: {0}")]
pub struct InvalidPrincipal(pub String);

impl FromStr for Principal {
    type Err = InvalidPrincipal;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == ADMIN_PRINCIPAL {
            return Ok(Self::Admin);
        }

        value
            .parse::<UserUuid>()
            .map(Self::User)
            .map_err(|_ignored| InvalidPrincipal(value.to_string()))
    }
}

/// API token metadata persisted in storage.
#[derive(Debug, Clone)]
pub struct ApiTokenMetadata {
    pub uuid: Uuid,
    pub principal: Principal,
    pub created_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
}

/// New API token persistence payload.
#[derive(Debug, Clone)]
pub struct NewApiToken {
    pub uuid: Uuid,
    pub principal: Principal,
    pub token_hash: String,
}

/// API token issuance result with one-time raw token.
#[derive(Debug, Clone)]
pub struct IssuedApiToken {
    pub token: String,
    pub metadata: ApiTokenMetadata,
}

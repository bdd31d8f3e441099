//! Users service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::users::{
        data::{NewUser, normalize_email},
        errors::UsersServiceError,
        records::UserRecord,
        repository::PgUsersRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgUsersService {
    db: Db,
    repository: PgUsersRepository,
}

impl PgUsersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgUsersRepository::new(),
        }
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UsersServiceError> {
        let mut tx = self.db.begin().await?;

        let user = self
            .repository
            .find_by_email(&mut tx, &normalize_email(email))
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    #[tracing::instrument(name = "users.service.ensure_user", skip(self, user), err)]
    async fn ensure_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError> {
        let email = normalize_email(&user.email);

        if email.is_empty() {
            return Err(UsersServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin().await?;

        let user = self
            .repository
            .ensure_user(&mut tx, NewUser { email, ..user })
            .await?;

        tx.commit().await?;

        Ok(user)
    }
}

#[automock]
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Look up a user by (case-insensitive) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UsersServiceError>;

    /// Return the user with this email, creating it when absent.
    async fn ensure_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError>;
}

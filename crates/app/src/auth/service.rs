//! Auth service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{
    ApiTokenMetadata, AuthServiceError, IssuedApiToken, NewApiToken, Principal, format_api_token,
    generate_api_token_secret, hash_api_token, parse_api_token, repository::PgAuthRepository,
};

#[derive(Debug, Clone)]
pub struct PgAuthService {
    repository: PgAuthRepository,
}

impl PgAuthService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PgAuthRepository::new(pool),
        }
    }

    /// Issue a new API token for `principal`.
    ///
    /// The raw token is only returned here; storage keeps its digest.
    pub async fn issue_api_token(
        &self,
        principal: Principal,
    ) -> Result<IssuedApiToken, AuthServiceError> {
        let token_uuid = Uuid::now_v7();
        let secret = generate_api_token_secret();
        let token = format_api_token(token_uuid, &secret);

        let metadata = self
            .repository
            .create_api_token(NewApiToken {
                uuid: token_uuid,
                principal,
                token_hash: hash_api_token(&token),
            })
            .await?;

        info!(token_uuid = %metadata.uuid, %principal, "issued api token");

        Ok(IssuedApiToken { token, metadata })
    }

    /// List all tokens, newest first.
    pub async fn list_api_tokens(&self) -> Result<Vec<ApiTokenMetadata>, AuthServiceError> {
        Ok(self.repository.list_api_tokens().await?)
    }

    /// Revoke a token by UUID. Returns `true` if the token was active.
    pub async fn revoke_api_token(&self, token_uuid: Uuid) -> Result<bool, AuthServiceError> {
        let revoked = self.repository.revoke_api_token(token_uuid).await?;

        Ok(revoked.is_some())
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Principal, AuthServiceError> {
        let parsed = parse_api_token(bearer_token).map_err(|_ignored| AuthServiceError::NotFound)?;

        let token = self
            .repository
            .find_active_api_token(&hash_api_token(bearer_token))
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        if token.uuid != parsed.token_uuid {
            return Err(AuthServiceError::NotFound);
        }

        if let Err(error) = self.repository.touch_api_token_last_used(token.uuid).await {
            debug!(%error, "failed to record api token use");
        }

        Ok(token.principal)
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a raw bearer token to the principal it was issued for.
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Principal, AuthServiceError>;
}

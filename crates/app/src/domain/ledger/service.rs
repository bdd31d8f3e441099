//! Ledger service.

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use tracing::{debug, info};

use crate::{
    database::Db,
    domain::ledger::{errors::LedgerServiceError, repository::PgLedgerRepository},
};

/// How long a processed reference blocks reprocessing by default.
pub const DEFAULT_LEDGER_TTL: SignedDuration = SignedDuration::from_mins(30);

#[derive(Debug, Clone)]
pub struct PgLedgerService {
    db: Db,
    repository: PgLedgerRepository,
}

impl PgLedgerService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgLedgerRepository::new(),
        }
    }
}

#[async_trait]
impl LedgerService for PgLedgerService {
    async fn is_processed(
        &self,
        reference: &str,
        now: Timestamp,
    ) -> Result<bool, LedgerServiceError> {
        let mut tx = self.db.begin().await?;

        let processed = self.repository.is_processed(&mut tx, reference, now).await?;

        tx.commit().await?;

        Ok(processed)
    }

    #[tracing::instrument(name = "ledger.service.claim", skip(self), err)]
    async fn claim(
        &self,
        reference: &str,
        now: Timestamp,
        ttl: SignedDuration,
    ) -> Result<bool, LedgerServiceError> {
        if reference.is_empty() {
            return Err(LedgerServiceError::MissingRequiredData);
        }

        let expires_at = now.checked_add(ttl).unwrap_or(Timestamp::MAX);

        let mut tx = self.db.begin().await?;

        let claimed = self
            .repository
            .claim(&mut tx, reference, now, expires_at)
            .await?;

        tx.commit().await?;

        debug!(claimed, "ledger claim");

        Ok(claimed)
    }

    #[tracing::instrument(name = "ledger.service.release", skip(self), err)]
    async fn release(&self, reference: &str) -> Result<(), LedgerServiceError> {
        let mut tx = self.db.begin().await?;

        self.repository.release(&mut tx, reference).await?;

        tx.commit().await?;

        Ok(())
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64, LedgerServiceError> {
        let mut tx = self.db.begin().await?;

        let purged = self.repository.purge_expired(&mut tx, now).await?;

        tx.commit().await?;

        if purged > 0 {
            info!(purged, "purged expired ledger entries");
        }

        Ok(purged)
    }
}

#[automock]
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Whether a live entry exists for `reference` at `now`.
    async fn is_processed(&self, reference: &str, now: Timestamp)
    -> Result<bool, LedgerServiceError>;

    /// Atomically record `reference` as processed until `now + ttl`.
    ///
    /// Returns `false` when another caller already holds a live entry.
    async fn claim(
        &self,
        reference: &str,
        now: Timestamp,
        ttl: SignedDuration,
    ) -> Result<bool, LedgerServiceError>;

    /// Drop the entry for `reference` so it may be processed again.
    async fn release(&self, reference: &str) -> Result<(), LedgerServiceError>;

    /// Delete entries that expired at or before `now`, returning how many were removed.
    async fn purge_expired(&self, now: Timestamp) -> Result<u64, LedgerServiceError>;
}

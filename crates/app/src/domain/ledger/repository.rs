//! Ledger Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{Postgres, Transaction, query, query_scalar};

const IS_PROCESSED_SQL: &str = include_str!("sql/is_processed.sql");
const CLAIM_REFERENCE_SQL: &str = include_str!("sql/claim_reference.sql");
const RELEASE_REFERENCE_SQL: &str = include_str!("sql/release_reference.sql");
const PURGE_EXPIRED_SQL: &str = include_str!("sql/purge_expired.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgLedgerRepository;

impl PgLedgerRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn is_processed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &str,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(IS_PROCESSED_SQL)
            .bind(reference)
            .bind(SqlxTimestamp::from(now))
            .fetch_one(&mut **tx)
            .await
    }

    /// Insert the reference, or take over an expired entry for it.
    ///
    /// Returns `true` only for the caller whose statement wrote the row.
    pub(crate) async fn claim(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &str,
        processed_at: Timestamp,
        expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let claimed = query_scalar::<Postgres, String>(CLAIM_REFERENCE_SQL)
            .bind(reference)
            .bind(SqlxTimestamp::from(processed_at))
            .bind(SqlxTimestamp::from(expires_at))
            .fetch_optional(&mut **tx)
            .await?;

        Ok(claimed.is_some())
    }

    pub(crate) async fn release(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RELEASE_REFERENCE_SQL)
            .bind(reference)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn purge_expired(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(PURGE_EXPIRED_SQL)
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

//! Vouchers Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};
use uuid::Uuid;

use crate::domain::{
    solutions::records::SolutionUuid,
    vouchers::{
        data::NewVoucher,
        records::{Discount, VoucherRecord, VoucherUuid},
    },
};

const CREATE_VOUCHER_SQL: &str = include_str!("sql/create_voucher.sql");
const LIST_VOUCHERS_SQL: &str = include_str!("sql/list_vouchers.sql");
const FIND_VOUCHER_BY_CODE_SQL: &str = include_str!("sql/find_voucher_by_code.sql");
const REDEEM_VOUCHER_SQL: &str = include_str!("sql/redeem_voucher.sql");
const USER_EXISTS_SQL: &str = include_str!("sql/user_exists.sql");
const HAS_COMPLETED_REDEMPTION_SQL: &str = include_str!("sql/has_completed_redemption.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgVouchersRepository;

impl PgVouchersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_voucher(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        voucher: NewVoucher,
    ) -> Result<VoucherRecord, sqlx::Error> {
        let usage_limit =
            i32::try_from(voucher.usage_limit).map_err(|error| sqlx::Error::Encode(Box::new(error)))?;

        let solutions: Vec<Uuid> = voucher
            .applicable_solutions
            .into_iter()
            .map(SolutionUuid::into_uuid)
            .collect();

        query_as::<Postgres, VoucherRecord>(CREATE_VOUCHER_SQL)
            .bind(voucher.uuid.into_uuid())
            .bind(voucher.code)
            .bind(voucher.discount.type_as_str())
            .bind(voucher.discount.value())
            .bind(SqlxTimestamp::from(voucher.expires_at))
            .bind(usage_limit)
            .bind(voucher.once_per_user)
            .bind(solutions)
            .bind(voucher.applicable_emails)
            .bind(voucher.min_cart_amount)
            .bind(voucher.new_users_only)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_vouchers(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<VoucherRecord>, sqlx::Error> {
        query_as::<Postgres, VoucherRecord>(LIST_VOUCHERS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn find_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<Option<VoucherRecord>, sqlx::Error> {
        query_as::<Postgres, VoucherRecord>(FIND_VOUCHER_BY_CODE_SQL)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Increment usage when the voucher still has redemptions left.
    ///
    /// Returns `None` when the code is unknown or the limit is already reached.
    pub(crate) async fn redeem(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<Option<VoucherRecord>, sqlx::Error> {
        query_as::<Postgres, VoucherRecord>(REDEEM_VOUCHER_SQL)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn user_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(USER_EXISTS_SQL)
            .bind(email)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn has_completed_redemption(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
        code: &str,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(HAS_COMPLETED_REDEMPTION_SQL)
            .bind(email)
            .bind(code)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for VoucherRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let discount_type: String = row.try_get("discount_type")?;
        let discount_value: Decimal = row.try_get("discount_value")?;

        let discount = Discount::from_parts(&discount_type, discount_value).ok_or_else(|| {
            sqlx::Error::ColumnDecode {
                index: "discount_type".to_string(),
                source: format!("unknown discount type {discount_type:?}").into(),
            }
        })?;

        Ok(Self {
            uuid: VoucherUuid::from_uuid(row.try_get("uuid")?),
            code: row.try_get("code")?,
            discount,
            expires_at: row.try_get::<SqlxTimestamp, _>("expires_at")?.to_jiff(),
            usage_limit: decode_count(row, "usage_limit")?,
            usage_count: decode_count(row, "usage_count")?,
            once_per_user: row.try_get("once_per_user")?,
            applicable_solutions: row
                .try_get::<Vec<Uuid>, _>("applicable_solutions")?
                .into_iter()
                .map(SolutionUuid::from_uuid)
                .collect(),
            applicable_emails: row.try_get("applicable_emails")?,
            min_cart_amount: row.try_get("min_cart_amount")?,
            new_users_only: row.try_get("new_users_only")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

fn decode_count(row: &PgRow, column: &str) -> sqlx::Result<u32> {
    let value: i32 = row.try_get(column)?;

    u32::try_from(value).map_err(|error| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(error),
    })
}

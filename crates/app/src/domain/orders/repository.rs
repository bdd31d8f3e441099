//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use serde_json::Value;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::domain::{
    orders::{
        data::{NewOrder, PaymentConfirmation},
        records::{Buyer, OrderRecord, OrderUuid, PaymentStatus},
    },
    solutions::records::SolutionUuid,
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const FIND_ORDER_BY_REFERENCE_SQL: &str = include_str!("sql/find_order_by_reference.sql");
const LIST_ORDERS_SQL: &str = include_str!("sql/list_orders.sql");
const ATTACH_REFERENCE_SQL: &str = include_str!("sql/attach_reference.sql");
const DELETE_PENDING_ORDER_SQL: &str = include_str!("sql/delete_pending_order.sql");
const COMPLETE_ORDER_SQL: &str = include_str!("sql/complete_order.sql");
const MARK_ORDER_FAILED_SQL: &str = include_str!("sql/mark_order_failed.sql");
const REDEEM_ORDER_VOUCHER_SQL: &str = include_str!("sql/redeem_order_voucher.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: NewOrder,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.buyer.first_name)
            .bind(order.buyer.last_name)
            .bind(order.buyer.email)
            .bind(order.buyer.phone)
            .bind(order.buyer.organization)
            .bind(order.solution.into_uuid())
            .bind(order.base_amount)
            .bind(order.final_amount)
            .bind(order.voucher_code)
            .bind(order.payment_status.as_str())
            .bind(order.payment_method)
            .bind(order.paid_at.map(SqlxTimestamp::from))
            .fetch_one(&mut **tx)
            .await
    }

    /// Spend one use of the voucher. `false` when the code is unknown or exhausted.
    pub(crate) async fn redeem_voucher(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<bool, sqlx::Error> {
        let redeemed = query_scalar::<Postgres, Uuid>(REDEEM_ORDER_VOUCHER_SQL)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(redeemed.is_some())
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_by_reference(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &str,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(FIND_ORDER_BY_REFERENCE_SQL)
            .bind(reference)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_ORDERS_SQL)
            .bind(status.map(PaymentStatus::as_str))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn attach_reference(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        reference: &str,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(ATTACH_REFERENCE_SQL)
            .bind(order.into_uuid())
            .bind(reference)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn delete_pending(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_PENDING_ORDER_SQL)
            .bind(order.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Move the order to `completed` unless it already is.
    pub(crate) async fn complete_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        confirmation: PaymentConfirmation,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(COMPLETE_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(confirmation.payment_method)
            .bind(SqlxTimestamp::from(confirmation.paid_at))
            .bind(confirmation.gateway_payload)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn mark_failed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        gateway_payload: Option<Value>,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(MARK_ORDER_FAILED_SQL)
            .bind(order.into_uuid())
            .bind(gateway_payload)
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("payment_status")?;

        let payment_status =
            status
                .parse::<PaymentStatus>()
                .map_err(|error| sqlx::Error::ColumnDecode {
                    index: "payment_status".to_string(),
                    source: Box::new(error),
                })?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            buyer: Buyer {
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                email: row.try_get("email")?,
                phone: row.try_get("phone")?,
                organization: row.try_get("organization")?,
            },
            solution: SolutionUuid::from_uuid(row.try_get("solution_uuid")?),
            base_amount: row.try_get("base_amount")?,
            final_amount: row.try_get("final_amount")?,
            voucher_code: row.try_get("voucher_code")?,
            payment_status,
            payment_reference: row.try_get("payment_reference")?,
            payment_method: row.try_get("payment_method")?,
            paid_at: row
                .try_get::<Option<SqlxTimestamp>, _>("paid_at")?
                .map(SqlxTimestamp::to_jiff),
            gateway_payload: row.try_get("gateway_payload")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

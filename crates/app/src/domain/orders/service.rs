//! Orders service.

use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        orders::{
            data::{NewOrder, PaymentConfirmation},
            errors::OrdersServiceError,
            records::{Buyer, OrderRecord, OrderUuid, PaymentStatus},
            repository::PgOrdersRepository,
        },
        users::data::normalize_email,
        vouchers::data::normalize_code,
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    repository: PgOrdersRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgOrdersRepository::new(),
        }
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(order_uuid = %order.uuid, status = %order.payment_status),
        err
    )]
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        let order = normalize_new_order(order)?;

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_order(&mut tx, order).await?;

        tx.commit().await?;

        info!(
            order_uuid = %created.uuid,
            final_amount = %created.final_amount,
            "created order"
        );

        Ok(created)
    }

    #[tracing::instrument(
        name = "orders.service.create_free_order",
        skip(self, order),
        fields(order_uuid = %order.uuid),
        err
    )]
    async fn create_free_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        let order = normalize_new_order(order)?;

        let mut tx = self.db.begin().await?;

        let redeemed = match order.voucher_code.as_deref() {
            Some(code) => self.repository.redeem_voucher(&mut tx, code).await?,
            None => true,
        };

        // Dropping `tx` on any early return rolls the redemption back
        if !redeemed {
            return Err(OrdersServiceError::VoucherExhausted);
        }

        let created = self.repository.create_order(&mut tx, order).await?;

        tx.commit().await?;

        info!(
            order_uuid = %created.uuid,
            voucher_code = ?created.voucher_code,
            "created free order"
        );

        Ok(created)
    }

    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let order = self.repository.get_order(&mut tx, order).await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let order = self.repository.find_by_reference(&mut tx, reference).await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn list_orders(
        &self,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let orders = self.repository.list_orders(&mut tx, status).await?;

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(name = "orders.service.attach_reference", skip(self), err)]
    async fn attach_reference(
        &self,
        order: OrderUuid,
        reference: &str,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if reference.trim().is_empty() {
            return Err(OrdersServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin().await?;

        let updated = self
            .repository
            .attach_reference(&mut tx, order, reference)
            .await?;

        tx.commit().await?;

        updated.ok_or(OrdersServiceError::NotFound)
    }

    #[tracing::instrument(name = "orders.service.delete_pending", skip(self), err)]
    async fn delete_pending(&self, order: OrderUuid) -> Result<(), OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.repository.delete_pending(&mut tx, order).await?;

        if rows_affected == 0 {
            return Err(OrdersServiceError::NotFound);
        }

        tx.commit().await?;

        info!(%order, "deleted pending order");

        Ok(())
    }

    #[tracing::instrument(
        name = "orders.service.complete_order",
        skip(self, confirmation),
        fields(payment_method = %confirmation.payment_method),
        err
    )]
    async fn complete_order(
        &self,
        order: OrderUuid,
        confirmation: PaymentConfirmation,
    ) -> Result<Option<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let completed = self
            .repository
            .complete_order(&mut tx, order, confirmation)
            .await?;

        tx.commit().await?;

        match &completed {
            Some(order) => info!(order_uuid = %order.uuid, "order completed"),
            None => warn!(%order, "order was already completed"),
        }

        Ok(completed)
    }

    #[tracing::instrument(name = "orders.service.mark_failed", skip(self, gateway_payload), err)]
    async fn mark_failed(
        &self,
        order: OrderUuid,
        gateway_payload: Option<Value>,
    ) -> Result<Option<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let failed = self
            .repository
            .mark_failed(&mut tx, order, gateway_payload)
            .await?;

        tx.commit().await?;

        if failed.is_some() {
            info!(%order, "order marked failed");
        }

        Ok(failed)
    }
}

fn normalize_new_order(order: NewOrder) -> Result<NewOrder, OrdersServiceError> {
    let buyer = Buyer {
        first_name: order.buyer.first_name.trim().to_string(),
        last_name: order.buyer.last_name.trim().to_string(),
        email: normalize_email(&order.buyer.email),
        phone: non_blank(order.buyer.phone),
        organization: non_blank(order.buyer.organization),
    };

    if buyer.first_name.is_empty() || buyer.last_name.is_empty() || buyer.email.is_empty() {
        return Err(OrdersServiceError::MissingRequiredData);
    }

    if order.base_amount.is_sign_negative() || order.final_amount.is_sign_negative() {
        return Err(OrdersServiceError::InvalidData);
    }

    Ok(NewOrder {
        buyer,
        voucher_code: order.voucher_code.as_deref().map(normalize_code),
        ..order
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Persist a new order in its initial state.
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError>;

    /// Persist a completed zero-amount order.
    ///
    /// The order's voucher is redeemed in the same transaction, so either both
    /// are written or neither is.
    async fn create_free_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError>;

    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError>;

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<OrderRecord>, OrdersServiceError>;

    /// Retrieves orders newest first, optionally restricted to one status.
    async fn list_orders(
        &self,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Store the gateway reference on a pending order.
    async fn attach_reference(
        &self,
        order: OrderUuid,
        reference: &str,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Remove an order that never reached the gateway.
    async fn delete_pending(&self, order: OrderUuid) -> Result<(), OrdersServiceError>;

    /// Transition the order to `completed`.
    ///
    /// Returns `None` when it was already completed; the transition happens at most once.
    async fn complete_order(
        &self,
        order: OrderUuid,
        confirmation: PaymentConfirmation,
    ) -> Result<Option<OrderRecord>, OrdersServiceError>;

    /// Mark a still-pending order as failed. Returns `None` for any other state.
    async fn mark_failed(
        &self,
        order: OrderUuid,
        gateway_payload: Option<Value>,
    ) -> Result<Option<OrderRecord>, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        domain::{
            solutions::{SolutionsService, data::NewSolution, records::SolutionUuid},
            vouchers::{
                VouchersService,
                data::NewVoucher,
                records::{Discount, VoucherUuid},
            },
        },
        test::TestContext,
    };

    use super::*;

    fn buyer() -> Buyer {
        Buyer {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            email: "Ada@Example.com".to_string(),
            phone: Some("  ".to_string()),
            organization: Some("Analytical Engines".to_string()),
        }
    }

    fn pending_order(solution: SolutionUuid, amount: Decimal) -> NewOrder {
        NewOrder {
            uuid: OrderUuid::new(),
            buyer: buyer(),
            solution,
            base_amount: amount,
            final_amount: amount,
            voucher_code: Some("save10".to_string()),
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            paid_at: None,
        }
    }

    fn free_order(solution: SolutionUuid, voucher_code: Option<&str>) -> NewOrder {
        NewOrder {
            final_amount: Decimal::ZERO,
            voucher_code: voucher_code.map(str::to_string),
            payment_status: PaymentStatus::Completed,
            payment_method: Some("free".to_string()),
            paid_at: Some(Timestamp::now()),
            ..pending_order(solution, dec!(2500))
        }
    }

    async fn create_single_use_voucher(ctx: &TestContext, code: &str) -> TestResult {
        ctx.vouchers
            .create_voucher(NewVoucher {
                uuid: VoucherUuid::new(),
                code: code.to_string(),
                discount: Discount::Percentage(dec!(100)),
                expires_at: Timestamp::now() + SignedDuration::from_hours(24),
                usage_limit: 1,
                once_per_user: false,
                applicable_solutions: Vec::new(),
                applicable_emails: Vec::new(),
                min_cart_amount: Decimal::ZERO,
                new_users_only: false,
            })
            .await?;

        Ok(())
    }

    fn confirmation() -> PaymentConfirmation {
        PaymentConfirmation {
            payment_method: "card".to_string(),
            paid_at: Timestamp::now(),
            gateway_payload: json!({ "status": "success" }),
        }
    }

    #[test]
    fn normalize_new_order_cleans_buyer_fields() -> TestResult {
        let order = normalize_new_order(pending_order(SolutionUuid::new(), dec!(10)))?;

        assert_eq!(order.buyer.first_name, "Ada");
        assert_eq!(order.buyer.email, "ada@example.com");
        assert_eq!(order.buyer.phone, None);
        assert_eq!(order.voucher_code.as_deref(), Some("SAVE10"));

        Ok(())
    }

    #[test]
    fn normalize_new_order_requires_names() {
        let mut order = pending_order(SolutionUuid::new(), dec!(10));
        order.buyer.last_name = String::new();

        assert!(matches!(
            normalize_new_order(order),
            Err(OrdersServiceError::MissingRequiredData)
        ));
    }

    async fn create_solution(ctx: &TestContext) -> TestResult<SolutionUuid> {
        let solution = ctx
            .solutions
            .create_solution(NewSolution {
                uuid: SolutionUuid::new(),
                title: "Board Advisory".to_string(),
                description: None,
                price: dec!(2500),
            })
            .await?;

        Ok(solution.uuid)
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn complete_order_transitions_exactly_once() -> TestResult {
        let ctx = TestContext::new().await;
        let solution = create_solution(&ctx).await?;

        let order = ctx
            .orders
            .create_order(pending_order(solution, dec!(2500)))
            .await?;

        ctx.orders.attach_reference(order.uuid, "ref_123").await?;

        let first = ctx.orders.complete_order(order.uuid, confirmation()).await?;
        let second = ctx.orders.complete_order(order.uuid, confirmation()).await?;

        assert_eq!(
            first.map(|order| order.payment_status),
            Some(PaymentStatus::Completed)
        );
        assert!(second.is_none(), "second completion must not update the order");

        let found = ctx.orders.find_by_reference("ref_123").await?;

        assert_eq!(found.map(|order| order.uuid), Some(order.uuid));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn mark_failed_only_touches_pending_orders() -> TestResult {
        let ctx = TestContext::new().await;
        let solution = create_solution(&ctx).await?;

        let order = ctx
            .orders
            .create_order(pending_order(solution, dec!(2500)))
            .await?;

        let failed = ctx.orders.mark_failed(order.uuid, None).await?;
        let again = ctx.orders.mark_failed(order.uuid, None).await?;

        assert_eq!(
            failed.map(|order| order.payment_status),
            Some(PaymentStatus::Failed)
        );
        assert!(again.is_none());

        let pending = ctx.orders.list_orders(Some(PaymentStatus::Pending)).await?;

        assert!(pending.is_empty());

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn delete_pending_removes_order() -> TestResult {
        let ctx = TestContext::new().await;
        let solution = create_solution(&ctx).await?;

        let order = ctx
            .orders
            .create_order(pending_order(solution, dec!(2500)))
            .await?;

        ctx.orders.delete_pending(order.uuid).await?;

        let result = ctx.orders.get_order(order.uuid).await;

        assert!(matches!(result, Err(OrdersServiceError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn unknown_solution_is_an_invalid_reference() {
        let ctx = TestContext::new().await;

        let result = ctx
            .orders
            .create_order(pending_order(SolutionUuid::new(), dec!(1)))
            .await;

        assert!(matches!(result, Err(OrdersServiceError::InvalidReference)));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn free_order_and_redemption_commit_together() -> TestResult {
        let ctx = TestContext::new().await;
        let solution = create_solution(&ctx).await?;
        create_single_use_voucher(&ctx, "FREEPASS").await?;

        let order = ctx
            .orders
            .create_free_order(free_order(solution, Some("freepass")))
            .await?;

        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert_eq!(order.voucher_code.as_deref(), Some("FREEPASS"));
        assert_eq!(ctx.vouchers.get_voucher("FREEPASS").await?.usage_count, 1);

        let exhausted = ctx
            .orders
            .create_free_order(free_order(solution, Some("FREEPASS")))
            .await;

        assert!(matches!(exhausted, Err(OrdersServiceError::VoucherExhausted)));
        assert_eq!(ctx.orders.list_orders(None).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn failed_free_order_insert_rolls_back_redemption() -> TestResult {
        let ctx = TestContext::new().await;
        create_single_use_voucher(&ctx, "FREEPASS").await?;

        // The redemption succeeds, then the insert hits the solution foreign key
        let result = ctx
            .orders
            .create_free_order(free_order(SolutionUuid::new(), Some("FREEPASS")))
            .await;

        assert!(matches!(result, Err(OrdersServiceError::InvalidReference)));
        assert_eq!(ctx.vouchers.get_voucher("FREEPASS").await?.usage_count, 0);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn free_order_without_voucher_is_created() -> TestResult {
        let ctx = TestContext::new().await;
        let solution = create_solution(&ctx).await?;

        let order = ctx
            .orders
            .create_free_order(free_order(solution, None))
            .await?;

        assert_eq!(order.payment_method.as_deref(), Some("free"));

        Ok(())
    }
}

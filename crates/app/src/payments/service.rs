//! Payments service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    domain::{
        ledger::{DEFAULT_LEDGER_TTL, LedgerService},
        notifications::{
            NotificationsService,
            data::NewNotification,
            records::{NotificationKind, Recipient},
        },
        orders::{
            OrdersService, OrdersServiceError,
            data::{NewOrder, PaymentConfirmation},
            records::{Buyer, OrderRecord, OrderUuid, PaymentStatus},
        },
        solutions::{SolutionsService, records::SolutionUuid},
        users::{UsersService, data::{NewUser, normalize_email}},
        vouchers::{VouchersService, data::QuoteRequest, evaluator::round_price},
    },
    mail::{
        Delivery, Mailer, RetryPolicy, send_with_retry,
        templates::{PaymentReceipt, format_naira, payment_confirmation},
    },
    payments::{
        data::{
            CompletedPayment, InitiatePayment, Initiation, Pricing, PreviewRequest, Verification,
        },
        effects::{EffectOutcome, SideEffects},
        errors::PaymentsServiceError,
        gateway::{
            GatewayError, InitializeTransaction, PaymentGateway, VerifiedTransaction,
            to_minor_units,
        },
    },
};

/// Payment method recorded for orders that cost nothing.
pub const FREE_PAYMENT_METHOD: &str = "free";

/// Payment method recorded when the gateway does not report a channel.
pub const DEFAULT_PAYMENT_METHOD: &str = "paystack";

#[derive(Debug, Clone, Copy)]
pub struct PaymentSettings {
    /// How long a processed reference is remembered.
    pub ledger_ttl: SignedDuration,

    pub email_retry: RetryPolicy,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            ledger_ttl: DEFAULT_LEDGER_TTL,
            email_retry: RetryPolicy::default(),
        }
    }
}

/// Collaborators of [`PaymentWorkflow`].
#[derive(Clone)]
pub struct PaymentDependencies {
    pub solutions: Arc<dyn SolutionsService>,
    pub vouchers: Arc<dyn VouchersService>,
    pub orders: Arc<dyn OrdersService>,
    pub users: Arc<dyn UsersService>,
    pub notifications: Arc<dyn NotificationsService>,
    pub ledger: Arc<dyn LedgerService>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn Mailer>,
}

#[derive(Clone)]
pub struct PaymentWorkflow {
    deps: PaymentDependencies,
    settings: PaymentSettings,
}

impl PaymentWorkflow {
    #[must_use]
    pub fn new(deps: PaymentDependencies, settings: PaymentSettings) -> Self {
        Self { deps, settings }
    }

    /// Price `solution` for `email`, applying the voucher when one is given.
    async fn price(
        &self,
        solution: SolutionUuid,
        email: &str,
        voucher_code: Option<&str>,
        now: Timestamp,
    ) -> Result<Pricing, PaymentsServiceError> {
        let solution = self.deps.solutions.get_solution(solution).await?;

        let Some(code) = voucher_code.map(str::trim).filter(|code| !code.is_empty()) else {
            return Ok(Pricing {
                original_amount: solution.price,
                final_amount: round_price(solution.price),
                voucher: None,
                solution,
            });
        };

        let quote = self
            .deps
            .vouchers
            .quote(
                code,
                QuoteRequest {
                    email: email.to_string(),
                    solution: solution.uuid,
                    amount: solution.price,
                },
                now,
            )
            .await?;

        Ok(Pricing {
            original_amount: quote.original_amount,
            final_amount: quote.discounted_amount,
            voucher: Some(quote.voucher),
            solution,
        })
    }

    async fn complete_free(
        &self,
        request: InitiatePayment,
        pricing: Pricing,
        now: Timestamp,
    ) -> Result<Initiation, PaymentsServiceError> {
        let voucher = if pricing.voucher.is_some() {
            EffectOutcome::Applied
        } else {
            EffectOutcome::NotApplicable
        };

        let order = self
            .deps
            .orders
            .create_free_order(NewOrder {
                uuid: OrderUuid::new(),
                buyer: request.buyer,
                solution: pricing.solution.uuid,
                base_amount: pricing.original_amount,
                final_amount: pricing.final_amount,
                voucher_code: pricing.voucher.map(|voucher| voucher.code),
                payment_status: PaymentStatus::Completed,
                payment_method: Some(FREE_PAYMENT_METHOD.to_string()),
                paid_at: Some(now),
            })
            .await?;

        info!(order_uuid = %order.uuid, "completed free registration");

        let effects = self
            .follow_up(&order, &pricing.solution.title, voucher, now)
            .await;

        Ok(Initiation::Completed {
            order: Box::new(order),
            effects,
        })
    }

    /// Find the order a transaction belongs to, by metadata first and reference second.
    async fn locate_order(
        &self,
        reference: &str,
        order: Option<OrderUuid>,
    ) -> Result<Option<OrderRecord>, OrdersServiceError> {
        if let Some(order) = order {
            match self.deps.orders.get_order(order).await {
                Ok(found) => return Ok(Some(found)),
                Err(OrdersServiceError::NotFound) => {}
                Err(error) => return Err(error),
            }
        }

        self.deps.orders.find_by_reference(reference).await
    }

    async fn already_processed(
        &self,
        reference: &str,
    ) -> Result<Verification, PaymentsServiceError> {
        info!(reference, "payment reference already processed");

        let order = self.deps.orders.find_by_reference(reference).await?;

        Ok(Verification::AlreadyProcessed {
            order: order.map(Box::new),
        })
    }

    async fn release_claim(&self, reference: &str) {
        if let Err(error) = self.deps.ledger.release(reference).await {
            error!(reference, %error, "failed to release ledger claim");
        }
    }

    async fn record_failure(
        &self,
        reference: &str,
        transaction: VerifiedTransaction,
    ) -> Result<Verification, PaymentsServiceError> {
        let Some(order) = self.locate_order(reference, transaction.order).await? else {
            warn!(reference, status = %transaction.status, "failed transaction has no order");

            return Ok(Verification::Failed {
                status: transaction.status,
                order: None,
            });
        };

        let failed = self
            .deps
            .orders
            .mark_failed(order.uuid, Some(transaction.raw.clone()))
            .await?;

        if failed.is_some() {
            let buyer = match self.deps.users.find_by_email(&order.buyer.email).await {
                Ok(user) => user.map(|user| Recipient::User(user.uuid)),
                Err(error) => {
                    warn!(order_uuid = %order.uuid, %error, "failed to look up buyer");

                    None
                }
            };

            self.notify(failure_notifications(&order, &transaction.status, buyer))
                .await;
        }

        info!(order_uuid = %order.uuid, status = %transaction.status, "payment failed");

        Ok(Verification::Failed {
            status: transaction.status,
            order: Some(Box::new(failed.unwrap_or(order))),
        })
    }

    /// Run every side effect of a completed order and report each outcome.
    async fn follow_up(
        &self,
        order: &OrderRecord,
        solution_title: &str,
        voucher: EffectOutcome,
        paid_at: Timestamp,
    ) -> SideEffects {
        let (user, buyer) = match self
            .deps
            .users
            .ensure_user(NewUser {
                email: order.buyer.email.clone(),
                first_name: order.buyer.first_name.clone(),
                last_name: order.buyer.last_name.clone(),
            })
            .await
        {
            Ok(user) => (EffectOutcome::Applied, Some(Recipient::User(user.uuid))),
            Err(error) => {
                warn!(order_uuid = %order.uuid, %error, "failed to create buyer account");

                (EffectOutcome::failed(error), None)
            }
        };

        let receipt = PaymentReceipt {
            buyer_name: order.buyer.full_name(),
            solution_title: solution_title.to_string(),
            amount: order.final_amount,
            reference: order
                .payment_reference
                .clone()
                .unwrap_or_else(|| order.uuid.to_string()),
            paid_at,
        };

        let email = match send_with_retry(
            self.deps.mailer.as_ref(),
            payment_confirmation(&order.buyer.email, &receipt),
            self.settings.email_retry,
        )
        .await
        {
            Delivery::Delivered { .. } => EffectOutcome::Applied,
            Delivery::Failed { error, .. } => EffectOutcome::Failed { reason: error },
        };

        let notifications = self
            .notify(success_notifications(order, solution_title, buyer))
            .await;

        let effects = SideEffects {
            voucher,
            user,
            email,
            notifications,
        };

        if effects.failures() > 0 {
            warn!(
                order_uuid = %order.uuid,
                voucher = effects.voucher.as_str(),
                user = effects.user.as_str(),
                email = effects.email.as_str(),
                notifications = effects.notifications.as_str(),
                "payment side effects incomplete"
            );
        }

        effects
    }

    async fn notify(&self, notifications: Vec<NewNotification>) -> EffectOutcome {
        match self.deps.notifications.create_batch(notifications).await {
            Ok(_) => EffectOutcome::Applied,
            Err(error) => {
                warn!(%error, "failed to write notifications");

                EffectOutcome::failed(error)
            }
        }
    }
}

#[async_trait]
impl PaymentsService for PaymentWorkflow {
    #[tracing::instrument(
        name = "payments.service.preview",
        skip(self, request),
        fields(solution_uuid = %request.solution),
        err
    )]
    async fn preview(
        &self,
        request: PreviewRequest,
        now: Timestamp,
    ) -> Result<Pricing, PaymentsServiceError> {
        let email = normalize_email(&request.email);

        if email.is_empty() {
            return Err(PaymentsServiceError::MissingRequiredData("email"));
        }

        self.price(request.solution, &email, request.voucher_code.as_deref(), now)
            .await
    }

    #[tracing::instrument(
        name = "payments.service.initiate",
        skip(self, request),
        fields(solution_uuid = %request.solution),
        err
    )]
    async fn initiate(
        &self,
        request: InitiatePayment,
        now: Timestamp,
    ) -> Result<Initiation, PaymentsServiceError> {
        let request = validate_initiation(request)?;

        let pricing = self
            .price(
                request.solution,
                &request.buyer.email,
                request.voucher_code.as_deref(),
                now,
            )
            .await?;

        if pricing.final_amount.is_zero() {
            return self.complete_free(request, pricing, now).await;
        }

        let amount_minor =
            to_minor_units(pricing.final_amount).map_err(PaymentsServiceError::InitiationFailed)?;

        let order = self
            .deps
            .orders
            .create_order(NewOrder {
                uuid: OrderUuid::new(),
                buyer: request.buyer,
                solution: pricing.solution.uuid,
                base_amount: pricing.original_amount,
                final_amount: pricing.final_amount,
                voucher_code: pricing.voucher.map(|voucher| voucher.code),
                payment_status: PaymentStatus::Pending,
                payment_method: None,
                paid_at: None,
            })
            .await?;

        let initialized = match self
            .deps
            .gateway
            .initialize(InitializeTransaction {
                email: order.buyer.email.clone(),
                amount_minor,
                callback_url: request.callback_url,
                order: order.uuid,
            })
            .await
        {
            Ok(initialized) => initialized,
            Err(gateway_error) => {
                if let Err(error) = self.deps.orders.delete_pending(order.uuid).await {
                    error!(order_uuid = %order.uuid, %error, "failed to delete pending order");
                }

                return Err(PaymentsServiceError::InitiationFailed(gateway_error));
            }
        };

        self.deps
            .orders
            .attach_reference(order.uuid, &initialized.reference)
            .await?;

        info!(
            order_uuid = %order.uuid,
            reference = %initialized.reference,
            amount = %order.final_amount,
            "initiated payment"
        );

        Ok(Initiation::Redirect {
            order: order.uuid,
            authorization_url: initialized.authorization_url,
            reference: initialized.reference,
        })
    }

    #[tracing::instrument(name = "payments.service.verify", skip(self), err)]
    async fn verify(
        &self,
        reference: &str,
        now: Timestamp,
    ) -> Result<Verification, PaymentsServiceError> {
        let reference = reference.trim();

        if reference.is_empty() {
            return Err(PaymentsServiceError::MissingRequiredData("reference"));
        }

        if self.deps.ledger.is_processed(reference, now).await? {
            return self.already_processed(reference).await;
        }

        let transaction = self
            .deps
            .gateway
            .verify(reference)
            .await
            .map_err(verification_error)?;

        if !transaction.is_success() {
            return self.record_failure(reference, transaction).await;
        }

        if !self
            .deps
            .ledger
            .claim(reference, now, self.settings.ledger_ttl)
            .await?
        {
            return self.already_processed(reference).await;
        }

        let order = match self.locate_order(reference, transaction.order).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                self.release_claim(reference).await;

                return Err(PaymentsServiceError::OrderNotFound);
            }
            Err(error) => {
                self.release_claim(reference).await;

                return Err(error.into());
            }
        };

        if to_minor_units(order.final_amount).ok() != Some(transaction.amount_minor) {
            warn!(
                order_uuid = %order.uuid,
                expected = %order.final_amount,
                amount_minor = transaction.amount_minor,
                "gateway amount differs from order amount"
            );
        }

        let paid_at = transaction.paid_at.unwrap_or(now);

        let confirmation = PaymentConfirmation {
            payment_method: transaction
                .channel
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            paid_at,
            gateway_payload: transaction.raw,
        };

        let completed = match self.deps.orders.complete_order(order.uuid, confirmation).await {
            Ok(Some(completed)) => completed,
            Ok(None) => {
                info!(order_uuid = %order.uuid, "order was already completed");

                return Ok(Verification::AlreadyProcessed {
                    order: Some(Box::new(order)),
                });
            }
            Err(error) => {
                self.release_claim(reference).await;

                return Err(error.into());
            }
        };

        info!(order_uuid = %completed.uuid, reference, "payment completed");

        let voucher = match completed.voucher_code.as_deref() {
            Some(code) => match self.deps.vouchers.redeem(code).await {
                Ok(_) => EffectOutcome::Applied,
                Err(error) => {
                    warn!(order_uuid = %completed.uuid, code, %error, "voucher not redeemed");

                    EffectOutcome::failed(error)
                }
            },
            None => EffectOutcome::NotApplicable,
        };

        let solution_title = match self.deps.solutions.get_solution(completed.solution).await {
            Ok(solution) => solution.title,
            Err(error) => {
                warn!(solution_uuid = %completed.solution, %error, "failed to load solution");

                completed.solution.to_string()
            }
        };

        let effects = self
            .follow_up(&completed, &solution_title, voucher, paid_at)
            .await;

        Ok(Verification::Completed(Box::new(CompletedPayment {
            order: completed,
            solution_title,
            paid_at,
            effects,
        })))
    }
}

fn required(value: String, field: &'static str) -> Result<String, PaymentsServiceError> {
    let value = value.trim().to_string();

    if value.is_empty() {
        return Err(PaymentsServiceError::MissingRequiredData(field));
    }

    Ok(value)
}

fn validate_initiation(request: InitiatePayment) -> Result<InitiatePayment, PaymentsServiceError> {
    let Buyer {
        first_name,
        last_name,
        email,
        phone,
        organization,
    } = request.buyer;

    Ok(InitiatePayment {
        buyer: Buyer {
            first_name: required(first_name, "first name")?,
            last_name: required(last_name, "last name")?,
            email: normalize_email(&required(email, "email")?),
            phone,
            organization,
        },
        callback_url: required(request.callback_url, "callback url")?,
        ..request
    })
}

fn success_notifications(
    order: &OrderRecord,
    solution_title: &str,
    buyer: Option<Recipient>,
) -> Vec<NewNotification> {
    let related = json!({
        "orderId": order.uuid.to_string(),
        "reference": order.payment_reference,
        "amount": order.final_amount.to_string(),
    });

    let mut notifications = Vec::with_capacity(2);

    if let Some(buyer) = buyer {
        notifications.push(NewNotification::new(
            vec![buyer],
            NotificationKind::Success,
            "Payment successful",
            format!(
                "Your payment of {} for {solution_title} was successful.",
                format_naira(order.final_amount)
            ),
            related.clone(),
        ));
    }

    notifications.push(NewNotification::new(
        vec![Recipient::Admin],
        NotificationKind::Success,
        "New payment received",
        format!(
            "{} ({}) paid {} for {solution_title}.",
            order.buyer.full_name(),
            order.buyer.email,
            format_naira(order.final_amount)
        ),
        related,
    ));

    notifications
}

fn failure_notifications(
    order: &OrderRecord,
    status: &str,
    buyer: Option<Recipient>,
) -> Vec<NewNotification> {
    let related = json!({
        "orderId": order.uuid.to_string(),
        "reference": order.payment_reference,
        "status": status,
    });

    let mut notifications = Vec::with_capacity(2);

    if let Some(buyer) = buyer {
        notifications.push(NewNotification::new(
            vec![buyer],
            NotificationKind::Error,
            "Payment failed",
            format!("Your payment could not be completed (status: {status})."),
            related.clone(),
        ));
    }

    notifications.push(NewNotification::new(
        vec![Recipient::Admin],
        NotificationKind::Error,
        "Payment failed",
        format!(
            "Payment of {} by {} failed (status: {status}).",
            format_naira(order.final_amount),
            order.buyer.full_name()
        ),
        related,
    ));

    notifications
}

/// Gateway 4xx answers are about the reference, anything else is an outage.
fn verification_error(error: GatewayError) -> PaymentsServiceError {
    match error {
        GatewayError::Rejected { status, message } if (400..500).contains(&status) => {
            PaymentsServiceError::ReferenceRejected(message)
        }
        other => PaymentsServiceError::VerificationUnavailable(other),
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Price a solution for a buyer without persisting anything.
    async fn preview(
        &self,
        request: PreviewRequest,
        now: Timestamp,
    ) -> Result<Pricing, PaymentsServiceError>;

    /// Create an order and hand the buyer to the gateway, or complete it
    /// directly when nothing is owed.
    async fn initiate(
        &self,
        request: InitiatePayment,
        now: Timestamp,
    ) -> Result<Initiation, PaymentsServiceError>;

    /// Confirm a gateway transaction.
    ///
    /// Safe to call any number of times, concurrently or not: an order is
    /// completed and its buyer emailed at most once per reference.
    async fn verify(
        &self,
        reference: &str,
        now: Timestamp,
    ) -> Result<Verification, PaymentsServiceError>;
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use rustc_hash::FxHashMap;
    use serde_json::Value;
    use testresult::TestResult;

    use crate::{
        domain::{
            ledger::LedgerServiceError,
            notifications::MockNotificationsService,
            orders::MockOrdersService,
            solutions::{MockSolutionsService, records::SolutionRecord},
            users::{MockUsersService, records::{UserRecord, UserUuid}},
            vouchers::{
                MockVouchersService, VouchersServiceError,
                data::VoucherQuote,
                evaluator::VoucherRejection,
                records::{Discount, VoucherRecord, VoucherUuid},
            },
        },
        mail::MockMailer,
        payments::gateway::{
            GatewayError, InitializedTransaction, MockPaymentGateway, VerifiedTransaction,
        },
    };

    use super::*;

    // 2026-01-01T06:00:00Z
    const NOW: Timestamp = Timestamp::constant(1_767_247_200, 0);

    /// Ledger with the same claim semantics as the SQL upsert.
    #[derive(Default)]
    struct InMemoryLedger {
        entries: Mutex<FxHashMap<String, Timestamp>>,
    }

    impl InMemoryLedger {
        fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LedgerService for InMemoryLedger {
        async fn is_processed(
            &self,
            reference: &str,
            now: Timestamp,
        ) -> Result<bool, LedgerServiceError> {
            let entries = self.entries.lock().unwrap();

            Ok(entries.get(reference).is_some_and(|expires| *expires > now))
        }

        async fn claim(
            &self,
            reference: &str,
            now: Timestamp,
            ttl: SignedDuration,
        ) -> Result<bool, LedgerServiceError> {
            let mut entries = self.entries.lock().unwrap();

            if entries.get(reference).is_some_and(|expires| *expires > now) {
                return Ok(false);
            }

            entries.insert(reference.to_string(), now + ttl);

            Ok(true)
        }

        async fn release(&self, reference: &str) -> Result<(), LedgerServiceError> {
            self.entries.lock().unwrap().remove(reference);

            Ok(())
        }

        async fn purge_expired(&self, now: Timestamp) -> Result<u64, LedgerServiceError> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();

            entries.retain(|_, expires| *expires > now);

            Ok((before - entries.len()) as u64)
        }
    }

    #[derive(Default)]
    struct Mocks {
        solutions: MockSolutionsService,
        vouchers: MockVouchersService,
        orders: MockOrdersService,
        users: MockUsersService,
        notifications: MockNotificationsService,
        gateway: MockPaymentGateway,
        mailer: MockMailer,
    }

    impl Mocks {
        fn into_workflow(self, ledger: Arc<InMemoryLedger>) -> PaymentWorkflow {
            PaymentWorkflow::new(
                PaymentDependencies {
                    solutions: Arc::new(self.solutions),
                    vouchers: Arc::new(self.vouchers),
                    orders: Arc::new(self.orders),
                    users: Arc::new(self.users),
                    notifications: Arc::new(self.notifications),
                    ledger,
                    gateway: Arc::new(self.gateway),
                    mailer: Arc::new(self.mailer),
                },
                PaymentSettings {
                    ledger_ttl: DEFAULT_LEDGER_TTL,
                    email_retry: RetryPolicy {
                        max_attempts: 1,
                        delay: Duration::ZERO,
                    },
                },
            )
        }

        /// Expect the post-completion side effects exactly once.
        fn expect_follow_up(&mut self) {
            self.users
                .expect_ensure_user()
                .times(1)
                .returning(|user| Ok(user_record(&user.email)));
            self.mailer.expect_send().times(1).returning(|_| Ok(()));
            self.notifications
                .expect_create_batch()
                .times(1)
                .returning(|_| Ok(Vec::new()));
        }
    }

    fn solution(price: Decimal) -> SolutionRecord {
        SolutionRecord {
            uuid: SolutionUuid::new(),
            title: "Leadership Masterclass".to_string(),
            description: None,
            price,
            created_at: NOW,
            updated_at: NOW,
        }
    }

    fn buyer() -> Buyer {
        Buyer {
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            organization: None,
        }
    }

    fn user_record(email: &str) -> UserRecord {
        UserRecord {
            uuid: UserUuid::new(),
            email: email.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            created_at: NOW,
            updated_at: NOW,
        }
    }

    fn voucher(code: &str, discount: Discount) -> VoucherRecord {
        VoucherRecord {
            uuid: VoucherUuid::new(),
            code: code.to_string(),
            discount,
            expires_at: NOW + SignedDuration::from_hours(24),
            usage_limit: 5,
            usage_count: 4,
            once_per_user: false,
            applicable_solutions: Vec::new(),
            applicable_emails: Vec::new(),
            min_cart_amount: Decimal::ZERO,
            new_users_only: false,
            created_at: NOW,
            updated_at: NOW,
        }
    }

    fn record_from(order: NewOrder) -> OrderRecord {
        OrderRecord {
            uuid: order.uuid,
            buyer: order.buyer,
            solution: order.solution,
            base_amount: order.base_amount,
            final_amount: order.final_amount,
            voucher_code: order.voucher_code,
            payment_status: order.payment_status,
            payment_reference: None,
            payment_method: order.payment_method,
            paid_at: order.paid_at,
            gateway_payload: None,
            created_at: NOW,
            updated_at: NOW,
        }
    }

    fn pending_order(reference: &str, voucher_code: Option<&str>) -> OrderRecord {
        OrderRecord {
            payment_reference: Some(reference.to_string()),
            ..record_from(NewOrder {
                uuid: OrderUuid::new(),
                buyer: buyer(),
                solution: SolutionUuid::new(),
                base_amount: dec!(10000),
                final_amount: dec!(9000),
                voucher_code: voucher_code.map(str::to_string),
                payment_status: PaymentStatus::Pending,
                payment_method: None,
                paid_at: None,
            })
        }
    }

    fn completed(order: &OrderRecord, confirmation: PaymentConfirmation) -> OrderRecord {
        OrderRecord {
            payment_status: PaymentStatus::Completed,
            payment_method: Some(confirmation.payment_method),
            paid_at: Some(confirmation.paid_at),
            gateway_payload: Some(confirmation.gateway_payload),
            ..order.clone()
        }
    }

    fn transaction(order: &OrderRecord, status: &str) -> VerifiedTransaction {
        VerifiedTransaction {
            status: status.to_string(),
            reference: order.payment_reference.clone().unwrap_or_default(),
            amount_minor: 900_000,
            channel: Some("card".to_string()),
            paid_at: Some(NOW),
            order: Some(order.uuid),
            raw: json!({ "status": status }),
        }
    }

    fn initiate_request(solution: SolutionUuid, voucher_code: Option<&str>) -> InitiatePayment {
        InitiatePayment {
            buyer: buyer(),
            solution,
            voucher_code: voucher_code.map(str::to_string),
            callback_url: "https://agora.example/callback".to_string(),
        }
    }

    /// Wire `orders` so that completing `order` succeeds the first time only.
    fn expect_single_completion(mocks: &mut Mocks, order: &OrderRecord) {
        let pending = order.clone();
        mocks
            .orders
            .expect_get_order()
            .returning(move |_| Ok(pending.clone()));

        let to_complete = order.clone();
        mocks
            .orders
            .expect_complete_order()
            .times(1)
            .returning(move |_, confirmation| Ok(Some(completed(&to_complete, confirmation))));

        let found = order.clone();
        mocks
            .orders
            .expect_find_by_reference()
            .returning(move |_| Ok(Some(found.clone())));

        let product = solution(dec!(10000));
        mocks
            .solutions
            .expect_get_solution()
            .returning(move |_| Ok(product.clone()));
    }

    #[tokio::test]
    async fn preview_and_initiate_price_identically() -> TestResult {
        let product = solution(dec!(10000));
        let save10 = voucher("SAVE10", Discount::Percentage(dec!(10)));
        let mut mocks = Mocks::default();

        let returned = product.clone();
        mocks
            .solutions
            .expect_get_solution()
            .times(2)
            .returning(move |_| Ok(returned.clone()));

        let quoted = save10.clone();
        mocks
            .vouchers
            .expect_quote()
            .times(2)
            .returning(move |_, request, _| {
                Ok(VoucherQuote {
                    voucher: quoted.clone(),
                    original_amount: request.amount,
                    discounted_amount: dec!(9000.00),
                })
            });

        mocks
            .orders
            .expect_create_order()
            .withf(|order| {
                order.payment_status == PaymentStatus::Pending
                    && order.base_amount == dec!(10000)
                    && order.final_amount == dec!(9000)
                    && order.voucher_code.as_deref() == Some("SAVE10")
            })
            .times(1)
            .returning(|order| Ok(record_from(order)));

        mocks
            .gateway
            .expect_initialize()
            .withf(|transaction| {
                transaction.amount_minor == 900_000 && transaction.email == "ada@example.com"
            })
            .times(1)
            .returning(|_| {
                Ok(InitializedTransaction {
                    authorization_url: "https://checkout.paystack.com/abc".to_string(),
                    access_code: "abc".to_string(),
                    reference: "ref_123".to_string(),
                })
            });

        mocks
            .orders
            .expect_attach_reference()
            .withf(|_, reference| reference == "ref_123")
            .times(1)
            .returning(|order, _| {
                Ok(OrderRecord {
                    uuid: order,
                    ..pending_order("ref_123", None)
                })
            });

        let workflow = mocks.into_workflow(Arc::new(InMemoryLedger::default()));

        let pricing = workflow
            .preview(
                PreviewRequest {
                    email: "ada@example.com".to_string(),
                    solution: product.uuid,
                    voucher_code: Some("save10".to_string()),
                },
                NOW,
            )
            .await?;

        assert_eq!(pricing.original_amount, dec!(10000));
        assert_eq!(pricing.final_amount, dec!(9000));

        let initiation = workflow
            .initiate(initiate_request(product.uuid, Some("save10")), NOW)
            .await?;

        assert!(matches!(
            initiation,
            Initiation::Redirect { ref reference, .. } if reference == "ref_123"
        ));

        Ok(())
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_any_call() {
        let workflow = Mocks::default().into_workflow(Arc::new(InMemoryLedger::default()));

        let mut request = initiate_request(SolutionUuid::new(), None);
        request.buyer.first_name = "  ".to_string();

        let result = workflow.initiate(request, NOW).await;

        assert!(matches!(
            result,
            Err(PaymentsServiceError::MissingRequiredData("first name"))
        ));

        let mut request = initiate_request(SolutionUuid::new(), None);
        request.callback_url = String::new();

        let result = workflow.initiate(request, NOW).await;

        assert!(matches!(
            result,
            Err(PaymentsServiceError::MissingRequiredData("callback url"))
        ));
    }

    #[tokio::test]
    async fn unknown_solution_is_rejected() {
        let mut mocks = Mocks::default();
        mocks
            .solutions
            .expect_get_solution()
            .returning(|_| Err(crate::domain::solutions::SolutionsServiceError::NotFound));

        let workflow = mocks.into_workflow(Arc::new(InMemoryLedger::default()));

        let result = workflow
            .initiate(initiate_request(SolutionUuid::new(), None), NOW)
            .await;

        assert!(matches!(result, Err(PaymentsServiceError::SolutionNotFound)));
    }

    #[tokio::test]
    async fn invalid_voucher_surfaces_its_reason() {
        let mut mocks = Mocks::default();
        let product = solution(dec!(10000));

        mocks
            .solutions
            .expect_get_solution()
            .returning(move |_| Ok(product.clone()));
        mocks.vouchers.expect_quote().returning(|_, _, _| {
            Err(VouchersServiceError::Rejected(
                VoucherRejection::UsageLimitReached,
            ))
        });

        let workflow = mocks.into_workflow(Arc::new(InMemoryLedger::default()));

        let result = workflow
            .initiate(initiate_request(SolutionUuid::new(), Some("SAVE10")), NOW)
            .await;

        assert!(matches!(
            result,
            Err(PaymentsServiceError::Voucher(VoucherRejection::UsageLimitReached))
        ));
    }

    #[tokio::test]
    async fn gateway_failure_deletes_the_pending_order() {
        let mut mocks = Mocks::default();
        let product = solution(dec!(5000));
        let created = Arc::new(Mutex::new(None));

        mocks
            .solutions
            .expect_get_solution()
            .returning(move |_| Ok(product.clone()));

        let remember = created.clone();
        mocks
            .orders
            .expect_create_order()
            .times(1)
            .returning(move |order| {
                *remember.lock().unwrap() = Some(order.uuid);

                Ok(record_from(order))
            });

        mocks
            .gateway
            .expect_initialize()
            .times(1)
            .returning(|_| Err(GatewayError::Http("connection reset".to_string())));

        let deleted = created.clone();
        mocks
            .orders
            .expect_delete_pending()
            .withf(move |order| Some(*order) == *deleted.lock().unwrap())
            .times(1)
            .returning(|_| Ok(()));

        let workflow = mocks.into_workflow(Arc::new(InMemoryLedger::default()));

        let result = workflow
            .initiate(initiate_request(SolutionUuid::new(), None), NOW)
            .await;

        assert!(matches!(
            result,
            Err(PaymentsServiceError::InitiationFailed(GatewayError::Http(_)))
        ));
    }

    #[tokio::test]
    async fn free_solution_completes_without_the_gateway() -> TestResult {
        let mut mocks = Mocks::default();
        let product = solution(Decimal::ZERO);

        mocks
            .solutions
            .expect_get_solution()
            .returning(move |_| Ok(product.clone()));
        mocks
            .orders
            .expect_create_free_order()
            .withf(|order| {
                order.payment_status == PaymentStatus::Completed
                    && order.payment_method.as_deref() == Some(FREE_PAYMENT_METHOD)
                    && order.paid_at == Some(NOW)
                    && order.voucher_code.is_none()
            })
            .times(1)
            .returning(|order| Ok(record_from(order)));
        mocks.expect_follow_up();

        let workflow = mocks.into_workflow(Arc::new(InMemoryLedger::default()));

        let initiation = workflow
            .initiate(initiate_request(SolutionUuid::new(), None), NOW)
            .await?;

        let (order, effects) = match initiation {
            Initiation::Completed { order, effects } => (order, effects),
            other => return Err(format!("expected a completed registration, got {other:?}").into()),
        };

        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert_eq!(effects.voucher, EffectOutcome::NotApplicable);
        assert_eq!(effects.email, EffectOutcome::Applied);
        assert_eq!(effects.failures(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn voucher_discounted_to_zero_redeems_exactly_once() -> TestResult {
        let mut mocks = Mocks::default();
        let product = solution(dec!(3000));
        let free = voucher("FREE", Discount::Fixed(dec!(5000)));

        mocks
            .solutions
            .expect_get_solution()
            .returning(move |_| Ok(product.clone()));

        let quoted = free.clone();
        mocks.vouchers.expect_quote().returning(move |_, request, _| {
            Ok(VoucherQuote {
                voucher: quoted.clone(),
                original_amount: request.amount,
                discounted_amount: Decimal::ZERO,
            })
        });

        // Redemption happens inside the order transaction, never as a separate call
        mocks.vouchers.expect_redeem().never();

        mocks
            .orders
            .expect_create_free_order()
            .withf(|order| {
                order.payment_status == PaymentStatus::Completed
                    && order.base_amount == dec!(3000)
                    && order.final_amount.is_zero()
                    && order.voucher_code.as_deref() == Some("FREE")
            })
            .times(1)
            .returning(|order| Ok(record_from(order)));
        mocks.expect_follow_up();

        let workflow = mocks.into_workflow(Arc::new(InMemoryLedger::default()));

        let initiation = workflow
            .initiate(initiate_request(SolutionUuid::new(), Some("free")), NOW)
            .await?;

        assert!(matches!(
            initiation,
            Initiation::Completed { ref effects, .. } if effects.voucher == EffectOutcome::Applied
        ));

        Ok(())
    }

    #[tokio::test]
    async fn free_order_is_not_created_when_voucher_race_is_lost() {
        let mut mocks = Mocks::default();
        let product = solution(dec!(3000));
        let free = voucher("FREE", Discount::Fixed(dec!(5000)));

        mocks
            .solutions
            .expect_get_solution()
            .returning(move |_| Ok(product.clone()));
        mocks.vouchers.expect_quote().returning(move |_, request, _| {
            Ok(VoucherQuote {
                voucher: free.clone(),
                original_amount: request.amount,
                discounted_amount: Decimal::ZERO,
            })
        });
        mocks
            .orders
            .expect_create_free_order()
            .times(1)
            .returning(|_| Err(OrdersServiceError::VoucherExhausted));

        let workflow = mocks.into_workflow(Arc::new(InMemoryLedger::default()));

        let result = workflow
            .initiate(initiate_request(SolutionUuid::new(), Some("FREE")), NOW)
            .await;

        assert!(matches!(
            result,
            Err(PaymentsServiceError::Voucher(VoucherRejection::UsageLimitReached))
        ));
    }

    #[tokio::test]
    async fn free_order_storage_failure_has_no_side_effects() {
        let mut mocks = Mocks::default();
        let product = solution(dec!(3000));
        let free = voucher("FREE", Discount::Fixed(dec!(5000)));

        mocks
            .solutions
            .expect_get_solution()
            .returning(move |_| Ok(product.clone()));
        mocks.vouchers.expect_quote().returning(move |_, request, _| {
            Ok(VoucherQuote {
                voucher: free.clone(),
                original_amount: request.amount,
                discounted_amount: Decimal::ZERO,
            })
        });
        mocks.vouchers.expect_redeem().never();
        mocks
            .orders
            .expect_create_free_order()
            .times(1)
            .returning(|_| Err(OrdersServiceError::Sql(sqlx::Error::PoolTimedOut)));
        mocks.mailer.expect_send().never();
        mocks.notifications.expect_create_batch().never();

        let workflow = mocks.into_workflow(Arc::new(InMemoryLedger::default()));

        let result = workflow
            .initiate(initiate_request(SolutionUuid::new(), Some("FREE")), NOW)
            .await;

        assert!(matches!(
            result,
            Err(PaymentsServiceError::Orders(OrdersServiceError::Sql(_)))
        ));
    }

    #[tokio::test]
    async fn repeated_verification_is_idempotent() -> TestResult {
        let order = pending_order("ref_123", None);
        let ledger = Arc::new(InMemoryLedger::default());
        let mut mocks = Mocks::default();

        let verified = transaction(&order, "success");
        mocks
            .gateway
            .expect_verify()
            .times(1)
            .returning(move |_| Ok(verified.clone()));
        expect_single_completion(&mut mocks, &order);
        mocks.expect_follow_up();

        let workflow = mocks.into_workflow(ledger.clone());

        let first = workflow.verify("ref_123", NOW).await?;
        let second = workflow
            .verify("ref_123", NOW + SignedDuration::from_mins(1))
            .await?;

        let Verification::Completed(payment) = first else {
            panic!("expected completion, got {first:?}");
        };

        assert_eq!(payment.order.payment_status, PaymentStatus::Completed);
        assert_eq!(payment.order.payment_method.as_deref(), Some("card"));
        assert_eq!(payment.solution_title, "Leadership Masterclass");
        assert!(matches!(second, Verification::AlreadyProcessed { order: Some(_) }));
        assert_eq!(ledger.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_verifications_complete_once() -> TestResult {
        let order = pending_order("ref_123", None);
        let ledger = Arc::new(InMemoryLedger::default());
        let mut mocks = Mocks::default();

        let verified = transaction(&order, "success");
        mocks
            .gateway
            .expect_verify()
            .times(1..=2)
            .returning(move |_| Ok(verified.clone()));
        expect_single_completion(&mut mocks, &order);
        mocks.expect_follow_up();

        let workflow = mocks.into_workflow(ledger.clone());

        let (left, right) = tokio::join!(
            workflow.verify("ref_123", NOW),
            workflow.verify("ref_123", NOW)
        );

        let outcomes = [left?, right?];

        let completions = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Verification::Completed(_)))
            .count();

        assert_eq!(completions, 1);
        assert_eq!(ledger.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn voucher_limit_after_payment_is_reported_not_fatal() -> TestResult {
        let order = pending_order("ref_123", Some("SAVE10"));
        let mut mocks = Mocks::default();

        let verified = transaction(&order, "success");
        mocks
            .gateway
            .expect_verify()
            .returning(move |_| Ok(verified.clone()));
        expect_single_completion(&mut mocks, &order);
        mocks.expect_follow_up();
        mocks.vouchers.expect_redeem().times(1).returning(|_| {
            Err(VouchersServiceError::Rejected(
                VoucherRejection::UsageLimitReached,
            ))
        });

        let workflow = mocks.into_workflow(Arc::new(InMemoryLedger::default()));

        let Verification::Completed(payment) = workflow.verify("ref_123", NOW).await? else {
            panic!("expected completion");
        };

        assert_eq!(
            payment.effects.voucher,
            EffectOutcome::Failed {
                reason: "voucher usage limit reached".to_string()
            }
        );
        assert_eq!(payment.order.payment_status, PaymentStatus::Completed);

        Ok(())
    }

    #[tokio::test]
    async fn email_failure_does_not_undo_completion() -> TestResult {
        let order = pending_order("ref_123", None);
        let mut mocks = Mocks::default();

        let verified = transaction(&order, "success");
        mocks
            .gateway
            .expect_verify()
            .returning(move |_| Ok(verified.clone()));
        expect_single_completion(&mut mocks, &order);
        mocks
            .users
            .expect_ensure_user()
            .returning(|user| Ok(user_record(&user.email)));
        mocks.mailer.expect_send().times(1).returning(|_| {
            Err(crate::mail::MailError::Transport("smtp down".to_string()))
        });
        mocks
            .notifications
            .expect_create_batch()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let workflow = mocks.into_workflow(Arc::new(InMemoryLedger::default()));

        let Verification::Completed(payment) = workflow.verify("ref_123", NOW).await? else {
            panic!("expected completion");
        };

        assert!(payment.effects.email.is_failed());
        assert_eq!(payment.order.payment_status, PaymentStatus::Completed);

        Ok(())
    }

    #[tokio::test]
    async fn failed_transaction_marks_order_and_notifies() -> TestResult {
        let order = pending_order("ref_bad", None);
        let ledger = Arc::new(InMemoryLedger::default());
        let mut mocks = Mocks::default();

        let verified = transaction(&order, "failed");
        mocks
            .gateway
            .expect_verify()
            .returning(move |_| Ok(verified.clone()));

        let pending = order.clone();
        mocks
            .orders
            .expect_get_order()
            .returning(move |_| Ok(pending.clone()));

        let to_fail = order.clone();
        mocks
            .orders
            .expect_mark_failed()
            .times(1)
            .returning(move |_, payload| {
                Ok(Some(OrderRecord {
                    payment_status: PaymentStatus::Failed,
                    gateway_payload: payload,
                    ..to_fail.clone()
                }))
            });

        mocks
            .users
            .expect_find_by_email()
            .returning(|email| Ok(Some(user_record(email))));

        mocks
            .notifications
            .expect_create_batch()
            .withf(|notifications| {
                notifications.len() == 2
                    && notifications
                        .iter()
                        .any(|n| n.recipients == vec![Recipient::Admin])
                    && notifications
                        .iter()
                        .any(|n| matches!(n.recipients.as_slice(), [Recipient::User(_)]))
                    && notifications
                        .iter()
                        .all(|n| n.kind == NotificationKind::Error)
            })
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let workflow = mocks.into_workflow(ledger.clone());

        let result = workflow.verify("ref_bad", NOW).await?;

        let Verification::Failed { status, order } = result else {
            panic!("expected failure, got {result:?}");
        };

        assert_eq!(status, "failed");
        assert_eq!(
            order.map(|order| order.payment_status),
            Some(PaymentStatus::Failed)
        );
        assert_eq!(ledger.len(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_order_releases_the_claim() {
        let order = pending_order("ref_lost", None);
        let ledger = Arc::new(InMemoryLedger::default());
        let mut mocks = Mocks::default();

        let verified = transaction(&order, "success");
        mocks
            .gateway
            .expect_verify()
            .returning(move |_| Ok(verified.clone()));
        mocks
            .orders
            .expect_get_order()
            .returning(|_| Err(OrdersServiceError::NotFound));
        mocks
            .orders
            .expect_find_by_reference()
            .returning(|_| Ok(None));

        let workflow = mocks.into_workflow(ledger.clone());

        let result = workflow.verify("ref_lost", NOW).await;

        assert!(matches!(result, Err(PaymentsServiceError::OrderNotFound)));
        assert_eq!(ledger.len(), 0);
    }

    #[tokio::test]
    async fn unreachable_gateway_leaves_ledger_untouched() {
        let ledger = Arc::new(InMemoryLedger::default());
        let mut mocks = Mocks::default();

        mocks
            .gateway
            .expect_verify()
            .returning(|_| Err(GatewayError::Http("timeout".to_string())));

        let workflow = mocks.into_workflow(ledger.clone());

        let result = workflow.verify("ref_123", NOW).await;

        assert!(matches!(
            result,
            Err(PaymentsServiceError::VerificationUnavailable(_))
        ));
        assert_eq!(ledger.len(), 0);
    }

    #[tokio::test]
    async fn unknown_reference_is_a_client_error() {
        let ledger = Arc::new(InMemoryLedger::default());
        let mut mocks = Mocks::default();

        mocks.gateway.expect_verify().returning(|_| {
            Err(GatewayError::Rejected {
                status: 400,
                message: "Transaction reference not found".to_string(),
            })
        });
        mocks.orders.expect_find_by_reference().never();

        let workflow = mocks.into_workflow(ledger.clone());

        let result = workflow.verify("ref_bogus", NOW).await;

        assert!(matches!(
            result,
            Err(PaymentsServiceError::ReferenceRejected(ref message))
                if message == "Transaction reference not found"
        ));
        assert_eq!(ledger.len(), 0);
    }

    #[tokio::test]
    async fn gateway_server_error_is_still_unavailable() {
        let ledger = Arc::new(InMemoryLedger::default());
        let mut mocks = Mocks::default();

        mocks.gateway.expect_verify().returning(|_| {
            Err(GatewayError::Rejected {
                status: 503,
                message: "maintenance".to_string(),
            })
        });

        let workflow = mocks.into_workflow(ledger.clone());

        let result = workflow.verify("ref_123", NOW).await;

        assert!(matches!(
            result,
            Err(PaymentsServiceError::VerificationUnavailable(
                GatewayError::Rejected { status: 503, .. }
            ))
        ));
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn success_notifications_skip_unknown_buyer() {
        let order = pending_order("ref_1", None);

        let notifications = success_notifications(&order, "Masterclass", None);

        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].recipients, vec![Recipient::Admin]);
        assert!(notifications[0].message.contains("₦9,000.00"));
        assert_eq!(notifications[0].related_data["reference"], Value::from("ref_1"));
    }
}

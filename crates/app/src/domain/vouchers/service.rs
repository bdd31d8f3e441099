//! Vouchers service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::{
    database::Db,
    domain::{
        users::data::normalize_email,
        vouchers::{
            data::{NewVoucher, QuoteRequest, VoucherQuote, normalize_code},
            errors::VouchersServiceError,
            evaluator::{BuyerHistory, VoucherRejection, VoucherRequest, evaluate},
            records::{Discount, VoucherRecord},
            repository::PgVouchersRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgVouchersService {
    db: Db,
    repository: PgVouchersRepository,
}

impl PgVouchersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgVouchersRepository::new(),
        }
    }
}

#[async_trait]
impl VouchersService for PgVouchersService {
    #[tracing::instrument(
        name = "vouchers.service.create_voucher",
        skip(self, voucher),
        fields(voucher_code = %voucher.code),
        err
    )]
    async fn create_voucher(&self, voucher: NewVoucher) -> Result<VoucherRecord, VouchersServiceError> {
        let voucher = validate_new_voucher(voucher)?;

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_voucher(&mut tx, voucher).await?;

        tx.commit().await?;

        info!(voucher_code = %created.code, "created voucher");

        Ok(created)
    }

    async fn list_vouchers(&self) -> Result<Vec<VoucherRecord>, VouchersServiceError> {
        let mut tx = self.db.begin().await?;

        let vouchers = self.repository.list_vouchers(&mut tx).await?;

        tx.commit().await?;

        Ok(vouchers)
    }

    async fn get_voucher(&self, code: &str) -> Result<VoucherRecord, VouchersServiceError> {
        let mut tx = self.db.begin().await?;

        let voucher = self
            .repository
            .find_by_code(&mut tx, &normalize_code(code))
            .await?;

        tx.commit().await?;

        voucher.ok_or(VouchersServiceError::NotFound)
    }

    #[tracing::instrument(
        name = "vouchers.service.quote",
        skip(self, request),
        fields(solution_uuid = %request.solution, amount = %request.amount),
        err
    )]
    async fn quote(
        &self,
        code: &str,
        request: QuoteRequest,
        now: Timestamp,
    ) -> Result<VoucherQuote, VouchersServiceError> {
        let code = normalize_code(code);
        let email = normalize_email(&request.email);

        let mut tx = self.db.begin().await?;

        let Some(voucher) = self.repository.find_by_code(&mut tx, &code).await? else {
            return Err(VoucherRejection::NotFound.into());
        };

        let is_known_user = if voucher.new_users_only {
            self.repository.user_exists(&mut tx, &email).await?
        } else {
            false
        };

        let has_redeemed = if voucher.once_per_user {
            self.repository
                .has_completed_redemption(&mut tx, &email, &code)
                .await?
        } else {
            false
        };

        tx.commit().await?;

        let discounted_amount = evaluate(
            &voucher,
            VoucherRequest {
                email: &email,
                solution: request.solution,
                amount: request.amount,
            },
            BuyerHistory {
                is_known_user,
                has_redeemed,
            },
            now,
        )?;

        debug!(%discounted_amount, "voucher accepted");

        Ok(VoucherQuote {
            voucher,
            original_amount: request.amount,
            discounted_amount,
        })
    }

    #[tracing::instrument(name = "vouchers.service.redeem", skip(self), err)]
    async fn redeem(&self, code: &str) -> Result<VoucherRecord, VouchersServiceError> {
        let code = normalize_code(code);

        let mut tx = self.db.begin().await?;

        let redeemed = self.repository.redeem(&mut tx, &code).await?;

        let result = match redeemed {
            Some(voucher) => Ok(voucher),
            None => match self.repository.find_by_code(&mut tx, &code).await? {
                Some(_) => Err(VoucherRejection::UsageLimitReached.into()),
                None => Err(VouchersServiceError::NotFound),
            },
        };

        tx.commit().await?;

        if let Ok(voucher) = &result {
            info!(
                voucher_code = %voucher.code,
                usage_count = voucher.usage_count,
                usage_limit = voucher.usage_limit,
                "redeemed voucher"
            );
        }

        result
    }
}

fn validate_new_voucher(voucher: NewVoucher) -> Result<NewVoucher, VouchersServiceError> {
    let code = normalize_code(&voucher.code);

    if code.is_empty() {
        return Err(VouchersServiceError::MissingRequiredData);
    }

    let valid_discount = match voucher.discount {
        Discount::Percentage(value) => value >= Decimal::ZERO && value <= Decimal::ONE_HUNDRED,
        Discount::Fixed(value) => value >= Decimal::ZERO,
    };

    if !valid_discount {
        return Err(VouchersServiceError::InvalidDiscount);
    }

    if voucher.min_cart_amount.is_sign_negative() {
        return Err(VouchersServiceError::InvalidData);
    }

    let mut applicable_emails: Vec<String> = voucher
        .applicable_emails
        .iter()
        .map(|email| normalize_email(email))
        .filter(|email| !email.is_empty())
        .collect();

    applicable_emails.sort_unstable();
    applicable_emails.dedup();

    Ok(NewVoucher {
        code,
        applicable_emails,
        ..voucher
    })
}

#[automock]
#[async_trait]
pub trait VouchersService: Send + Sync {
    /// Creates a voucher after normalizing its code and email allow-list.
    async fn create_voucher(&self, voucher: NewVoucher) -> Result<VoucherRecord, VouchersServiceError>;

    /// Retrieves all vouchers, newest first.
    async fn list_vouchers(&self) -> Result<Vec<VoucherRecord>, VouchersServiceError>;

    /// Retrieve a voucher by (case-insensitive) code.
    async fn get_voucher(&self, code: &str) -> Result<VoucherRecord, VouchersServiceError>;

    /// Check that the voucher applies to the cart and price it.
    ///
    /// Rejections surface as [`VouchersServiceError::Rejected`].
    async fn quote(
        &self,
        code: &str,
        request: QuoteRequest,
        now: Timestamp,
    ) -> Result<VoucherQuote, VouchersServiceError>;

    /// Atomically count one redemption against the voucher's usage limit.
    async fn redeem(&self, code: &str) -> Result<VoucherRecord, VouchersServiceError>;
}

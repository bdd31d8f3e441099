//! Voucher eligibility and discount computation.
//!
//! Everything here is pure: the caller supplies the voucher, the cart context,
//! the buyer's history and the current time. Checks run in a fixed order and
//! the first failing one decides the rejection reason.

use jiff::Timestamp;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::domain::{
    solutions::records::SolutionUuid,
    users::data::normalize_email,
    vouchers::records::{Discount, VoucherRecord},
};

/// Number of decimal places prices are rounded to.
pub const PRICE_SCALE: u32 = 2;

/// Why a voucher cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoucherRejection {
    #[error("voucher not found")]
    NotFound,

    #[error("voucher has expired")]
    Expired,

    #[error("voucher usage limit reached")]
    UsageLimitReached,

    #[error("voucher is only available to new users")]
    NewUsersOnly,

    #[error("voucher is not available for this email")]
    EmailNotEligible,

    #[error("voucher is not applicable to this solution")]
    SolutionNotEligible,

    #[error("cart amount is below the voucher minimum of {minimum}")]
    BelowMinimum { minimum: Decimal },

    #[error("voucher has already been used by this email")]
    AlreadyRedeemed,
}

/// Cart context for a single evaluation.
#[derive(Debug, Clone, Copy)]
pub struct VoucherRequest<'a> {
    pub email: &'a str,
    pub solution: SolutionUuid,
    pub amount: Decimal,
}

/// Facts about the buyer that live outside the voucher record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuyerHistory {
    /// The email already belongs to a registered user.
    pub is_known_user: bool,

    /// A completed order already used this voucher with this email.
    pub has_redeemed: bool,
}

/// Validate `voucher` for `request` and return the discounted amount.
pub fn evaluate(
    voucher: &VoucherRecord,
    request: VoucherRequest<'_>,
    history: BuyerHistory,
    now: Timestamp,
) -> Result<Decimal, VoucherRejection> {
    if voucher.expires_at <= now {
        return Err(VoucherRejection::Expired);
    }

    if voucher.is_exhausted() {
        return Err(VoucherRejection::UsageLimitReached);
    }

    if voucher.new_users_only && history.is_known_user {
        return Err(VoucherRejection::NewUsersOnly);
    }

    if !voucher.applicable_emails.is_empty() {
        let email = normalize_email(request.email);

        if !voucher.applicable_emails.iter().any(|allowed| *allowed == email) {
            return Err(VoucherRejection::EmailNotEligible);
        }
    }

    if !voucher.applicable_solutions.is_empty()
        && !voucher.applicable_solutions.contains(&request.solution)
    {
        return Err(VoucherRejection::SolutionNotEligible);
    }

    if request.amount < voucher.min_cart_amount {
        return Err(VoucherRejection::BelowMinimum {
            minimum: voucher.min_cart_amount,
        });
    }

    if voucher.once_per_user && history.has_redeemed {
        return Err(VoucherRejection::AlreadyRedeemed);
    }

    Ok(apply_discount(voucher.discount, request.amount))
}

/// Apply `discount` to `amount`, clamped at zero and rounded to two places.
#[must_use]
pub fn apply_discount(discount: Discount, amount: Decimal) -> Decimal {
    let discounted = match discount {
        Discount::Percentage(value) => amount * (Decimal::ONE - value / Decimal::ONE_HUNDRED),
        Discount::Fixed(value) => amount - value,
    };

    round_price(discounted.max(Decimal::ZERO))
}

/// Round a price to [`PRICE_SCALE`] places, midpoints away from zero.
#[must_use]
pub fn round_price(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use rust_decimal_macros::dec;

    use crate::domain::vouchers::records::VoucherUuid;

    use super::*;

    const NOW: Timestamp = Timestamp::constant(1_790_000_000, 0);

    fn voucher(discount: Discount) -> VoucherRecord {
        VoucherRecord {
            uuid: VoucherUuid::new(),
            code: "SAVE10".to_string(),
            discount,
            expires_at: NOW + SignedDuration::from_hours(24),
            usage_limit: 0,
            usage_count: 0,
            once_per_user: false,
            applicable_solutions: Vec::new(),
            applicable_emails: Vec::new(),
            min_cart_amount: Decimal::ZERO,
            new_users_only: false,
            created_at: NOW,
            updated_at: NOW,
        }
    }

    fn request(amount: Decimal) -> VoucherRequest<'static> {
        VoucherRequest {
            email: "buyer@example.com",
            solution: SolutionUuid::from_uuid(uuid::Uuid::nil()),
            amount,
        }
    }

    #[test]
    fn percentage_discount_matches_rounded_formula() {
        let amounts = [
            dec!(0),
            dec!(0.01),
            dec!(9.99),
            dec!(333.33),
            dec!(10000),
            dec!(12345.67),
        ];
        let percentages = [dec!(0), dec!(7.5), dec!(10), dec!(33.333), dec!(99.99), dec!(100)];

        for amount in amounts {
            for value in percentages {
                let expected = (amount * (Decimal::ONE - value / Decimal::ONE_HUNDRED))
                    .max(Decimal::ZERO)
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

                assert_eq!(
                    apply_discount(Discount::Percentage(value), amount),
                    expected,
                    "{value}% off {amount}"
                );
            }
        }
    }

    #[test]
    fn fixed_discount_clamps_at_zero() {
        assert_eq!(
            apply_discount(Discount::Fixed(dec!(5000)), dec!(3000)),
            Decimal::ZERO
        );
        assert_eq!(
            apply_discount(Discount::Fixed(dec!(2500.50)), dec!(10000)),
            dec!(7499.50)
        );
    }

    #[test]
    fn save10_example_yields_nine_thousand() {
        let mut save10 = voucher(Discount::Percentage(dec!(10)));
        save10.usage_limit = 5;
        save10.usage_count = 4;

        let result = evaluate(&save10, request(dec!(10000)), BuyerHistory::default(), NOW);

        assert_eq!(result, Ok(dec!(9000.00)));
    }

    #[test]
    fn exhausted_voucher_is_rejected_regardless_of_other_fields() {
        let mut exhausted = voucher(Discount::Fixed(dec!(1)));
        exhausted.usage_limit = 5;
        exhausted.usage_count = 5;
        exhausted.new_users_only = true;
        exhausted.min_cart_amount = dec!(1000000);
        exhausted.applicable_emails = vec!["someone-else@example.com".to_string()];

        let history = BuyerHistory {
            is_known_user: true,
            has_redeemed: true,
        };

        assert_eq!(
            evaluate(&exhausted, request(dec!(1)), history, NOW),
            Err(VoucherRejection::UsageLimitReached)
        );
    }

    #[test]
    fn unlimited_voucher_ignores_usage_count() {
        let mut unlimited = voucher(Discount::Fixed(dec!(1)));
        unlimited.usage_count = 10_000;

        assert!(evaluate(&unlimited, request(dec!(10)), BuyerHistory::default(), NOW).is_ok());
    }

    #[test]
    fn expiry_is_checked_before_usage() {
        let mut expired = voucher(Discount::Fixed(dec!(1)));
        expired.expires_at = NOW;
        expired.usage_limit = 1;
        expired.usage_count = 1;

        assert_eq!(
            evaluate(&expired, request(dec!(10)), BuyerHistory::default(), NOW),
            Err(VoucherRejection::Expired)
        );
    }

    #[test]
    fn new_users_only_rejects_known_users() {
        let mut fresh = voucher(Discount::Fixed(dec!(1)));
        fresh.new_users_only = true;

        let known = BuyerHistory {
            is_known_user: true,
            has_redeemed: false,
        };

        assert_eq!(
            evaluate(&fresh, request(dec!(10)), known, NOW),
            Err(VoucherRejection::NewUsersOnly)
        );
        assert!(evaluate(&fresh, request(dec!(10)), BuyerHistory::default(), NOW).is_ok());
    }

    #[test]
    fn applicable_emails_compare_lower_cased() {
        let mut restricted = voucher(Discount::Fixed(dec!(1)));
        restricted.applicable_emails = vec!["buyer@example.com".to_string()];

        let shouting = VoucherRequest {
            email: " BUYER@Example.com",
            ..request(dec!(10))
        };
        let stranger = VoucherRequest {
            email: "other@example.com",
            ..request(dec!(10))
        };

        assert!(evaluate(&restricted, shouting, BuyerHistory::default(), NOW).is_ok());
        assert_eq!(
            evaluate(&restricted, stranger, BuyerHistory::default(), NOW),
            Err(VoucherRejection::EmailNotEligible)
        );
    }

    #[test]
    fn applicable_solutions_restrict_products() {
        let mut restricted = voucher(Discount::Fixed(dec!(1)));
        restricted.applicable_solutions = vec![SolutionUuid::new()];

        assert_eq!(
            evaluate(&restricted, request(dec!(10)), BuyerHistory::default(), NOW),
            Err(VoucherRejection::SolutionNotEligible)
        );
    }

    #[test]
    fn cart_minimum_is_inclusive() {
        let mut minimum = voucher(Discount::Fixed(dec!(1)));
        minimum.min_cart_amount = dec!(100);

        assert!(evaluate(&minimum, request(dec!(100)), BuyerHistory::default(), NOW).is_ok());
        assert_eq!(
            evaluate(&minimum, request(dec!(99.99)), BuyerHistory::default(), NOW),
            Err(VoucherRejection::BelowMinimum {
                minimum: dec!(100)
            })
        );
    }

    #[test]
    fn once_per_user_rejects_repeat_redemption() {
        let mut once = voucher(Discount::Fixed(dec!(1)));
        once.once_per_user = true;

        let redeemed = BuyerHistory {
            is_known_user: true,
            has_redeemed: true,
        };

        assert_eq!(
            evaluate(&once, request(dec!(10)), redeemed, NOW),
            Err(VoucherRejection::AlreadyRedeemed)
        );
    }

    #[test]
    fn rejection_messages_are_human_readable() {
        assert_eq!(
            VoucherRejection::UsageLimitReached.to_string(),
            "voucher usage limit reached"
        );
        assert_eq!(
            VoucherRejection::BelowMinimum {
                minimum: dec!(500.00)
            }
            .to_string(),
            "cart amount is below the voucher minimum of 500.00"
        );
    }
}

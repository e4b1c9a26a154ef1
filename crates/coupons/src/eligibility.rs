//! Coupon eligibility checks and one-shot redemption math.
//!
//! Validation order is fixed (first failing check wins):
//! 1. active, 2. time window, 3. global cap, 4. per-user usage,
//! 5. minimum purchase.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use storefront_core::{DomainError, DomainResult};
use storefront_pricing::discount_for;

use crate::coupon::Coupon;

/// Whether per-user usage tracking applies to this check, and its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserUsage {
    /// The flow does not track per-user usage (cart attach).
    NotTracked,
    /// The user has a prior usage record for this coupon.
    PriorUse,
    /// The user has never used this coupon.
    NoPriorUse,
}

/// Run the ordered eligibility checks for a coupon against a subtotal.
pub fn check_eligibility(
    coupon: &Coupon,
    now: DateTime<Utc>,
    usage: UserUsage,
    subtotal: Decimal,
) -> DomainResult<()> {
    if !coupon.is_active {
        return Err(DomainError::CouponInvalid);
    }

    if now < coupon.valid_from {
        return Err(DomainError::CouponNotYetValid);
    }
    if now > coupon.valid_to {
        return Err(DomainError::CouponExpired);
    }

    if !coupon.has_uses_remaining() {
        return Err(DomainError::CouponLimitExceeded);
    }

    if usage == UserUsage::PriorUse {
        return Err(DomainError::CouponAlreadyUsed);
    }

    if let Some(min) = coupon.min_purchase {
        if subtotal < min {
            return Err(DomainError::MinimumPurchaseNotMet(min));
        }
    }

    Ok(())
}

/// Outcome of the one-shot "apply to an order amount" flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedemptionQuote {
    pub code: String,
    pub title: String,
    pub max_discount: Option<Decimal>,
    pub min_purchase: Option<Decimal>,
    pub discount: Decimal,
    pub final_price: Decimal,
}

/// Validate and price a one-shot redemption of `coupon` against `order_amount`.
///
/// Recording the usage row (and the `used_count` increment) is the caller's
/// responsibility; both must land in the same transaction.
pub fn redemption_quote(
    coupon: &Coupon,
    now: DateTime<Utc>,
    usage: UserUsage,
    order_amount: Decimal,
) -> DomainResult<RedemptionQuote> {
    if order_amount <= Decimal::ZERO {
        return Err(DomainError::invalid_input("order amount must be positive"));
    }

    check_eligibility(coupon, now, usage, order_amount)?;

    let discount = discount_for(order_amount, &coupon.rule);

    Ok(RedemptionQuote {
        code: coupon.code.clone(),
        title: coupon.title.clone(),
        max_discount: coupon.rule.max_discount,
        min_purchase: coupon.min_purchase,
        discount,
        final_price: order_amount - discount,
    })
}

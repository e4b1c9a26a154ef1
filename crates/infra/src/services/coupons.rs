//! One-shot coupon redemption.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use storefront_core::{DomainError, UserId};
use storefront_coupons::{RedemptionQuote, UserUsage, redemption_quote};

use crate::error::StoreResult;
use crate::store::CouponStore;

pub struct CouponRedemption {
    coupons: Arc<dyn CouponStore>,
}

impl CouponRedemption {
    pub fn new(coupons: Arc<dyn CouponStore>) -> Self {
        Self { coupons }
    }

    /// Redeem a coupon against an order amount: run the ordered eligibility
    /// checks, price the discount, and consume one use for this user.
    ///
    /// The usage row and the `used_count` bump land atomically in the store,
    /// which also re-checks the per-user and global limits under the write,
    /// so two concurrent redemptions cannot both succeed past a cap.
    pub async fn redeem(
        &self,
        user_id: UserId,
        code: &str,
        order_amount: Decimal,
        now: DateTime<Utc>,
    ) -> StoreResult<RedemptionQuote> {
        let coupon = self
            .coupons
            .by_code(code)
            .await?
            .ok_or(DomainError::CouponInvalid)?;

        let usage = if self.coupons.has_usage(coupon.id, user_id).await? {
            UserUsage::PriorUse
        } else {
            UserUsage::NoPriorUse
        };

        let quote = redemption_quote(&coupon, now, usage, order_amount)?;
        self.coupons.record_usage(coupon.id, user_id).await?;

        tracing::info!(code = %quote.code, user_id = %user_id, discount = %quote.discount, "coupon redeemed");
        Ok(quote)
    }
}

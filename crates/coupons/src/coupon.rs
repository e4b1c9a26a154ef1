use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{CouponId, DomainError, DomainResult, Entity};
use storefront_pricing::DiscountRule;

/// A named discount rule with eligibility constraints.
///
/// # Invariants
/// - `code` is unique (store-enforced).
/// - `valid_from < valid_to`.
/// - `used_count` only moves forward, atomically with usage records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub title: String,
    pub rule: DiscountRule,
    /// Subtotal threshold below which the coupon cannot be applied.
    pub min_purchase: Option<Decimal>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// Global usage cap across all users, if set.
    pub max_uses: Option<u32>,
    pub used_count: u32,
    pub is_active: bool,
}

impl Coupon {
    /// Validate and construct a new active coupon.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        rule: DiscountRule,
        min_purchase: Option<Decimal>,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
        max_uses: Option<u32>,
    ) -> DomainResult<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(DomainError::invalid_input("coupon code must not be empty"));
        }
        if valid_to <= valid_from {
            return Err(DomainError::invalid_input(
                "valid_to must be after valid_from",
            ));
        }
        if rule.value < Decimal::ZERO {
            return Err(DomainError::invalid_input(
                "discount value must not be negative",
            ));
        }

        Ok(Self {
            id: CouponId::new(),
            code,
            title: title.into(),
            rule,
            min_purchase,
            valid_from,
            valid_to,
            max_uses,
            used_count: 0,
            is_active: true,
        })
    }

    /// True while the global usage cap (if any) has headroom.
    pub fn has_uses_remaining(&self) -> bool {
        match self.max_uses {
            Some(cap) => self.used_count < cap,
            None => true,
        }
    }
}

impl Entity for Coupon {
    type Id = CouponId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

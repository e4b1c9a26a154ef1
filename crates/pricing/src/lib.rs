//! `storefront-pricing` — pure discount math.
//!
//! Given a subtotal and a coupon's discount rule, compute the discount
//! amount. No IO, no side effects, deterministic for identical inputs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a discount rule reduces the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `value` is a percentage of the subtotal (0–100, larger values allowed
    /// but clamped by the subtotal bound).
    Percentage,
    /// `value` is a fixed amount.
    Fixed,
}

/// A coupon's discount rule: kind, value, optional cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    pub kind: DiscountKind,
    pub value: Decimal,
    /// Upper bound on the computed discount, if set.
    pub max_discount: Option<Decimal>,
}

impl DiscountRule {
    pub fn percentage(value: Decimal) -> Self {
        Self {
            kind: DiscountKind::Percentage,
            value,
            max_discount: None,
        }
    }

    pub fn fixed(value: Decimal) -> Self {
        Self {
            kind: DiscountKind::Fixed,
            value,
            max_discount: None,
        }
    }

    pub fn with_max_discount(mut self, cap: Decimal) -> Self {
        self.max_discount = Some(cap);
        self
    }
}

/// Compute the discount a rule grants on `subtotal`.
///
/// The result is always clamped to `[0, subtotal]`; applying it can never
/// produce a negative total.
pub fn discount_for(subtotal: Decimal, rule: &DiscountRule) -> Decimal {
    let raw = match rule.kind {
        DiscountKind::Percentage => subtotal * rule.value / Decimal::ONE_HUNDRED,
        DiscountKind::Fixed => rule.value,
    };

    let capped = match rule.max_discount {
        Some(cap) => raw.min(cap),
        None => raw,
    };

    capped.clamp(Decimal::ZERO, subtotal.max(Decimal::ZERO))
}
